//! Propagation of access control roles through related objects

use grc_acl::factories::{RbacFactory, factory_for};
use grc_acl::models::{GlobalRole, GrcObject, ObjectType};
use grc_acl::rbac::{Action, PRIMARY_CONTACTS_ROLE, SECONDARY_CONTACTS_ROLE, SYSTEM_ACTOR};
use grc_acl::{AclConfig, AclPropagationRunner, AclSystem, PermissionTable};
use proptest::prelude::*;
use std::sync::Arc;

async fn seeded_system() -> Arc<AclSystem> {
    Arc::new(AclSystem::initialize(AclConfig::default()).await.unwrap())
}

#[tokio::test]
async fn test_primary_contacts_table_holds() {
    let runner = AclPropagationRunner::new(AclConfig::default(), PRIMARY_CONTACTS_ROLE);
    let report = runner.run_table(&PermissionTable::primary_contacts()).await.unwrap();

    assert_eq!(report.outcomes.len(), 32);
    assert!(report.is_success(), "mismatches: {:?}", report.mismatches());
    report.ensure_success().unwrap();
}

#[tokio::test]
async fn test_creator_mapped_review_program() {
    let system = seeded_system().await;
    let people = AclPropagationRunner::setup_people(&system).await.unwrap();
    let creator = &people[&GlobalRole::Creator];

    let runner = AclPropagationRunner::new(AclConfig::default(), PRIMARY_CONTACTS_ROLE);
    let factory = runner.init_factory(system.clone(), &creator.id, "MappedReview", ObjectType::Program).await.unwrap();

    assert!(factory.run_action("create_review").await.unwrap());
    assert!(!factory.run_action("delete_review").await.unwrap());
}

#[tokio::test]
async fn test_revocation_flips_grants() {
    let system = seeded_system().await;
    let creator = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();
    let role = system.get_role_by_name(PRIMARY_CONTACTS_ROLE, ObjectType::Regulation).await.unwrap();
    let factory = factory_for("MappedReview", system.clone(), &creator.id, &role).await.unwrap();

    let granted = [Action::Read, Action::Update, Action::Create];
    for action in &granted {
        assert!(factory.run(*action).await.unwrap(), "{} should be granted", action);
    }

    system.revoke_role(&creator.id, &role.id, factory.parent_id(), SYSTEM_ACTOR).await.unwrap();

    for action in &granted {
        assert!(!factory.run(*action).await.unwrap(), "{} should be revoked", action);
    }
}

#[tokio::test]
async fn test_comment_and_document_factories() {
    let system = seeded_system().await;
    let creator = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();
    let role = system.get_role_by_name(SECONDARY_CONTACTS_ROLE, ObjectType::Policy).await.unwrap();

    let comments = factory_for("MappedComment", system.clone(), &creator.id, &role).await.unwrap();
    assert!(comments.run_action("create_comment").await.unwrap());
    assert!(comments.run_action("read_comment").await.unwrap());
    assert!(!comments.run_action("update_comment").await.unwrap());
    assert!(!comments.run_action("delete_comment").await.unwrap());

    let documents = factory_for("MappedDocument", system.clone(), &creator.id, &role).await.unwrap();
    assert!(documents.run_action("read_document").await.unwrap());
    assert!(documents.run_action("update_document").await.unwrap());
    assert!(!documents.run_action("delete_document").await.unwrap());
}

#[tokio::test]
async fn test_universal_factory() {
    let system = seeded_system().await;
    let people = AclPropagationRunner::setup_people(&system).await.unwrap();
    let reader = &people[&GlobalRole::Reader];
    let role = system.get_role_by_name(PRIMARY_CONTACTS_ROLE, ObjectType::DataAsset).await.unwrap();

    let factory = factory_for("Universal", system.clone(), &reader.id, &role).await.unwrap();

    assert!(factory.run_action("read").await.unwrap());
    assert!(factory.run_action("update").await.unwrap());
    assert!(factory.run_action("create").await.unwrap());
    assert!(factory.run_action("delete").await.unwrap());
    assert!(system.get_object(factory.parent_id()).await.is_err());
}

#[tokio::test]
async fn test_other_global_roles() {
    let system = seeded_system().await;
    let people = AclPropagationRunner::setup_people(&system).await.unwrap();
    let program = system.create_object(GrcObject::new(ObjectType::Program, "SOX")).await.unwrap();
    let review = system.create_object(GrcObject::new(ObjectType::Review, "Q1")).await.unwrap();
    system.relate(&program.id, &review.id).await.unwrap();

    let reader = &people[&GlobalRole::Reader];
    assert!(system.check_permission(&reader.id, Action::Read, &review.id).await.unwrap());
    assert!(!system.check_permission(&reader.id, Action::Update, &review.id).await.unwrap());

    let editor = &people[&GlobalRole::Editor];
    assert!(system.check_permission(&editor.id, Action::Delete, &review.id).await.unwrap());

    let creator = &people[&GlobalRole::Creator];
    assert!(!system.check_permission(&creator.id, Action::Read, &review.id).await.unwrap());
}

#[tokio::test]
async fn test_cyclic_graph_terminates() {
    let system = seeded_system().await;
    let creator = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();
    let role = system.get_role_by_name(PRIMARY_CONTACTS_ROLE, ObjectType::Program).await.unwrap();

    let a = system.create_object(GrcObject::new(ObjectType::Program, "A")).await.unwrap();
    let b = system.create_object(GrcObject::new(ObjectType::Review, "B")).await.unwrap();
    let c = system.create_object(GrcObject::new(ObjectType::Comment, "C")).await.unwrap();
    let d = system.create_object(GrcObject::new(ObjectType::Review, "D")).await.unwrap();
    for (x, y) in [(&a, &b), (&b, &c), (&c, &d), (&d, &a)] {
        system.relate(&x.id, &y.id).await.unwrap();
    }
    system.assign_role(&creator.id, &role.id, &a.id, SYSTEM_ACTOR).await.unwrap();

    let isolated = system.create_object(GrcObject::new(ObjectType::Document, "E")).await.unwrap();

    assert!(system.check_permission(&creator.id, Action::Read, &c.id).await.unwrap());
    assert!(!system.check_permission(&creator.id, Action::Read, &isolated.id).await.unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_repeated_checks_are_stable(parent_index in 0usize..ObjectType::REVIEWABLE.len(), action_index in 0usize..4, repeats in 2usize..6) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let parent_type = ObjectType::REVIEWABLE[parent_index];
        let action = Action::ALL[action_index];

        let answers = runtime.block_on(async {
            let system = seeded_system().await;
            let creator = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();
            let role = system.get_role_by_name(PRIMARY_CONTACTS_ROLE, parent_type).await.unwrap();
            let parent = system.create_object(GrcObject::new(parent_type, "parent")).await.unwrap();
            let review = system.create_object(GrcObject::new(ObjectType::Review, "review")).await.unwrap();
            system.relate(&parent.id, &review.id).await.unwrap();
            system.assign_role(&creator.id, &role.id, &parent.id, SYSTEM_ACTOR).await.unwrap();

            let mut answers = Vec::new();
            for _ in 0..repeats {
                answers.push(system.check_permission(&creator.id, action, &review.id).await.unwrap());
            }
            answers
        });

        prop_assert!(answers.windows(2).all(|pair| pair[0] == pair[1]));
        prop_assert_eq!(answers[0], matches!(action, Action::Read | Action::Update));
    }
}
