// GRC ACL
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! GRC access control engine
//!
//! This crate models GRC objects and the access control roles people hold on
//! them, evaluates how a role granted on one object propagates to related
//! objects, and verifies the propagation against expectation tables.

pub mod config;
pub mod error;
pub mod factories;
pub mod harness;
pub mod models;
pub mod rbac;
pub mod store;
pub mod table;
pub mod workflow;

pub use config::AclConfig;
pub use error::{AclError, AclResult};
pub use harness::{AclPropagationRunner, CaseOutcome, PropagationReport};
pub use rbac::system::AclSystem;
pub use table::PermissionTable;
