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

//! GRC ACL CLI Tool
//!
//! Runs access control propagation tables against the engine and lists the
//! built-in access control roles.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grc_acl::models::ObjectType;
use grc_acl::{AclConfig, AclPropagationRunner, AclSystem, PermissionTable};
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Parser)]
#[command(name = "grc-acl")]
#[command(about = "GRC ACL - access control propagation checker")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (TOML); falls back to GRC_ACL_CONFIG, then environment variables
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a propagation table and report mismatches
    Check {
        /// JSON table file (defaults to the built-in Primary Contacts table)
        #[arg(long, short = 't')]
        table: Option<PathBuf>,

        /// Check the table's expectations against this access control role instead of the table's own
        #[arg(long)]
        role_name: Option<String>,
    },
    /// Print the built-in Primary Contacts table as JSON
    Table,
    /// List the seeded access control roles
    Roles {
        /// Only roles of this object type
        #[arg(long)]
        object_type: Option<String>,
    },
    /// List the import columns of an object type
    Columns {
        object_type: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when a table run found mismatches
async fn run(cli: Cli) -> Result<bool> {
    let config = AclConfig::resolve(cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Check { table, role_name } => {
            let mut table = match table {
                Some(path) => {
                    let json = std::fs::read_to_string(&path).with_context(|| format!("Failed to read table {}", path.display()))?;
                    PermissionTable::from_json(&json).with_context(|| format!("Invalid table {}", path.display()))?
                }
                None => PermissionTable::primary_contacts(),
            };

            if let Some(role_name) = role_name {
                table.acr_name = role_name;
            }
            let runner = AclPropagationRunner::new(config, table.acr_name.clone());
            let report = runner.run_table(&table).await?;

            for outcome in &report.outcomes {
                println!("{}", outcome);
            }

            let mismatches = report.mismatches().len();
            println!("{} cases, {} mismatches", report.outcomes.len(), mismatches);
            Ok(mismatches == 0)
        }
        Commands::Table => {
            println!("{}", PermissionTable::primary_contacts().to_json()?);
            Ok(true)
        }
        Commands::Roles { object_type } => {
            let object_type = object_type.map(|name| name.parse::<ObjectType>()).transpose()?;
            let system = AclSystem::initialize(config).await?;

            for role in system.list_roles(object_type).await? {
                let propagation: Vec<String> = role.propagation.iter().map(|node| node.to_string()).collect();
                println!(
                    "{:<14} {:<26} {:<4} {}{}",
                    role.object_type.as_str(),
                    role.name,
                    role.permissions.to_string(),
                    if role.mandatory { "mandatory " } else { "" },
                    propagation.join(", ")
                );
            }
            Ok(true)
        }
        Commands::Columns { object_type } => {
            let object_type: ObjectType = object_type.parse()?;

            for (column, alias) in object_type.import_aliases() {
                println!("{:<26} {}", column, alias.unwrap_or("(disabled)"));
            }
            Ok(true)
        }
    }
}
