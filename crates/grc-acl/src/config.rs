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

//! Configuration management for the access control engine

use crate::error::{AclError, AclResult};
use crate::models::ObjectType;
use crate::rbac::permissions::PermissionSet;
use crate::rbac::propagation::parse_rules;
use crate::rbac::roles::AccessControlRole;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the access control engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Time-to-live of cached permission decisions in seconds
    pub cache_ttl_secs: u64,

    /// Maximum number of audit events kept in memory
    pub audit_max_events: usize,

    /// Permission checks slower than this are logged as warnings
    pub slow_check_threshold_ms: u64,

    /// Maximum number of relationship hops a propagation walk may take
    pub max_propagation_depth: usize,

    /// Seed the built-in access control roles on startup
    pub seed_default_roles: bool,

    /// Period of the background purge of expired cache entries in seconds
    pub cache_cleanup_interval_secs: u64,

    /// Additional access control roles created on startup
    pub roles: Vec<RoleDefinition>,
}

/// Access control role declared in the configuration file
///
/// ```toml
/// [[roles]]
/// name = "Auditors"
/// object_type = "Program"
/// permissions = "R"
/// propagation = ["Review R > Comment R", "Document R"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,

    pub object_type: String,

    /// Permission notation on the object itself, e.g. `"RU"`
    pub permissions: String,

    #[serde(default)]
    pub mandatory: bool,

    /// Rule chains, see [`crate::rbac::propagation::PropagationNode::parse_path`]
    #[serde(default)]
    pub propagation: Vec<String>,
}

impl RoleDefinition {
    pub fn to_role(&self) -> AclResult<AccessControlRole> {
        let object_type: ObjectType = self.object_type.parse()?;
        let mut role = AccessControlRole::new(self.name.trim(), object_type, PermissionSet::parse(&self.permissions)?)
            .with_propagation(parse_rules(self.propagation.as_slice())?);
        if self.mandatory {
            role = role.mandatory();
        }

        role.validate()?;
        Ok(role)
    }
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            audit_max_events: 10_000,
            slow_check_threshold_ms: 5,
            max_propagation_depth: 4,
            seed_default_roles: true,
            cache_cleanup_interval_secs: 60,
            roles: Vec::new(),
        }
    }
}

impl AclConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_ttl_secs: env::var("GRC_ACL_CACHE_TTL_SECS").map(|v| v.parse().unwrap_or(defaults.cache_ttl_secs)).unwrap_or(defaults.cache_ttl_secs),

            audit_max_events: env::var("GRC_ACL_AUDIT_MAX_EVENTS").map(|v| v.parse().unwrap_or(defaults.audit_max_events)).unwrap_or(defaults.audit_max_events),

            slow_check_threshold_ms: env::var("GRC_ACL_SLOW_CHECK_THRESHOLD_MS")
                .map(|v| v.parse().unwrap_or(defaults.slow_check_threshold_ms))
                .unwrap_or(defaults.slow_check_threshold_ms),

            max_propagation_depth: env::var("GRC_ACL_MAX_PROPAGATION_DEPTH")
                .map(|v| v.parse().unwrap_or(defaults.max_propagation_depth))
                .unwrap_or(defaults.max_propagation_depth),

            seed_default_roles: env::var("GRC_ACL_SEED_DEFAULT_ROLES").map(|v| v.parse().unwrap_or(true)).unwrap_or(true),

            cache_cleanup_interval_secs: env::var("GRC_ACL_CACHE_CLEANUP_INTERVAL_SECS")
                .map(|v| v.parse().unwrap_or(defaults.cache_cleanup_interval_secs))
                .unwrap_or(defaults.cache_cleanup_interval_secs),

            roles: defaults.roles,
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> AclResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration: explicit file, then `GRC_ACL_CONFIG`, then environment variables
    pub fn resolve(cli_config: Option<PathBuf>) -> AclResult<Self> {
        if let Some(path) = cli_config {
            return Self::load_from_file(path);
        }

        if let Ok(path) = env::var("GRC_ACL_CONFIG") {
            return Self::load_from_file(path);
        }

        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> AclResult<()> {
        if self.max_propagation_depth == 0 {
            return Err(AclError::Config {
                message: "max_propagation_depth must be at least 1".to_string(),
            });
        }

        if self.audit_max_events == 0 {
            return Err(AclError::Config {
                message: "audit_max_events must be at least 1".to_string(),
            });
        }

        if self.cache_ttl_secs > 0 && self.cache_cleanup_interval_secs == 0 {
            return Err(AclError::Config {
                message: "cache_cleanup_interval_secs must be at least 1 when caching is enabled".to_string(),
            });
        }

        for definition in &self.roles {
            definition.to_role().map_err(|e| AclError::Config {
                message: format!("Role '{}': {}", definition.name, e),
            })?;
        }

        Ok(())
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache_cleanup_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn slow_check_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_check_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_fills_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_ttl_secs = 10\nmax_propagation_depth = 2").unwrap();

        let config = AclConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.cache_ttl_secs, 10);
        assert_eq!(config.max_propagation_depth, 2);
        assert_eq!(config.audit_max_events, AclConfig::default().audit_max_events);
        assert!(config.seed_default_roles);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_propagation_depth = 0").unwrap();

        let err = AclConfig::load_from_file(file.path()).unwrap_err();
        assert_eq!(err.error_type(), "config");
    }

    #[test]
    fn test_roles_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[roles]]
name = "Auditors"
object_type = "Program"
permissions = "R"
propagation = ["Review R > Comment R"]
"#
        )
        .unwrap();

        let config = AclConfig::load_from_file(file.path()).unwrap();
        let role = config.roles[0].to_role().unwrap();
        assert_eq!(role.object_type, ObjectType::Program);
        assert_eq!(role.permissions, PermissionSet::R);
        assert_eq!(role.propagation[0].children[0].object_type, ObjectType::Comment);
        assert!(!role.non_editable);
    }

    #[test]
    fn test_bad_role_rule_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[roles]]\nname = \"Auditors\"\nobject_type = \"Program\"\npermissions = \"R\"\npropagation = [\"Reviews R\"]").unwrap();

        let err = AclConfig::load_from_file(file.path()).unwrap_err();
        assert_eq!(err.error_type(), "config");
        assert!(err.to_string().contains("Auditors"));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_ttl_secs = \"soon\"").unwrap();

        assert!(matches!(AclConfig::load_from_file(file.path()), Err(AclError::Toml(_))));
    }
}
