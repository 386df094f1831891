// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Security Configuration
//
// Startup-only settings for the request-security pipeline:
// - RECALL_AUTH_ENABLED       master switch for the authentication stage (default true)
// - RECALL_API_KEY_<ROLE>     one bearer credential per role, empty values dropped
// - RECALL_POLICY_FILE        path to the role policy document
// - RECALL_AUTH_DEV_ROLE      role of the implicit principal when auth is disabled
//
// Nothing here is re-read after startup; rotating a credential or editing the
// policy requires a restart.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use super::audit::redact_token;
use super::errors::ConfigurationError;
use super::principal::Role;

pub const ENV_AUTH_ENABLED: &str = "RECALL_AUTH_ENABLED";
pub const ENV_API_KEY_PREFIX: &str = "RECALL_API_KEY_";
pub const ENV_POLICY_FILE: &str = "RECALL_POLICY_FILE";
pub const ENV_DEV_ROLE: &str = "RECALL_AUTH_DEV_ROLE";

pub const DEFAULT_POLICY_FILE: &str = "config/policies.json";
pub const DEV_USER_ID: &str = "dev-local";

/// Paths that bypass the whole security pipeline.
pub const EXEMPT_PATHS: &[&str] = &["/health", "/status"];

#[derive(Clone)]
pub struct SecurityConfig {
    pub auth_enabled: bool,
    pub policy_path: PathBuf,
    /// Configured credential per role. Never printed unredacted.
    pub credentials: BTreeMap<Role, String>,
    pub dev_role: Role,
    pub exempt_paths: BTreeSet<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            auth_enabled: true,
            policy_path: PathBuf::from(DEFAULT_POLICY_FILE),
            credentials: BTreeMap::new(),
            dev_role: Role::Admin,
            exempt_paths: EXEMPT_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted: BTreeMap<&Role, String> = self
            .credentials
            .iter()
            .map(|(role, token)| (role, redact_token(token)))
            .collect();
        f.debug_struct("SecurityConfig")
            .field("auth_enabled", &self.auth_enabled)
            .field("policy_path", &self.policy_path)
            .field("credentials", &redacted)
            .field("dev_role", &self.dev_role)
            .field("exempt_paths", &self.exempt_paths)
            .finish()
    }
}

/// Parse a boolean switch the same way for env vars and flags.
pub fn parse_flag(variable: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::InvalidFlag {
            variable: variable.to_string(),
            value: value.to_string(),
        }),
    }
}

impl SecurityConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(std::env::vars())
    }

    /// Load from an explicit set of variables.
    ///
    /// An unparseable `RECALL_AUTH_ENABLED` is an error rather than a fallback,
    /// so a typo can never silently switch authentication off.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        let mut credential_sources: BTreeMap<Role, String> = BTreeMap::new();

        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            if key == ENV_AUTH_ENABLED {
                config.auth_enabled = parse_flag(key, value)?;
            } else if key == ENV_POLICY_FILE {
                if !value.trim().is_empty() {
                    config.policy_path = PathBuf::from(value.trim());
                }
            } else if key == ENV_DEV_ROLE {
                if !value.trim().is_empty() {
                    config.dev_role = Role::from(value);
                }
            } else if let Some(suffix) = key.strip_prefix(ENV_API_KEY_PREFIX) {
                if suffix.is_empty() || value.is_empty() {
                    continue;
                }
                let role = Role::from(suffix);
                match config.credentials.get(&role) {
                    Some(existing) if existing != value => {
                        let first = credential_sources.get(&role).cloned().unwrap_or_default();
                        return Err(ConfigurationError::DuplicateCredentialRole {
                            role,
                            first,
                            second: key.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        credential_sources.insert(role.clone(), key.to_string());
                        config.credentials.insert(role, value.to_string());
                    }
                }
            }
        }

        Ok(config)
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecurityConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert!(config.auth_enabled);
        assert_eq!(config.policy_path, PathBuf::from(DEFAULT_POLICY_FILE));
        assert!(config.credentials.is_empty());
        assert_eq!(config.dev_role, Role::Admin);
        assert!(config.is_exempt("/health"));
        assert!(config.is_exempt("/status"));
        assert!(!config.is_exempt("/mcp"));
    }

    #[test]
    fn test_credentials_per_role_and_empty_values_dropped() {
        let config = SecurityConfig::from_vars([
            ("RECALL_API_KEY_ADMIN", "sk_admin_1234567890"),
            ("RECALL_API_KEY_READONLY", "sk_readonly_AAAA1111"),
            ("RECALL_API_KEY_ANALYST", ""),
            ("RECALL_API_KEY_", "orphan"),
            ("UNRELATED", "x"),
        ])
        .unwrap();

        assert_eq!(config.credentials.len(), 2);
        assert_eq!(config.credentials[&Role::Readonly], "sk_readonly_AAAA1111");
        assert!(!config.credentials.contains_key(&Role::Analyst));
    }

    #[test]
    fn test_case_folded_role_configured_twice_is_rejected() {
        let err = SecurityConfig::from_vars([
            ("RECALL_API_KEY_ADMIN", "sk_admin_first_1111"),
            ("RECALL_API_KEY_admin", "sk_admin_second_2222"),
        ])
        .unwrap_err();

        assert!(matches!(
            &err,
            ConfigurationError::DuplicateCredentialRole { role: Role::Admin, .. }
        ));
        let message = err.to_string();
        assert!(message.contains("RECALL_API_KEY_ADMIN"));
        assert!(message.contains("RECALL_API_KEY_admin"));
        assert!(!message.contains("sk_admin_first_1111"));
        assert!(!message.contains("sk_admin_second_2222"));
    }

    #[test]
    fn test_same_credential_under_both_spellings_is_accepted() {
        let config = SecurityConfig::from_vars([
            ("RECALL_API_KEY_ADMIN", "sk_admin_1234567890"),
            ("RECALL_API_KEY_Admin", "sk_admin_1234567890"),
        ])
        .unwrap();

        assert_eq!(config.credentials.len(), 1);
    }

    #[test]
    fn test_auth_flag_values() {
        let disabled = SecurityConfig::from_vars([("RECALL_AUTH_ENABLED", "off")]).unwrap();
        assert!(!disabled.auth_enabled);

        let enabled = SecurityConfig::from_vars([("RECALL_AUTH_ENABLED", "YES")]).unwrap();
        assert!(enabled.auth_enabled);

        let invalid = SecurityConfig::from_vars([("RECALL_AUTH_ENABLED", "maybe")]);
        assert!(matches!(invalid, Err(ConfigurationError::InvalidFlag { .. })));
    }

    #[test]
    fn test_debug_output_redacts_credentials() {
        let config =
            SecurityConfig::from_vars([("RECALL_API_KEY_ADMIN", "sk_admin_topsecret")]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk_admin_topsecret"));
        assert!(debug.contains("sk_admin..."));
    }

    #[test]
    fn test_policy_path_and_dev_role_overrides() {
        let config = SecurityConfig::from_vars([
            ("RECALL_POLICY_FILE", "/etc/recall/policies.yaml"),
            ("RECALL_AUTH_DEV_ROLE", "readonly"),
        ])
        .unwrap();
        assert_eq!(config.policy_path, PathBuf::from("/etc/recall/policies.yaml"));
        assert_eq!(config.dev_role, Role::Readonly);
    }
}
