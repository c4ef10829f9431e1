//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tk_core::{Principal, Scope, ValidationError};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Principal to act as when `--as` is not given.
    ///
    /// Unset means administrative access to every employee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tk.db"),
            principal: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TK_*)
        figment = figment.merge(Env::prefixed("TK_"));

        figment.extract()
    }

    /// Resolves the authorization scope; `principal` takes precedence over config.
    pub fn scope(&self, principal: Option<&str>) -> Result<Scope, ValidationError> {
        let principal = principal
            .or(self.principal.as_deref())
            .map(Principal::new)
            .transpose()?;
        Ok(Scope::from_principal(principal))
    }
}

/// Returns the platform-specific config directory for tk.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tk"))
}

/// Returns the platform-specific data directory for tk.
///
/// On Linux: `~/.local/share/tk`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tk"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_tk() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tk");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("tk.db"));
        assert_eq!(config.principal, None);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "database_path = \"/srv/tk/payroll.db\"\nprincipal = \"hr\"\n")
            .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/tk/payroll.db"));
        assert_eq!(config.principal.as_deref(), Some("hr"));
    }

    #[test]
    fn test_scope_prefers_flag_over_config() {
        let config = Config {
            database_path: PathBuf::from("tk.db"),
            principal: Some("hr".to_string()),
        };
        assert_eq!(
            config.scope(Some("ops")).unwrap(),
            Scope::Principal(Principal::new("ops").unwrap())
        );
        assert_eq!(
            config.scope(None).unwrap(),
            Scope::Principal(Principal::new("hr").unwrap())
        );
        assert!(config.scope(Some(" ")).is_err());
    }

    #[test]
    fn test_no_principal_means_all() {
        let config = Config {
            database_path: PathBuf::from("tk.db"),
            principal: None,
        };
        assert_eq!(config.scope(None).unwrap(), Scope::All);
    }
}
