//! YAML configuration files
//!
//! The user-level file lives at `~/.config/larkbridge/config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::settings::Settings;

/// Default user-level config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("larkbridge").join("config.yaml"))
}

impl Settings {
    /// Parse settings from a YAML string; missing keys take their defaults
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load settings for the process
    ///
    /// Starts from `path` (or the user-level file when it exists, else the
    /// defaults) and applies environment overrides on top.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(path)?,
                _ => Self::default(),
            },
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model:
  default_model: gpt-4.1
  max_tokens: null
mcp:
  connect_timeout_secs: 3
  servers:
    - url: http://search.local/mcp
      token: abc
    - url: http://files.local/mcp
"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.model.default_model, "gpt-4.1");
        assert_eq!(settings.model.max_tokens, None);
        assert_eq!(settings.model.temperature, 0.7);
        assert_eq!(settings.mcp.connect_timeout_secs, 3);
        assert_eq!(settings.mcp.servers.len(), 2);
        assert_eq!(settings.mcp.servers[0].token.as_deref(), Some("abc"));
        assert_eq!(settings.mcp.servers[1].token, None);
        assert_eq!(settings.chat.default_role, "default");
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.server.port, 5001);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Settings::from_yaml("model: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
