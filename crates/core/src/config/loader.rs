//! Settings file loader.
//!
//! A settings file is a TOML document with two optional tables:
//! - `[pipeline]`: channel directory and maximum payload size (2 to `PIPE_BUF`)
//! - `[controller]`: program the lifecycle controller runs, and its arguments

use crate::config::error::{ConfigError, ConfigResult};
use sp_protocol::config_models::Settings;
use std::path::Path;
use tracing::debug;

/// Smallest usable payload buffer: one data byte plus the terminator.
pub const MIN_MAX_PAYLOAD: usize = 2;

/// Largest payload buffer a channel can carry in one atomic write.
///
/// Each channel is written in full before its reader is started, so the whole
/// transfer has to fit in the pipe buffer.
pub const MAX_MAX_PAYLOAD: usize = nix::libc::PIPE_BUF;

/// Loads settings from `path`, or returns the defaults when `path` is `None`.
///
/// Missing tables and keys keep their default values.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file cannot be read
/// - The file is not valid TOML or has fields of the wrong type
/// - The values fail [`validate_settings`]
///
/// # Example
///
/// ```rust,no_run
/// use sp_core::config::loader::load_settings;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = load_settings(Some(Path::new("sigflow.toml")))?;
/// println!("Channels live in {}", settings.pipeline.channel_dir.display());
/// # Ok(())
/// # }
/// ```
pub fn load_settings(path: Option<&Path>) -> ConfigResult<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_settings(&settings, path)?;
    debug!(config = %path.display(), "loaded settings");
    Ok(settings)
}

/// Checks that `settings`, loaded from `origin`, can be used.
pub fn validate_settings(settings: &Settings, origin: &Path) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: origin.to_path_buf(),
        reason,
    };

    if settings.pipeline.max_payload < MIN_MAX_PAYLOAD {
        return Err(invalid(format!(
            "max-payload must be at least {MIN_MAX_PAYLOAD}, got {}",
            settings.pipeline.max_payload
        )));
    }

    if settings.pipeline.max_payload > MAX_MAX_PAYLOAD {
        return Err(invalid(format!(
            "max-payload must be at most {MAX_MAX_PAYLOAD}, got {}",
            settings.pipeline.max_payload
        )));
    }

    if settings.controller.program.as_os_str().is_empty() {
        return Err(invalid("controller program must not be empty".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_protocol::config_models::{DEFAULT_MAX_PAYLOAD, DEFAULT_PROGRAM};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_without_file_is_default() {
        let settings = load_settings(None).expect("defaults should load");

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.pipeline.max_payload, DEFAULT_MAX_PAYLOAD);
        assert_eq!(settings.controller.program, PathBuf::from(DEFAULT_PROGRAM));
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("sigflow.toml");
        fs::write(
            &path,
            r#"
[pipeline]
channel-dir = "/var/run/sigflow"
max-payload = 64

[controller]
program = "/bin/sleep"
args = ["5"]
"#,
        )
        .expect("Failed to write config");

        let settings = load_settings(Some(&path)).expect("Failed to load settings");

        assert_eq!(settings.pipeline.channel_dir, PathBuf::from("/var/run/sigflow"));
        assert_eq!(settings.pipeline.max_payload, 64);
        assert_eq!(settings.controller.program, PathBuf::from("/bin/sleep"));
        assert_eq!(settings.controller.args, vec!["5".to_string()]);
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("absent.toml");

        let result = load_settings(Some(&path));
        if let Err(ConfigError::FileRead { path: reported, .. }) = result {
            assert_eq!(reported, path);
        } else {
            panic!("Expected FileRead error");
        }
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("sigflow.toml");
        fs::write(&path, "[pipeline\nmax-payload = ").expect("Failed to write config");

        let result = load_settings(Some(&path));
        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("sigflow.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[test]
    fn test_load_settings_wrong_type() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("sigflow.toml");
        fs::write(&path, "[pipeline]\nmax-payload = \"large\"\n").expect("Failed to write config");

        assert!(matches!(
            load_settings(Some(&path)),
            Err(ConfigError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_load_settings_rejects_tiny_payload() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("sigflow.toml");
        fs::write(&path, "[pipeline]\nmax-payload = 1\n").expect("Failed to write config");

        let result = load_settings(Some(&path));
        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("max-payload"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[test]
    fn test_load_settings_rejects_payload_beyond_pipe_buffer() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("sigflow.toml");
        fs::write(&path, "[pipeline]\nmax-payload = 100000\n").expect("Failed to write config");

        let result = load_settings(Some(&path));
        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("at most"), "reason was: {reason}");
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[test]
    fn test_validate_accepts_payload_bounds() {
        let mut settings = Settings::default();
        for max_payload in [MIN_MAX_PAYLOAD, MAX_MAX_PAYLOAD] {
            settings.pipeline.max_payload = max_payload;
            assert!(validate_settings(&settings, Path::new("inline")).is_ok());
        }

        settings.pipeline.max_payload = MAX_MAX_PAYLOAD + 1;
        assert!(matches!(
            validate_settings(&settings, Path::new("inline")),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let mut settings = Settings::default();
        settings.controller.program = PathBuf::new();

        let result = validate_settings(&settings, Path::new("inline"));
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }
}
