use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use readlog_core::config::AppConfig;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "READLOG_CONFIG";
const CONFIG_FILE: &str = "readlog.toml";

/// Picks the config file: an explicit path, then `$READLOG_CONFIG`
/// (`/dev/null` or empty disables the file), then
/// `<config dir>/readlog/readlog.toml` when it exists.
#[tracing::instrument(skip(env_value, config_dir))]
pub fn resolve_config_path(
    override_path: Option<&Path>,
    env_value: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }

    if let Some(env_value) = env_value {
        if env_value.is_empty() || env_value == "/dev/null" {
            debug!("config file disabled through {CONFIG_ENV}");
            return None;
        }
        return Some(PathBuf::from(env_value));
    }

    let candidate = config_dir?.join("readlog").join(CONFIG_FILE);
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

/// Built-in defaults, then the config file, then `--set` overrides.
pub fn load(
    path: Option<&Path>,
    overrides: impl IntoIterator<Item = (String, String)>,
) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_file(path)?,
        None => {
            info!("no config file; using built-in defaults");
            AppConfig::default()
        }
    };
    config.apply_overrides(overrides)?;
    Ok(config)
}

/// The CLI talks to an absolute server address; the browser build may
/// leave it empty and use the page origin.
pub fn require_base_url(config: &AppConfig) -> anyhow::Result<&str> {
    let base = config.base_url.as_str();
    if base.starts_with("http://") || base.starts_with("https://") {
        return Ok(base);
    }
    if base.is_empty() {
        return Err(anyhow!(
            "base_url is not set; add it to {CONFIG_FILE} or pass --set base_url=<url>"
        ));
    }
    Err(anyhow!("base_url must start with http:// or https://, got: {base}"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn explicit_path_beats_environment() {
        let explicit = Path::new("/tmp/explicit.toml");
        let resolved = resolve_config_path(
            Some(explicit),
            Some(OsString::from("/tmp/env.toml")),
            None,
        );
        assert_eq!(resolved.as_deref(), Some(explicit));
    }

    #[test]
    fn dev_null_disables_config_file() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().join("readlog");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(CONFIG_FILE), "toast_ms = 1").expect("write");

        let resolved = resolve_config_path(
            None,
            Some(OsString::from("/dev/null")),
            Some(temp.path().to_path_buf()),
        );
        assert_eq!(resolved, None);
    }

    #[test]
    fn user_config_dir_is_used_only_when_file_exists() {
        let temp = tempdir().expect("tempdir");
        assert_eq!(
            resolve_config_path(None, None, Some(temp.path().to_path_buf())),
            None
        );

        let dir = temp.path().join("readlog");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(CONFIG_FILE), "").expect("write");
        assert_eq!(
            resolve_config_path(None, None, Some(temp.path().to_path_buf())),
            Some(dir.join(CONFIG_FILE))
        );
    }

    #[test]
    fn overrides_apply_after_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "base_url = \"http://files.example/\"\ntoast_ms = 1200\n",
        )
        .expect("write");

        let config = load(
            Some(&path),
            [("base_url".to_string(), "http://cli.example".to_string())],
        )
        .expect("load");
        assert_eq!(config.base_url, "http://cli.example");
        assert_eq!(config.toast_ms, 1200);
        assert_eq!(config.page_keys().count(), 3);
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("missing.toml");
        let err = load(Some(&missing), []).expect_err("missing file");
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn base_url_must_be_absolute() {
        let mut config = AppConfig::default();
        assert!(require_base_url(&config).is_err());

        config.base_url = "localhost:8080".to_string();
        assert!(require_base_url(&config).is_err());

        config.base_url = "https://reading.example".to_string();
        assert_eq!(
            require_base_url(&config).expect("absolute"),
            "https://reading.example"
        );
    }
}
