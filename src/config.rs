//! posemerge configuration. Every setting has a default here and can be
//! overridden from a TOML file or `POSEMERGE_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Config file read from the working directory when none is given
pub const CONFIG_FILE: &str = "posemerge.toml";

/// Prefix for environment overrides, e.g. `POSEMERGE_PORT=8080`
pub const ENV_PREFIX: &str = "POSEMERGE";

pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 80;

/// Timeout for fetching a URL input
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Largest accepted upload or fetched body
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG: &str = "info,actix_web=info";

/// Name given to fetched files whose URL path has no final segment
pub const DEFAULT_FETCHED_FILENAME: &str = "downloaded.pose";

pub const USER_AGENT: &str = concat!("posemerge/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub fetch_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub log: String,
}

impl Settings {
    /// Layer defaults, the config file (optional unless named explicitly) and
    /// the environment, in that order
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(CONFIG_FILE).required(false),
        };

        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("fetch_timeout_secs", DEFAULT_FETCH_TIMEOUT_SECS as i64)?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("log", DEFAULT_LOG)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("posemerge-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "port = 8080\nfetch_timeout_secs = 5").unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(settings.log, DEFAULT_LOG);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(Settings::load(Some("/nonexistent/posemerge.toml")).is_err());
    }
}
