//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default base directory holding `incoming`, `processed` and `ignored`.
pub const DEFAULT_BASE_DIR: &str = "/var/github-fetchmail";
/// Domain of the reply addresses GitHub Enterprise hands out.
pub const DEFAULT_REPLY_SUBDOMAIN: &str = "reply.github.priv.mycompany.net";
/// Upstream SMTP host that accepts replies for GitHub Enterprise.
pub const DEFAULT_SMTP_HOST: &str = "github.mv.mycompany.net";
pub const DEFAULT_SMTP_PORT: u16 = 25;
/// Log file name used when no explicit log path is configured.
pub const DEFAULT_LOG_FILE_NAME: &str = "github_mda.log";

/// Delivery agent configuration.
#[derive(Debug, Clone)]
pub struct MdaConfig {
    /// Parent of the three holding directories.
    pub base_dir: PathBuf,
    /// Domain a `To` address must be on to be relayed.
    pub reply_subdomain: String,
    /// Upstream SMTP relay host.
    pub smtp_host: String,
    /// Upstream SMTP relay port.
    pub smtp_port: u16,
    /// Append-only log file.
    pub log_file: PathBuf,
}

impl Default for MdaConfig {
    fn default() -> Self {
        let base_dir = PathBuf::from(DEFAULT_BASE_DIR);
        Self {
            log_file: base_dir.join(DEFAULT_LOG_FILE_NAME),
            base_dir,
            reply_subdomain: DEFAULT_REPLY_SUBDOMAIN.to_string(),
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl MdaConfig {
    /// Build config from environment variables.
    ///
    /// Every variable is optional; unset ones fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_dir = get("GITHUB_MDA_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));

        let reply_subdomain =
            get("GITHUB_MDA_REPLY_SUBDOMAIN").unwrap_or_else(|| DEFAULT_REPLY_SUBDOMAIN.to_string());

        let smtp_host = get("GITHUB_MDA_SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());

        let smtp_port = match get("GITHUB_MDA_SMTP_PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "GITHUB_MDA_SMTP_PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let log_file = get("GITHUB_MDA_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join(DEFAULT_LOG_FILE_NAME));

        Ok(Self {
            base_dir,
            reply_subdomain,
            smtp_host,
            smtp_port,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = MdaConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/var/github-fetchmail"));
        assert_eq!(config.reply_subdomain, "reply.github.priv.mycompany.net");
        assert_eq!(config.smtp_host, "github.mv.mycompany.net");
        assert_eq!(config.smtp_port, 25);
        assert_eq!(
            config.log_file,
            PathBuf::from("/var/github-fetchmail/github_mda.log")
        );
    }

    #[test]
    fn log_file_follows_base_dir() {
        let config = MdaConfig::from_lookup(lookup_from(&[("GITHUB_MDA_BASE_DIR", "/srv/mda")])).unwrap();
        assert_eq!(config.log_file, PathBuf::from("/srv/mda/github_mda.log"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = MdaConfig::from_lookup(lookup_from(&[
            ("GITHUB_MDA_BASE_DIR", "/srv/mda"),
            ("GITHUB_MDA_REPLY_SUBDOMAIN", "reply.ghe.example.org"),
            ("GITHUB_MDA_SMTP_HOST", "ghe.example.org"),
            ("GITHUB_MDA_SMTP_PORT", "2525"),
            ("GITHUB_MDA_LOG_FILE", "/var/log/mda.log"),
        ]))
        .unwrap();
        assert_eq!(config.reply_subdomain, "reply.ghe.example.org");
        assert_eq!(config.smtp_host, "ghe.example.org");
        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.log_file, PathBuf::from("/var/log/mda.log"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = MdaConfig::from_lookup(lookup_from(&[("GITHUB_MDA_SMTP_HOST", "  ")])).unwrap();
        assert_eq!(config.smtp_host, DEFAULT_SMTP_HOST);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = MdaConfig::from_lookup(lookup_from(&[("GITHUB_MDA_SMTP_PORT", "smtp")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "GITHUB_MDA_SMTP_PORT"));
    }
}
