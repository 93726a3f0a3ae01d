//! Cluster connection configuration.
//!
//! Loaded from a TOML file; every section and field has a default so a
//! partial file is valid. Connection parameters are carried in an explicit
//! [`SvcConfig`] value handed to the transport constructors.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SvcError, SvcResult};

/// Which transport carries commands to the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// HTTPS REST API on the cluster management address.
    #[default]
    Rest,
    /// CLI over the local OpenSSH client.
    Ssh,
}

impl FromStr for TransportKind {
    type Err = SvcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rest" | "https" => Ok(TransportKind::Rest),
            "ssh" | "cli" => Ok(TransportKind::Ssh),
            _ => Err(SvcError::config(format!(
                "Invalid transport '{}'. Valid options: rest, ssh",
                s
            ))),
        }
    }
}

/// Cluster address and credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster management host name or IP address
    #[serde(default)]
    pub clustername: String,

    /// Domain appended to `clustername`
    #[serde(default)]
    pub domain: Option<String>,

    /// Login user
    #[serde(default)]
    pub username: Option<String>,

    /// Login password (REST only)
    #[serde(default)]
    pub password: Option<String>,

    /// Pre-obtained REST token; skips authentication when set
    #[serde(default)]
    pub token: Option<String>,

    /// Verify the cluster's TLS certificate
    #[serde(default = "default_validate_certs")]
    pub validate_certs: bool,

    /// REST API port
    #[serde(default = "default_rest_port")]
    pub rest_port: u16,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport selection
    #[serde(default)]
    pub transport: TransportKind,
}

/// SSH transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// SSH port on the cluster
    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// Private key passed with `-i`
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append log records to this file instead of stderr
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SvcConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_validate_certs() -> bool {
    true
}

fn default_rest_port() -> u16 {
    7443
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ssh_port() -> u16 {
    22
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            clustername: String::new(),
            domain: None,
            username: None,
            password: None,
            token: None,
            validate_certs: default_validate_certs(),
            rest_port: default_rest_port(),
            timeout_secs: default_timeout_secs(),
            transport: TransportKind::default(),
        }
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("clustername", &self.clustername)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("validate_certs", &self.validate_certs)
            .field("rest_port", &self.rest_port)
            .field("timeout_secs", &self.timeout_secs)
            .field("transport", &self.transport)
            .finish()
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: default_ssh_port(),
            identity_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_path: None,
        }
    }
}

impl ClusterConfig {
    /// Fully qualified host: `clustername` or `clustername.domain`.
    pub fn host(&self) -> String {
        match self.domain.as_deref().filter(|d| !d.is_empty()) {
            Some(domain) => format!("{}.{}", self.clustername, domain),
            None => self.clustername.clone(),
        }
    }

    /// Root of the REST API, always ending in `/`.
    pub fn rest_url(&self) -> String {
        format!("https://{}:{}/rest/", self.host(), self.rest_port)
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl SvcConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> SvcResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SvcError::config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(SvcError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SvcResult<()> {
        let cluster = &self.cluster;

        if cluster.clustername.trim().is_empty() {
            return Err(SvcError::config("clustername must be set"));
        }

        if cluster.timeout_secs == 0 {
            return Err(SvcError::config("timeout_secs must be > 0"));
        }

        match cluster.transport {
            TransportKind::Rest => {
                if cluster.rest_port == 0 {
                    return Err(SvcError::config("rest_port must be > 0"));
                }
                let has_login = cluster.username.is_some() && cluster.password.is_some();
                if !cluster.has_token() && !has_login {
                    return Err(SvcError::config(
                        "REST transport needs either token or username and password",
                    ));
                }
            }
            TransportKind::Ssh => {
                if self.ssh.port == 0 {
                    return Err(SvcError::config("ssh port must be > 0"));
                }
                if cluster.username.is_none() {
                    return Err(SvcError::config("SSH transport needs username"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rest_config() -> SvcConfig {
        let mut config = SvcConfig::default();
        config.cluster.clustername = "cluster1".to_string();
        config.cluster.username = Some("admin".to_string());
        config.cluster.password = Some("secret".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = SvcConfig::default();
        assert_eq!(config.cluster.rest_port, 7443);
        assert_eq!(config.cluster.timeout_secs, 30);
        assert!(config.cluster.validate_certs);
        assert_eq!(config.cluster.transport, TransportKind::Rest);
        assert_eq!(config.ssh.port, 22);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!("rest".parse::<TransportKind>().unwrap(), TransportKind::Rest);
        assert_eq!("SSH".parse::<TransportKind>().unwrap(), TransportKind::Ssh);
        assert!("telnet".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_rest_url() {
        let mut cluster = ClusterConfig {
            clustername: "cluster1".to_string(),
            ..Default::default()
        };
        assert_eq!(cluster.rest_url(), "https://cluster1:7443/rest/");

        cluster.domain = Some("example.com".to_string());
        assert_eq!(cluster.rest_url(), "https://cluster1.example.com:7443/rest/");

        cluster.domain = Some(String::new());
        assert_eq!(cluster.host(), "cluster1");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(rest_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_clustername() {
        let mut config = rest_config();
        config.cluster.clustername = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rest_credentials() {
        let mut config = rest_config();
        config.cluster.password = None;
        assert!(config.validate().is_err());

        config.cluster.token = Some("abc".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ssh() {
        let mut config = rest_config();
        config.cluster.transport = TransportKind::Ssh;
        config.cluster.password = None;
        assert!(config.validate().is_ok());

        config.ssh.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = rest_config();
        let rendered = format!("{:?}", config.cluster);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[cluster]
clustername = "10.0.0.5"
username = "admin"
transport = "ssh"

[ssh]
identity_file = "/root/.ssh/id_ed25519"
"#;
        let config: SvcConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cluster.clustername, "10.0.0.5");
        assert_eq!(config.cluster.transport, TransportKind::Ssh);
        assert_eq!(
            config.ssh.identity_file,
            Some(PathBuf::from("/root/.ssh/id_ed25519"))
        );
        // Unspecified values should use defaults
        assert_eq!(config.ssh.port, 22);
        assert_eq!(config.cluster.rest_port, 7443);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cluster]\nclustername = \"cluster1\"\ntimeout_secs = 5").unwrap();

        let config = SvcConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.cluster.clustername, "cluster1");
        assert_eq!(config.cluster.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cluster\nclustername = ").unwrap();
        assert!(matches!(
            SvcConfig::load_or_default(file.path()),
            Err(SvcError::Config { .. })
        ));
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = SvcConfig::load_or_default("/nonexistent/path.toml").unwrap();
        assert_eq!(config.cluster.clustername, "");
    }
}
