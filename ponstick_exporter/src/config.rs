//! Startup configuration, read from the environment once.
//!
//! SSH_HOST (default 192.168.11.1), SSH_PORT (22), SSH_USERNAME (root),
//! SSH_PASSWORD (required), LUA_SCRIPT_PATH (gpon_status.lua) and
//! SSH_TIMEOUT_SECS (30).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "192.168.11.1";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_SCRIPT_PATH: &str = "gpon_status.lua";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LISTEN_PORT: u16 = 9100;

/// Where and as whom to open the remote shell.
#[derive(Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: SshTarget,
    pub script_path: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.is_empty());

        let password = get("SSH_PASSWORD").ok_or(ConfigError::MissingPassword)?;
        let port = match get("SSH_PORT") {
            Some(v) => parse_number("SSH_PORT", &v)?,
            None => DEFAULT_SSH_PORT,
        };
        let timeout_secs: u64 = match get("SSH_TIMEOUT_SECS") {
            Some(v) => parse_number("SSH_TIMEOUT_SECS", &v)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "SSH_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            target: SshTarget {
                host: get("SSH_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
                port,
                user: get("SSH_USERNAME").unwrap_or_else(|| DEFAULT_USER.into()),
                password,
            },
            script_path: get("LUA_SCRIPT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT_PATH)),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Reads the diagnostic script. Done once at startup.
    pub fn load_script(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.script_path).map_err(|source| ConfigError::Script {
            path: self.script_path.display().to_string(),
            source,
        })
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// HTTP listen port for `/metrics`, taken from `--port N`, `--port=N` or
/// `-p N`. The long form wins over `-p`; anything unparsable falls back to
/// `default_port` (9100 in the binary).
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut args = args.into_iter().skip(1);
    let mut long = None;
    let mut short = None;
    while let Some(arg) = args.next() {
        if let Some(v) = arg.strip_prefix("--port=") {
            long = Some(v.to_string());
        } else if arg == "--port" {
            long = args.next();
        } else if arg == "-p" {
            short = args.next();
        }
    }
    long.or(short)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_password_set() {
        let cfg = Config::from_lookup(lookup(&[("SSH_PASSWORD", "pw")])).unwrap();
        assert_eq!(cfg.target.host, DEFAULT_HOST);
        assert_eq!(cfg.target.port, 22);
        assert_eq!(cfg.target.user, "root");
        assert_eq!(cfg.target.password, "pw");
        assert_eq!(cfg.script_path, PathBuf::from("gpon_status.lua"));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_or_empty_password_is_fatal() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::MissingPassword)
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SSH_PASSWORD", "")])),
            Err(ConfigError::MissingPassword)
        ));
    }

    #[test]
    fn overrides_and_validation() {
        let cfg = Config::from_lookup(lookup(&[
            ("SSH_PASSWORD", "pw"),
            ("SSH_HOST", "10.0.0.2"),
            ("SSH_PORT", "2222"),
            ("SSH_USERNAME", "admin"),
            ("SSH_TIMEOUT_SECS", "5"),
            ("LUA_SCRIPT_PATH", "/etc/status.lua"),
        ]))
        .unwrap();
        assert_eq!(cfg.target.host, "10.0.0.2");
        assert_eq!(cfg.target.port, 2222);
        assert_eq!(cfg.target.user, "admin");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.script_path, PathBuf::from("/etc/status.lua"));

        let err = Config::from_lookup(lookup(&[("SSH_PASSWORD", "pw"), ("SSH_PORT", "ssh")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "SSH_PORT", .. }));

        let err = Config::from_lookup(lookup(&[("SSH_PASSWORD", "pw"), ("SSH_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "SSH_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = Config::from_lookup(lookup(&[("SSH_PASSWORD", "hunter2")])).unwrap();
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
