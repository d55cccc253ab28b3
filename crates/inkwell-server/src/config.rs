use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Accepted range for `INKWELL_SESSION_DAYS`.
const SESSION_DAYS: std::ops::RangeInclusive<i64> = 1..=365;

/// Placeholder JWT secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub session_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port: u16 = get("INKWELL_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("INKWELL_PORT must be a port number")?;
        let session_days: i64 = get("INKWELL_SESSION_DAYS")
            .unwrap_or_else(|| "14".into())
            .parse()
            .context("INKWELL_SESSION_DAYS must be a whole number of days")?;
        anyhow::ensure!(
            SESSION_DAYS.contains(&session_days),
            "INKWELL_SESSION_DAYS must be between {} and {} (got {})",
            SESSION_DAYS.start(),
            SESSION_DAYS.end(),
            session_days
        );

        Ok(Self {
            host: get("INKWELL_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("INKWELL_DB_PATH").unwrap_or_else(|| "inkwell.db".into()).into(),
            jwt_secret: get("INKWELL_JWT_SECRET").unwrap_or_else(|| "dev-secret-change-me".into()),
            session_days,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr().unwrap(), "0.0.0.0:8000".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("inkwell.db"));
        assert_eq!(cfg.session_days, 14);
        assert!(cfg.has_placeholder_secret());
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("INKWELL_HOST", "127.0.0.1"),
            ("INKWELL_PORT", "9090"),
            ("INKWELL_JWT_SECRET", "s3cr3t"),
            ("INKWELL_SESSION_DAYS", "1"),
        ])
        .unwrap();
        assert_eq!(cfg.addr().unwrap(), "127.0.0.1:9090".parse().unwrap());
        assert_eq!(cfg.session_days, 1);
        assert!(!cfg.has_placeholder_secret());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("INKWELL_PORT", "eighty")]).is_err());
    }

    #[test]
    fn session_days_must_be_in_range() {
        for days in ["0", "-1", "9223372036854775807", "366", "two"] {
            assert!(
                config(&[("INKWELL_SESSION_DAYS", days)]).is_err(),
                "INKWELL_SESSION_DAYS={days}"
            );
        }
        assert_eq!(config(&[("INKWELL_SESSION_DAYS", "365")]).unwrap().session_days, 365);
    }
}
