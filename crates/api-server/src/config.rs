use anyhow::{Context, Result};
use risk_core::{Prior, PriorKind};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Deployment settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// JSON model artifact; the bundled reference model when unset
    pub model_path: Option<PathBuf>,
    /// Overrides the model's recorded training prevalence
    pub pi_train: Option<Prior>,
    /// Target prevalence applied when a request does not name one
    pub pi_deploy: Option<Prior>,
    pub enable_hsts: bool,
    pub json_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            model_path: None,
            pi_train: None,
            pi_deploy: None,
            enable_hsts: false,
            json_logging: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("BIND_ADDR '{addr}' is not a socket address"))?,
            None => Self::default().bind_addr,
        };

        Ok(Self {
            bind_addr,
            model_path: get("RISK_MODEL_PATH").map(PathBuf::from),
            pi_train: parse_prior(get("PI_TRAIN"), PriorKind::Train, "PI_TRAIN")?,
            pi_deploy: parse_prior(get("PI_DEPLOY"), PriorKind::Deploy, "PI_DEPLOY")?,
            enable_hsts: get("ENABLE_HSTS").map(|v| is_truthy(&v)).unwrap_or(false),
            json_logging: get("RUST_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn parse_prior(raw: Option<String>, kind: PriorKind, key: &str) -> Result<Option<Prior>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .with_context(|| format!("{key} '{raw}' is not a number"))?;
    let prior = Prior::new(kind, value).with_context(|| format!("{key} is misconfigured"))?;
    Ok(Some(prior))
}

fn is_truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("true") || v == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_core::RiskError;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(config.model_path.is_none());
        assert!(config.pi_train.is_none());
        assert!(config.pi_deploy.is_none());
        assert!(!config.enable_hsts);
    }

    #[test]
    fn test_priors_and_flags() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PI_TRAIN", "0.5"),
            ("PI_DEPLOY", " 0.002 "),
            ("ENABLE_HSTS", "TRUE"),
            ("RUST_LOG_FORMAT", "json"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.pi_train.unwrap().value(), 0.5);
        assert_eq!(config.pi_deploy.unwrap().value(), 0.002);
        assert!(config.enable_hsts);
        assert!(config.json_logging);
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = ServerConfig::from_lookup(lookup(&[("PI_DEPLOY", "  ")])).unwrap();
        assert!(config.pi_deploy.is_none());
    }

    #[test]
    fn test_invalid_deploy_prior_names_key() {
        let err = ServerConfig::from_lookup(lookup(&[("PI_DEPLOY", "1")])).unwrap_err();
        assert!(err.to_string().contains("PI_DEPLOY"));
        assert!(matches!(
            err.downcast_ref::<RiskError>(),
            Some(RiskError::InvalidPrior { kind: PriorKind::Deploy, .. })
        ));
    }

    #[test]
    fn test_non_numeric_train_prior() {
        let err = ServerConfig::from_lookup(lookup(&[("PI_TRAIN", "half")])).unwrap_err();
        assert!(err.to_string().contains("PI_TRAIN"));
    }
}
