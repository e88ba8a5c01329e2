//! Panel configuration from the environment.
//!
//! Recognized variables:
//! - `KPANEL_NAMESPACE`: namespace to list in (unset or empty = all namespaces)
//! - `KPANEL_FETCH_TIMEOUT_SECS`: per-list timeout (default 30)
//! - `KPANEL_TYPE_FILTER`: comma separated kinds, e.g. `sts,ds`
//! - `KPANEL_NAME_FILTER`: case-insensitive name substring

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{KubeResourceType, PanelError, PanelResult};

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelConfig {
    pub namespace: Option<String>,
    pub fetch_timeout: Duration,
    /// Empty means every kind is shown.
    pub type_filter: Vec<KubeResourceType>,
    pub name_filter: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            type_filter: Vec::new(),
            name_filter: None,
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> PanelResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup<F>(get: F) -> PanelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        cfg.namespace = get("KPANEL_NAMESPACE").filter(|s| !s.trim().is_empty());
        if let Some(raw) = get("KPANEL_FETCH_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| PanelError::Config(format!("KPANEL_FETCH_TIMEOUT_SECS: not a number: {}", raw)))?;
            cfg.fetch_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(raw) = get("KPANEL_TYPE_FILTER") {
            cfg.type_filter = parse_type_filter(&raw)?;
        }
        cfg.name_filter = get("KPANEL_NAME_FILTER").filter(|s| !s.is_empty());
        Ok(cfg)
    }
}

/// Parse `sts,ds` style lists; blanks are ignored and duplicates collapse.
pub fn parse_type_filter(raw: &str) -> PanelResult<Vec<KubeResourceType>> {
    let mut out: Vec<KubeResourceType> = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let t = part.parse::<KubeResourceType>()?;
        if !out.contains(&t) {
            out.push(t);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = PanelConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, PanelConfig::default());
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_all_keys() {
        let cfg = PanelConfig::from_lookup(lookup(&[
            ("KPANEL_NAMESPACE", "prod"),
            ("KPANEL_FETCH_TIMEOUT_SECS", "5"),
            ("KPANEL_TYPE_FILTER", "ds, sts,ds"),
            ("KPANEL_NAME_FILTER", "web"),
        ]))
        .unwrap();
        assert_eq!(cfg.namespace.as_deref(), Some("prod"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
        assert_eq!(cfg.type_filter, vec![KubeResourceType::DaemonSets, KubeResourceType::StatefulSets]);
        assert_eq!(cfg.name_filter.as_deref(), Some("web"));
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let err = PanelConfig::from_lookup(lookup(&[("KPANEL_FETCH_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }

    #[test]
    fn empty_namespace_means_all() {
        let cfg = PanelConfig::from_lookup(lookup(&[("KPANEL_NAMESPACE", "  ")])).unwrap();
        assert!(cfg.namespace.is_none());
    }
}
