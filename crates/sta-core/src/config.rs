//! Core configuration.

use serde::{Deserialize, Serialize};
use sta_filter::Paging;

/// Settings consumed by the entity services and the query compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Page size used when a request has no `$top`.
    pub default_top: usize,
    /// Upper bound for `$top`.
    pub max_top: usize,
    /// Derive a FeatureOfInterest from the Thing's Location when an
    /// Observation arrives without one.
    pub derive_feature_of_interest: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let paging = Paging::default();
        Self {
            default_top: paging.default_top,
            max_top: paging.max_top,
            derive_feature_of_interest: true,
        }
    }
}

impl CoreConfig {
    pub fn paging(&self) -> Paging {
        Paging {
            default_top: self.default_top,
            max_top: self.max_top.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CoreConfig = serde_json::from_str(r#"{"max_top": 50}"#).unwrap();
        assert_eq!(config.max_top, 50);
        assert_eq!(config.default_top, 100);
        assert!(config.derive_feature_of_interest);
        assert_eq!(config.paging().max_top, 50);
    }
}
