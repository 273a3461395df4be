//! Configuration for the observer and the renderer. Everything is
//! serde-deserializable with per-field defaults, so hosts can load partial
//! documents.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one evaluation observer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Capacity of the event feed the observer subscribes to.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Minimum interval between snapshot emissions. Throttling bounds how
    /// often consumers re-render; a trailing flush guarantees the final
    /// event is always reflected.
    #[serde(default = "default_throttle", with = "duration_ms")]
    pub throttle: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: default_event_buffer_size(),
            throttle: default_throttle(),
        }
    }
}

/// Settings for resolving and formatting cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Locale used for every localized lookup during rendering.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl RenderConfig {
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
        }
    }
}

fn default_event_buffer_size() -> usize {
    256
}

fn default_throttle() -> Duration {
    Duration::from_millis(100)
}

fn default_locale() -> String {
    "en".to_string()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ObserverConfig::default();
        assert_eq!(config.event_buffer_size, 256);
        assert_eq!(config.throttle, Duration::from_millis(100));
        assert_eq!(RenderConfig::default().locale, "en");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: ObserverConfig = serde_json::from_str(r#"{"throttle": 250}"#).unwrap();
        assert_eq!(config.throttle, Duration::from_millis(250));
        assert_eq!(config.event_buffer_size, 256);
    }

    #[test]
    fn test_duration_serializes_as_millis() {
        let config = ObserverConfig {
            event_buffer_size: 8,
            throttle: Duration::from_millis(40),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"event_buffer_size":8,"throttle":40}"#);
    }
}
