// Configuration: service addresses, template location, transport and time zones

use crate::error::{QflowError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env pattern is valid"));

pub const DEFAULT_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Debug, Clone, Deserialize)]
pub struct QflowConfig {
    pub service_address: ServiceAddresses,
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub time_zones: HashMap<String, String>,
    #[serde(default)]
    pub service_units: HashMap<String, String>,
}

// One destination per remote operation group
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAddresses {
    pub calendar: String,
    pub unit: String,
    pub booking: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            content_type: default_content_type(),
        }
    }
}

impl QflowConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QflowError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(&expand_env_vars(text))
            .map_err(|e| QflowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (group, address) in [
            ("calendar", &self.service_address.calendar),
            ("unit", &self.service_address.unit),
            ("booking", &self.service_address.booking),
        ] {
            if address.trim().is_empty() {
                return Err(QflowError::Config(format!(
                    "service_address.{} must not be empty",
                    group
                )));
            }
        }
        Ok(())
    }
}

/// Replaces `${VAR}` with the environment value, leaving unknown variables as written.
pub fn expand_env_vars(text: &str) -> String {
    ENV_VAR
        .replace_all(text, |captures: &regex::Captures| {
            let var_name = &captures[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
templates_dir = "/etc/qflow/templates"

[service_address]
calendar = "https://qflow.example.gov.au/CalendarService.svc"
unit = "https://qflow.example.gov.au/UnitService.svc"
booking = "https://qflow.example.gov.au/AppointmentService.svc"

[transport]
timeout_ms = 15000

[time_zones]
"Christmas Island Time" = "Indian/Christmas"

[service_units]
"12" = "17"
"#;

    #[test]
    fn test_full_config() {
        let config = QflowConfig::from_toml_str(FULL).unwrap();

        assert_eq!(
            config.service_address.calendar,
            "https://qflow.example.gov.au/CalendarService.svc"
        );
        assert_eq!(config.templates_dir, Some(PathBuf::from("/etc/qflow/templates")));
        assert_eq!(config.transport.timeout_ms, Some(15000));
        assert_eq!(config.transport.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(
            config.time_zones.get("Christmas Island Time").map(String::as_str),
            Some("Indian/Christmas")
        );
        assert_eq!(config.service_units.get("12").map(String::as_str), Some("17"));
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = QflowConfig::from_toml_str(
            r#"
[service_address]
calendar = "http://localhost/calendar"
unit = "http://localhost/unit"
booking = "http://localhost/booking"
"#,
        )
        .unwrap();

        assert!(config.templates_dir.is_none());
        assert!(config.transport.timeout_ms.is_none());
        assert!(config.time_zones.is_empty());
    }

    #[test]
    fn test_missing_or_empty_address_rejected() {
        let missing = QflowConfig::from_toml_str(
            r#"
[service_address]
calendar = "http://localhost/calendar"
unit = "http://localhost/unit"
"#,
        );
        assert!(matches!(missing, Err(QflowError::Config(_))));

        let empty = QflowConfig::from_toml_str(
            r#"
[service_address]
calendar = "http://localhost/calendar"
unit = " "
booking = "http://localhost/booking"
"#,
        );
        assert!(matches!(empty, Err(QflowError::Config(_))));
    }

    #[test]
    fn test_env_expansion() {
        std::env::set_var("QFLOW_TEST_HOST", "qflow.internal");
        let expanded = expand_env_vars("https://${QFLOW_TEST_HOST}/x ${QFLOW_TEST_UNSET_VAR}");
        assert_eq!(expanded, "https://qflow.internal/x ${QFLOW_TEST_UNSET_VAR}");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qflow.toml");
        std::fs::write(&path, FULL).unwrap();

        assert!(QflowConfig::from_file(&path).is_ok());
        assert!(matches!(
            QflowConfig::from_file(dir.path().join("missing.toml")),
            Err(QflowError::Config(_))
        ));
    }
}
