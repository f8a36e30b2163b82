// Translation of the backend's Windows-style zone names to IANA identifiers

use crate::error::{QflowError, Result};
use std::collections::HashMap;

pub trait TimeZoneDictionary: Send + Sync {
    fn time_zone_iana(&self, foreign_zone_id: &str) -> Result<String>;
}

const BUILT_IN: &[(&str, &str)] = &[
    ("AUS Eastern Standard Time", "Australia/Sydney"),
    ("AUS Central Standard Time", "Australia/Darwin"),
    ("Cen. Australia Standard Time", "Australia/Adelaide"),
    ("E. Australia Standard Time", "Australia/Brisbane"),
    ("Tasmania Standard Time", "Australia/Hobart"),
    ("W. Australia Standard Time", "Australia/Perth"),
    ("Aus Central W. Standard Time", "Australia/Eucla"),
    ("Lord Howe Standard Time", "Australia/Lord_Howe"),
    ("Norfolk Standard Time", "Pacific/Norfolk"),
    ("UTC", "Etc/UTC"),
];

#[derive(Debug, Clone)]
pub struct StaticTimeZoneDictionary {
    zones: HashMap<String, String>,
}

impl StaticTimeZoneDictionary {
    pub fn new(zones: HashMap<String, String>) -> Self {
        Self { zones }
    }

    /// The built-in table with `extra` entries layered on top.
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut zones: HashMap<String, String> = BUILT_IN
            .iter()
            .map(|(foreign, iana)| (foreign.to_string(), iana.to_string()))
            .collect();
        zones.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { zones }
    }
}

impl Default for StaticTimeZoneDictionary {
    fn default() -> Self {
        Self::with_overrides(&HashMap::new())
    }
}

impl TimeZoneDictionary for StaticTimeZoneDictionary {
    fn time_zone_iana(&self, foreign_zone_id: &str) -> Result<String> {
        self.zones
            .get(foreign_zone_id)
            .cloned()
            .ok_or_else(|| QflowError::UnknownTimeZone(foreign_zone_id.to_string()))
    }
}
