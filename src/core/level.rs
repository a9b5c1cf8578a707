//! Level names and the per-level routing registry
//!
//! Levels are plain strings. The constants below are the conventional
//! four-letter tags, but any name can be configured and logged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INFO: &str = "INFO";
pub const ERRO: &str = "ERRO";
pub const DEBG: &str = "DEBG";
pub const FATL: &str = "FATL";
pub const ACES: &str = "ACES";

/// Routing flags for one level
///
/// `duplicates_to_main` only matters when `has_own_file` is set; a level
/// without its own file always goes to the main file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Append `" [file:line]"` of the logging call to the text
    pub with_call_site: bool,
    /// Write this level to `{base}.{date}.{LEVEL}.log`
    pub has_own_file: bool,
    /// Also write own-file records to the main file
    pub duplicates_to_main: bool,
}

impl LevelConfig {
    pub const fn new(with_call_site: bool, has_own_file: bool, duplicates_to_main: bool) -> Self {
        Self {
            with_call_site,
            has_own_file,
            duplicates_to_main,
        }
    }

    /// Whether a record of this level is written to the main file
    pub fn writes_to_main(&self) -> bool {
        !self.has_own_file || self.duplicates_to_main
    }
}

/// Level name → [`LevelConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelRegistry {
    levels: BTreeMap<String, LevelConfig>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the config for `name`
    pub fn set_level(&mut self, name: impl Into<String>, config: LevelConfig) {
        self.levels.insert(name.into(), config);
    }

    /// Turn on call-site capture for each name, creating bare configs for
    /// names that are not registered yet
    pub fn enable_call_site_for<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.levels.entry(name.into()).or_default().with_call_site = true;
        }
    }

    pub fn get(&self, name: &str) -> Option<LevelConfig> {
        self.levels.get(name).copied()
    }

    pub fn wants_call_site(&self, name: &str) -> bool {
        self.levels.get(name).is_some_and(|c| c.with_call_site)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_level_overwrites() {
        let mut registry = LevelRegistry::new();
        registry.set_level(ERRO, LevelConfig::new(true, true, false));
        registry.set_level(ERRO, LevelConfig::new(false, true, true));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(ERRO), Some(LevelConfig::new(false, true, true)));
    }

    #[test]
    fn test_any_name_is_accepted() {
        let mut registry = LevelRegistry::new();
        registry.set_level("AUDIT", LevelConfig::new(false, true, false));
        assert!(registry.get("AUDIT").is_some());
        assert!(registry.get("audit").is_none());
    }

    #[test]
    fn test_enable_call_site_for() {
        let mut registry = LevelRegistry::new();
        registry.set_level(ERRO, LevelConfig::new(false, true, true));
        registry.enable_call_site_for([ERRO, FATL]);

        assert_eq!(registry.get(ERRO), Some(LevelConfig::new(true, true, true)));
        assert_eq!(registry.get(FATL), Some(LevelConfig::new(true, false, false)));
        assert!(registry.wants_call_site(FATL));
        assert!(!registry.wants_call_site(INFO));
    }

    #[test]
    fn test_writes_to_main() {
        assert!(LevelConfig::new(false, false, false).writes_to_main());
        assert!(LevelConfig::new(false, false, true).writes_to_main());
        assert!(LevelConfig::new(false, true, true).writes_to_main());
        assert!(!LevelConfig::new(false, true, false).writes_to_main());
    }

    #[test]
    fn test_level_config_serde_defaults() {
        let config: LevelConfig = serde_json::from_str(r#"{"has_own_file": true}"#).unwrap();
        assert_eq!(config, LevelConfig::new(false, true, false));
    }
}
