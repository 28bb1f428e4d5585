//! Backend preference configuration.
//!
//! Preferences reorder a format's candidate backends. They come from
//! explicit construction, any serde source, or the environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix of the environment variables read by [`HandlerPreferences::from_env`].
pub const ENV_PREFIX: &str = "FILECFG_PREFER_";

/// Preferred backend order per format.
///
/// Deserializes from a plain map, e.g. `{"json": ["serde_json"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerPreferences {
    orders: BTreeMap<String, Vec<String>>,
}

impl HandlerPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load preferences from environment variables.
    ///
    /// Variables:
    /// - `FILECFG_PREFER_<FORMAT>`: comma-separated backend names, most
    ///   preferred first. `<FORMAT>` is matched case-insensitively, so
    ///   `FILECFG_PREFER_JSON=serde_json` configures the `json` format.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build preferences from `(name, value)` pairs, ignoring names
    /// without the [`ENV_PREFIX`].
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut preferences = Self::new();
        for (name, value) in vars {
            let Some(format) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let order: Vec<String> = value
                .as_ref()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !format.is_empty() && !order.is_empty() {
                preferences.orders.insert(format.to_ascii_lowercase(), order);
            }
        }
        preferences
    }

    /// Set the order for `format`.
    pub fn prefer<I, S>(mut self, format: &str, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orders
            .insert(format.to_string(), order.into_iter().map(Into::into).collect());
        self
    }

    /// The configured order for `format`.
    pub fn order(&self, format: &str) -> Option<&[String]> {
        self.orders.get(format).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vars_with_prefix_become_orders() {
        let prefs = HandlerPreferences::from_vars([
            ("FILECFG_PREFER_JSON", "serde_json"),
            ("FILECFG_PREFER_XML", " quick_xml , other ,"),
            ("PATH", "/usr/bin"),
            ("FILECFG_PREFER_TOML", ""),
        ]);
        assert_eq!(prefs.order("json"), Some(&["serde_json".to_string()][..]));
        assert_eq!(
            prefs.order("xml"),
            Some(&["quick_xml".to_string(), "other".to_string()][..])
        );
        assert_eq!(prefs.order("toml"), None);
        assert_eq!(prefs.order("path"), None);
    }

    #[test]
    fn deserializes_from_a_plain_map() {
        let prefs: HandlerPreferences =
            serde_json::from_str(r#"{"yaml": ["serde_yaml"]}"#).unwrap();
        assert_eq!(prefs, HandlerPreferences::new().prefer("yaml", ["serde_yaml"]));
    }

    #[test]
    fn format_suffix_is_case_insensitive() {
        let prefs = HandlerPreferences::from_vars([
            ("FILECFG_PREFER_Ini", "ini"),
            ("FILECFG_PREFER_", "serde_json"),
            ("filecfg_prefer_yaml", "serde_yaml"),
        ]);
        assert_eq!(prefs.order("ini"), Some(&["ini".to_string()][..]));
        assert_eq!(prefs, HandlerPreferences::new().prefer("ini", ["ini"]));
    }
}
