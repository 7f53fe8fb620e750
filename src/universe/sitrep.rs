//! Situation report entries delivered to empires.

use serde::{Deserialize, Serialize};

/// One sitrep message for one empire.
///
/// `template` is either literal text or, when `stringtable_lookup` is set,
/// a key the client resolves. Parameters are `(tag, value)` pairs
/// substituted into the template by tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SitRepEntry {
    pub template: String,
    pub turn: i32,
    pub icon: String,
    pub parameters: Vec<(String, String)>,
    pub label: String,
    pub stringtable_lookup: bool,
}

impl SitRepEntry {
    #[must_use]
    pub fn new(template: impl Into<String>, turn: i32) -> Self {
        Self {
            template: template.into(),
            turn,
            icon: String::new(),
            parameters: Vec::new(),
            label: String::new(),
            stringtable_lookup: true,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((tag.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_stringtable_lookup(mut self, lookup: bool) -> Self {
        self.stringtable_lookup = lookup;
        self
    }

    /// First value given for `tag`.
    #[must_use]
    pub fn parameter(&self, tag: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let entry = SitRepEntry::new("EFFECT_MONSTER_SPAWNED", 12)
            .with_icon("icons/monster.png")
            .with_parameter("system", "4")
            .with_parameter("system", "5");

        assert_eq!(entry.turn, 12);
        assert_eq!(entry.parameter("system"), Some("4"));
        assert_eq!(entry.parameter("planet"), None);
        assert!(entry.stringtable_lookup);
    }

    #[test]
    fn test_serialization() {
        let entry = SitRepEntry::new("Literal text", 3).with_stringtable_lookup(false);
        let json = serde_json::to_string(&entry).unwrap();
        let back: SitRepEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
