//! Tunables for reconciliation output.

use serde::{Deserialize, Serialize};

/// Layout and labelling settings applied when the engine creates graph
/// records on the user's behalf.
///
/// Missing fields fall back to [`SyncSettings::default`] when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Maximum characters kept from anchor text in `Outbound` edge labels.
    pub max_label_chars: usize,
    /// Horizontal offset of a new external node from its source node.
    pub external_offset_x: f64,
    /// Vertical offset of a new external node from its source node.
    pub external_offset_y: f64,
    /// Extra vertical spacing per external node already created in the run.
    pub external_stagger_y: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_label_chars: 60,
            external_offset_x: 320.0,
            external_offset_y: 0.0,
            external_stagger_y: 90.0,
        }
    }
}

impl SyncSettings {
    /// Truncates `text` to `max_label_chars`, marking the cut with `...`.
    pub fn truncate_label(&self, text: &str) -> String {
        if text.chars().count() <= self.max_label_chars {
            return text.to_string();
        }
        let mut truncated = text.chars().take(self.max_label_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
