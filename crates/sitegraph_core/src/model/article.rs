//! Article body attached 1:1 to a content node.

use serde::{Deserialize, Serialize};

use crate::links::html_word_count;
use crate::model::node::NodeId;

/// Rich-text article owned by one content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub node_id: NodeId,
    /// HTML fragment produced by the editor.
    pub content: String,
    pub word_count: u32,
}

impl Article {
    /// Builds an article and derives `word_count` from the HTML text.
    pub fn new(node_id: NodeId, content: impl Into<String>) -> Self {
        let content = content.into();
        let word_count = html_word_count(content.as_str());
        Self {
            node_id,
            content,
            word_count,
        }
    }
}
