//! Reverse lookup: which scheme, if any, produces a word from a root

use crate::engine::Rules;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub root: Option<String>,
    pub scheme: Option<String>,
}

impl ValidationResult {
    pub fn matched(root: &str, scheme: String) -> Self {
        Self {
            valid: true,
            root: Some(root.to_string()),
            scheme: Some(scheme),
        }
    }

    pub fn unmatched(root: Option<&str>) -> Self {
        Self {
            valid: false,
            root: root.map(str::to_string),
            scheme: None,
        }
    }
}

/// Run every known scheme forward over `root` and return the first one whose
/// output equals `word` exactly. Schemes are tried in hash-table order.
pub fn detect_scheme(rules: &Rules, root: &str, word: &str) -> Option<String> {
    rules.schemes.iter().find_map(|entry| {
        match rules.derive(root, &entry.name, &entry.template) {
            Ok(candidate) if candidate == word => Some(entry.name.clone()),
            _ => None,
        }
    })
}
