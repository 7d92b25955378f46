//! Weak-root classification and the rewrite-rule pipeline
//!
//! After template expansion, a base word built on a weak root is rewritten by
//! the rule groups keyed `{category}_{scheme}`. Rules run in ascending
//! `order`, each on the output of the previous one.

use crate::error::{MizanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scheme name of the active participle, which takes tanwin on weak roots
const ACTIVE_PARTICIPLE: &str = "فاعل";
const KASRATAN: char = '\u{064D}';

const WAW: char = 'و';
const YA: char = 'ي';
const ALIF: char = 'ا';
const ALIF_MAQSURA: char = 'ى';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootCategory {
    Sound,
    Mithal,
    Ajwaf,
    Naqis,
    Lafif,
}

impl RootCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootCategory::Sound => "sound",
            RootCategory::Mithal => "mithal",
            RootCategory::Ajwaf => "ajwaf",
            RootCategory::Naqis => "naqis",
            RootCategory::Lafif => "lafif",
        }
    }

    pub fn is_weak(&self) -> bool {
        *self != RootCategory::Sound
    }
}

impl fmt::Display for RootCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a root by the positions of its weak letters.
///
/// The first radical counts as weak when it is waw or ya. The middle one also
/// counts when it is a surface alif, and the last one additionally when it is
/// alif maqsura. Two or more weak radicals make the root lafif.
pub fn classify(letters: &[char; 3]) -> RootCategory {
    let [first, middle, last] = *letters;
    let weak_first = matches!(first, WAW | YA);
    let weak_middle = matches!(middle, WAW | YA | ALIF);
    let weak_last = matches!(last, WAW | YA | ALIF | ALIF_MAQSURA);

    let weak_count = [weak_first, weak_middle, weak_last]
        .iter()
        .filter(|w| **w)
        .count();

    if weak_count >= 2 {
        RootCategory::Lafif
    } else if weak_first {
        RootCategory::Mithal
    } else if weak_middle {
        RootCategory::Ajwaf
    } else if weak_last {
        RootCategory::Naqis
    } else {
        RootCategory::Sound
    }
}

/// Letters handed to the template. A medial alif is the surface form of an
/// underlying waw (قال from قول).
pub fn original_letters(letters: [char; 3]) -> [char; 3] {
    let [first, middle, last] = letters;
    let middle = if middle == ALIF { WAW } else { middle };
    [first, middle, last]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Rewrite every non-overlapping occurrence of `from`
    Replace { from: String, to: String },
    /// Drop the last character and append `to`. A trailing combining mark
    /// (shadda, tanwin) counts as the last character on its own.
    ReplaceFinal { to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationRule {
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TransformationRule {
    pub fn replace(from: &str, to: &str, order: u32) -> Self {
        Self {
            kind: RuleKind::Replace {
                from: from.to_string(),
                to: to.to_string(),
            },
            order,
            comment: None,
        }
    }

    pub fn replace_final(to: &str, order: u32) -> Self {
        Self {
            kind: RuleKind::ReplaceFinal { to: to.to_string() },
            order,
            comment: None,
        }
    }

    pub fn apply(&self, word: &str) -> String {
        match &self.kind {
            RuleKind::Replace { from, to } if !from.is_empty() => word.replace(from.as_str(), to),
            RuleKind::Replace { .. } => word.to_string(),
            RuleKind::ReplaceFinal { to } => match word.char_indices().last() {
                Some((idx, _)) => format!("{}{}", &word[..idx], to),
                None => word.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationGroup {
    pub key: String,
    #[serde(default)]
    pub rules: Vec<TransformationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TransformationGroup {
    pub fn new(key: &str, rules: Vec<TransformationRule>) -> Self {
        Self {
            key: key.to_string(),
            rules,
            comment: None,
        }
    }

    /// Run the rules in ascending `order`; ties keep declaration order.
    pub fn apply(&self, word: &str) -> String {
        let mut ordered: Vec<&TransformationRule> = self.rules.iter().collect();
        ordered.sort_by_key(|r| r.order);
        ordered
            .into_iter()
            .fold(word.to_string(), |current, rule| rule.apply(&current))
    }
}

pub fn group_key(category: RootCategory, scheme: &str) -> String {
    format!("{category}_{scheme}")
}

pub fn exception_key(root: &str, scheme: &str) -> String {
    format!("exception_{root}_{scheme}")
}

#[derive(Debug, Default)]
pub struct TransformationEngine {
    groups: BTreeMap<String, TransformationGroup>,
}

impl TransformationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and check a group before it is stored: the key is trimmed
    /// and must be non-empty, and replace rules need a non-empty `from`.
    pub fn prepare(mut group: TransformationGroup) -> Result<TransformationGroup> {
        group.key = group.key.trim().to_string();
        if group.key.is_empty() {
            return Err(MizanError::InvalidKey(
                "transformation group key must not be empty".to_string(),
            ));
        }

        for rule in &group.rules {
            if let RuleKind::Replace { from, .. } = &rule.kind {
                if from.is_empty() {
                    return Err(MizanError::InvalidInput(format!(
                        "replace rule #{} in {} has an empty source",
                        rule.order, group.key
                    )));
                }
            }
        }

        group.comment = group
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(group)
    }

    /// Store an already prepared group, replacing any group with the same key.
    pub fn insert(&mut self, group: TransformationGroup) {
        self.groups.insert(group.key.clone(), group);
    }

    pub fn save_group(&mut self, group: TransformationGroup) -> Result<TransformationGroup> {
        let group = Self::prepare(group)?;
        self.insert(group.clone());
        Ok(group)
    }

    pub fn delete_group(&mut self, key: &str) -> Result<TransformationGroup> {
        self.groups
            .remove(key)
            .ok_or_else(|| MizanError::UnknownGroup(key.to_string()))
    }

    pub fn get_group(&self, key: &str) -> Option<&TransformationGroup> {
        self.groups.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    /// All groups, sorted by key
    pub fn list_groups(&self) -> Vec<TransformationGroup> {
        self.groups.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Apply the group stored under `key`, or return the word unchanged.
    pub fn apply_key(&self, key: &str, word: &str) -> String {
        match self.groups.get(key) {
            Some(group) => group.apply(word),
            None => word.to_string(),
        }
    }

    /// Apply the single `{category}_{scheme}` group.
    pub fn apply(&self, category: RootCategory, scheme: &str, base: &str) -> String {
        if !category.is_weak() {
            return base.to_string();
        }
        self.apply_key(&group_key(category, scheme), base)
    }

    /// Full rewrite of a base word for `root` under `scheme`.
    ///
    /// Lafif roots take the mithal group, then the lafif group, falling back
    /// to the naqis group when no lafif group exists. Root-specific exception
    /// groups run last, followed by tanwin on weak active participles.
    pub fn derive(&self, root: &str, category: RootCategory, scheme: &str, base: &str) -> String {
        let mut word = match category {
            RootCategory::Sound => base.to_string(),
            RootCategory::Lafif => {
                let word = self.apply(RootCategory::Mithal, scheme, base);
                let lafif_key = group_key(RootCategory::Lafif, scheme);
                if self.contains(&lafif_key) {
                    self.apply_key(&lafif_key, &word)
                } else {
                    self.apply(RootCategory::Naqis, scheme, &word)
                }
            }
            _ => self.apply(category, scheme, base),
        };

        word = self.apply_key(&exception_key(root, scheme), &word);

        if scheme == ACTIVE_PARTICIPLE
            && matches!(
                category,
                RootCategory::Naqis | RootCategory::Lafif | RootCategory::Ajwaf
            )
        {
            if let Some(stem) = word.strip_suffix(YA) {
                word = format!("{stem}{KASRATAN}");
            }
        }

        word
    }
}
