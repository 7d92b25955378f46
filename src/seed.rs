//! Seed data: plain-text formats for roots, schemes and transformation groups
//!
//! Roots are one per line. Schemes are `name=template`. Transformation groups
//! are `key: op;op;...` where an op is `replace=from>to` or `replace_final=to`.
//! In every file, blank lines are ignored and `#` starts a comment line;
//! comment lines directly above a group line become that group's comment.

use crate::template;
use crate::transform::{TransformationGroup, TransformationRule};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const BUNDLED_ROOTS: &str = include_str!("../data/roots.txt");
const BUNDLED_SCHEMES: &str = include_str!("../data/schemes.txt");
const BUNDLED_TRANSFORMATIONS: &str = include_str!("../data/transformations.txt");

pub const ROOTS_FILE: &str = "roots.txt";
pub const SCHEMES_FILE: &str = "schemes.txt";
pub const TRANSFORMATIONS_FILE: &str = "transformations.txt";

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub roots: Vec<String>,
    pub schemes: Vec<(String, String)>,
    pub groups: Vec<TransformationGroup>,
}

impl SeedData {
    /// Seed data compiled into the binary
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_ROOTS, BUNDLED_SCHEMES, BUNDLED_TRANSFORMATIONS)
    }

    /// Read seed files from `dir`. A missing file falls back to the bundled one.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str, bundled: &'static str| -> Result<String> {
            let path = dir.join(name);
            if path.exists() {
                fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read seed file {:?}", path))
            } else {
                tracing::warn!("Seed file {:?} not found, using bundled copy", path);
                Ok(bundled.to_string())
            }
        };

        let roots = read(ROOTS_FILE, BUNDLED_ROOTS)?;
        let schemes = read(SCHEMES_FILE, BUNDLED_SCHEMES)?;
        let transformations = read(TRANSFORMATIONS_FILE, BUNDLED_TRANSFORMATIONS)?;
        Ok(Self::parse(&roots, &schemes, &transformations))
    }

    pub fn parse(roots: &str, schemes: &str, transformations: &str) -> Self {
        Self {
            roots: parse_roots(roots),
            schemes: parse_schemes(schemes),
            groups: parse_transformations(transformations),
        }
    }
}

fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

pub fn parse_roots(text: &str) -> Vec<String> {
    content_lines(text)
        .filter(|line| {
            let ok = template::split_root(line).is_ok();
            if !ok {
                tracing::warn!("Skipping root {:?}: not three letters", line);
            }
            ok
        })
        .map(str::to_string)
        .collect()
}

pub fn parse_schemes(text: &str) -> Vec<(String, String)> {
    content_lines(text)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('=').collect();
            let [name, rule] = parts.as_slice() else {
                tracing::warn!("Skipping scheme line {:?}: expected name=template", line);
                return None;
            };
            let (name, rule) = (name.trim(), rule.trim());
            if name.is_empty() || template::validate(rule).is_err() {
                tracing::warn!("Skipping scheme line {:?}: invalid name or template", line);
                return None;
            }
            Some((name.to_string(), rule.to_string()))
        })
        .collect()
}

fn parse_rule(op: &str, order: u32) -> Option<TransformationRule> {
    if let Some(to) = op.strip_prefix("replace_final=") {
        return Some(TransformationRule::replace_final(to.trim(), order));
    }
    let (from, to) = op.strip_prefix("replace=")?.split_once('>')?;
    let from = from.trim();
    if from.is_empty() {
        return None;
    }
    Some(TransformationRule::replace(from, to.trim(), order))
}

pub fn parse_transformations(text: &str) -> Vec<TransformationGroup> {
    let mut groups = Vec::new();
    let mut pending_comment: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            pending_comment.push(comment.trim());
            continue;
        }

        let Some((key, ops)) = line.split_once(':') else {
            tracing::warn!("Skipping transformation line {:?}: missing ':'", line);
            pending_comment.clear();
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            tracing::warn!("Skipping transformation line {:?}: empty key", line);
            pending_comment.clear();
            continue;
        }

        let mut rules = Vec::new();
        for op in ops.split(';').map(str::trim).filter(|op| !op.is_empty()) {
            match parse_rule(op, rules.len() as u32) {
                Some(rule) => rules.push(rule),
                None => tracing::warn!("Skipping rule {:?} in group {}", op, key),
            }
        }

        let mut group = TransformationGroup::new(key, rules);
        if !pending_comment.is_empty() {
            group.comment = Some(pending_comment.join("\n"));
            pending_comment.clear();
        }
        groups.push(group);
    }

    groups
}
