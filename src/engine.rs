//! Morphology engine: generation, validation and administration
//!
//! State lives in two lock regions. `rules` holds the scheme store and the
//! transformation groups, `roots` holds the root index and its derivatives.
//! When both are needed, `rules` is always locked first.
//!
//! With a [`Store`] attached, every mutation is written to the database
//! before memory is touched, so a failed write leaves the indices as they were.

use crate::error::{MizanError, Result};
use crate::roots::{Derivative, RootIndex, TreeView};
use crate::schemes::{HashView, SchemeStore};
use crate::seed::SeedData;
use crate::stats::{self, Statistics};
use crate::store::Store;
use crate::template;
use crate::transform::{self, TransformationEngine, TransformationGroup};
use crate::validation::{self, ValidationResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Schemes and rewrite rules, guarded together
#[derive(Default)]
pub struct Rules {
    pub schemes: SchemeStore,
    pub transformations: TransformationEngine,
}

impl Rules {
    /// Forward pipeline: classify the root, expand the template over its
    /// underlying letters, then rewrite.
    pub fn derive(&self, root: &str, scheme: &str, template: &str) -> Result<String> {
        let letters = template::split_root(root)?;
        let category = transform::classify(&letters);
        let base = template::expand(&transform::original_letters(letters), template)?;
        Ok(self.transformations.derive(root, category, scheme, &base))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedWord {
    pub word: String,
    pub scheme: String,
}

#[derive(Default)]
pub struct Engine {
    roots: RwLock<RootIndex>,
    rules: RwLock<Rules>,
    store: Option<Store>,
}

impl Engine {
    /// Empty in-memory engine
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory engine populated from seed data
    pub fn from_seed(seed: &SeedData) -> Result<Self> {
        let mut roots = RootIndex::new();
        for text in &seed.roots {
            roots.insert(text);
        }

        let mut rules = Rules::default();
        for (name, template) in &seed.schemes {
            rules.schemes.put(name, template);
        }
        for group in &seed.groups {
            rules.transformations.save_group(group.clone())?;
        }

        Ok(Self {
            roots: RwLock::new(roots),
            rules: RwLock::new(rules),
            store: None,
        })
    }

    /// Engine backed by `store`, loaded with whatever the store holds
    pub fn with_store(store: Store) -> Result<Self> {
        let state = store.load()?;

        let mut roots = RootIndex::new();
        for (text, derivatives) in state.roots {
            roots.restore(&text, derivatives);
        }

        let mut rules = Rules::default();
        if let Some(capacity) = state.scheme_capacity {
            rules.schemes = SchemeStore::with_capacity(capacity);
        }
        for (name, template) in &state.schemes {
            rules.schemes.put(name, template);
        }
        for group in state.groups {
            rules.transformations.insert(group);
        }

        tracing::info!(
            "Loaded {} roots, {} schemes, {} transformation groups from {:?}",
            roots.len(),
            rules.schemes.len(),
            rules.transformations.len(),
            store.path()
        );

        Ok(Self {
            roots: RwLock::new(roots),
            rules: RwLock::new(rules),
            store: Some(store),
        })
    }

    fn read_roots(&self) -> Result<RwLockReadGuard<'_, RootIndex>> {
        self.roots
            .read()
            .map_err(|_| MizanError::Other("Failed to acquire root index lock".to_string()))
    }

    fn write_roots(&self) -> Result<RwLockWriteGuard<'_, RootIndex>> {
        self.roots
            .write()
            .map_err(|_| MizanError::Other("Failed to acquire root index lock".to_string()))
    }

    fn read_rules(&self) -> Result<RwLockReadGuard<'_, Rules>> {
        self.rules
            .read()
            .map_err(|_| MizanError::Other("Failed to acquire rules lock".to_string()))
    }

    fn write_rules(&self) -> Result<RwLockWriteGuard<'_, Rules>> {
        self.rules
            .write()
            .map_err(|_| MizanError::Other("Failed to acquire rules lock".to_string()))
    }

    /// Persist `words` as derivatives of `root`, then record them in memory.
    fn record(&self, roots: &mut RootIndex, root: &str, words: &[String]) -> Result<()> {
        if let Some(store) = &self.store {
            store.record_derivatives(root, words)?;
        }
        for word in words {
            roots.append_derivative(root, word);
        }
        Ok(())
    }

    // === Generation ===

    pub fn generate(&self, root: &str, scheme: &str) -> Result<String> {
        let rules = self.read_rules()?;
        let mut roots = self.write_roots()?;

        if !roots.contains(root) {
            return Err(MizanError::UnknownRoot(root.to_string()));
        }
        let template = rules
            .schemes
            .get(scheme)
            .ok_or_else(|| MizanError::UnknownScheme(scheme.to_string()))?;

        let word = rules.derive(root, scheme, template)?;
        self.record(&mut roots, root, std::slice::from_ref(&word))?;

        tracing::debug!("generate {} + {} -> {}", root, scheme, word);
        Ok(word)
    }

    /// Run every scheme over `root`. Schemes whose pipeline fails are skipped.
    pub fn generate_all(&self, root: &str) -> Result<Vec<GeneratedWord>> {
        let rules = self.read_rules()?;
        let mut roots = self.write_roots()?;

        if !roots.contains(root) {
            return Err(MizanError::UnknownRoot(root.to_string()));
        }

        let generated: Vec<GeneratedWord> = rules
            .schemes
            .iter()
            .filter_map(|entry| match rules.derive(root, &entry.name, &entry.template) {
                Ok(word) => Some(GeneratedWord {
                    word,
                    scheme: entry.name.clone(),
                }),
                Err(e) => {
                    tracing::warn!("Skipping scheme {} for {}: {}", entry.name, root, e);
                    None
                }
            })
            .collect();

        let words: Vec<String> = generated.iter().map(|g| g.word.clone()).collect();
        self.record(&mut roots, root, &words)?;

        Ok(generated)
    }

    // === Validation ===

    pub fn validate(&self, root: &str, word: &str) -> Result<ValidationResult> {
        let rules = self.read_rules()?;
        let mut roots = self.write_roots()?;

        if !roots.contains(root) {
            return Ok(ValidationResult::unmatched(None));
        }

        match validation::detect_scheme(&rules, root, word) {
            Some(scheme) => {
                self.record(&mut roots, root, &[word.to_string()])?;
                Ok(ValidationResult::matched(root, scheme))
            }
            None => Ok(ValidationResult::unmatched(Some(root))),
        }
    }

    // === Roots ===

    /// Add a root to the index. Returns `false` if it was already known.
    pub fn add_root(&self, root: &str) -> Result<bool> {
        let root = root.trim();
        template::split_root(root)?;

        let mut roots = self.write_roots()?;
        if roots.contains(root) {
            return Ok(false);
        }
        if let Some(store) = &self.store {
            store.insert_root(root)?;
        }
        tracing::info!("Added root {}", root);
        Ok(roots.insert(root))
    }

    pub fn derivatives(&self, root: &str) -> Result<Vec<Derivative>> {
        let roots = self.read_roots()?;
        roots
            .find(root)
            .map(|r| r.derivatives.clone())
            .ok_or_else(|| MizanError::UnknownRoot(root.to_string()))
    }

    /// Root texts in ascending order
    pub fn list_roots(&self) -> Result<Vec<String>> {
        Ok(self.read_roots()?.iter().map(|r| r.text.clone()).collect())
    }

    // === Schemes ===

    /// Scheme names in ascending order
    pub fn list_schemes(&self) -> Result<Vec<String>> {
        let mut names = self.read_rules()?.schemes.keys();
        names.sort();
        Ok(names)
    }

    pub fn scheme_details(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read_rules()?.schemes.entries().into_iter().collect())
    }

    /// Create or overwrite a scheme. Returns a confirmation message.
    pub fn put_scheme(&self, name: &str, template: &str) -> Result<String> {
        let (name, template) = (name.trim(), template.trim());
        if name.is_empty() {
            return Err(MizanError::InvalidInput("scheme name is required".to_string()));
        }
        template::validate(template)?;

        let mut rules = self.write_rules()?;
        if let Some(store) = &self.store {
            store.put_scheme(name, template, rules.schemes.capacity_after_put(name))?;
        }
        let message = match rules.schemes.put(name, template) {
            Some(_) => format!("Scheme updated: {}", name),
            None => format!("Scheme added: {}", name),
        };
        tracing::info!("{} = {}", message, template);
        Ok(message)
    }

    pub fn delete_scheme(&self, name: &str) -> Result<()> {
        let mut rules = self.write_rules()?;
        if !rules.schemes.contains(name) {
            return Err(MizanError::UnknownScheme(name.to_string()));
        }
        if let Some(store) = &self.store {
            store.delete_scheme(name)?;
        }
        rules.schemes.remove(name);
        tracing::info!("Deleted scheme {}", name);
        Ok(())
    }

    // === Transformation groups ===

    pub fn list_groups(&self) -> Result<Vec<TransformationGroup>> {
        Ok(self.read_rules()?.transformations.list_groups())
    }

    pub fn get_group(&self, key: &str) -> Result<TransformationGroup> {
        self.read_rules()?
            .transformations
            .get_group(key)
            .cloned()
            .ok_or_else(|| MizanError::UnknownGroup(key.to_string()))
    }

    pub fn save_group(&self, group: TransformationGroup) -> Result<TransformationGroup> {
        let group = TransformationEngine::prepare(group)?;

        let mut rules = self.write_rules()?;
        if let Some(store) = &self.store {
            store.save_group(&group)?;
        }
        rules.transformations.insert(group.clone());
        tracing::info!("Saved transformation group {} ({} rules)", group.key, group.rules.len());
        Ok(group)
    }

    pub fn delete_group(&self, key: &str) -> Result<()> {
        let mut rules = self.write_rules()?;
        if !rules.transformations.contains(key) {
            return Err(MizanError::UnknownGroup(key.to_string()));
        }
        if let Some(store) = &self.store {
            store.delete_group(key)?;
        }
        rules.transformations.delete_group(key)?;
        tracing::info!("Deleted transformation group {}", key);
        Ok(())
    }

    // === Inspection ===

    pub fn tree_view(&self) -> Result<Option<TreeView>> {
        Ok(self.read_roots()?.snapshot())
    }

    pub fn hash_view(&self) -> Result<HashView> {
        Ok(self.read_rules()?.schemes.view())
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let rules = self.read_rules()?;
        let roots = self.read_roots()?;
        Ok(stats::collect(&roots, &rules.schemes))
    }
}
