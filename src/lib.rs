//! Mizan - Arabic root-and-pattern morphology engine
//!
//! Generates derived words from triliteral roots and schemes, validates words
//! against roots, and keeps a growing record of observed derivatives.

pub mod error;
pub mod roots;
pub mod schemes;
pub mod template;
pub mod transform;
pub mod validation;
pub mod stats;
pub mod engine;
pub mod seed;
pub mod store;
pub mod config;
pub mod state;

pub use config::Config;
pub use engine::{Engine, GeneratedWord, Rules};
pub use error::MizanError;
pub use roots::{Derivative, Root, RootIndex, TreeView};
pub use schemes::{HashView, SchemeStore};
pub use seed::SeedData;
pub use state::AppState;
pub use stats::Statistics;
pub use store::Store;
pub use transform::{RootCategory, RuleKind, TransformationEngine, TransformationGroup, TransformationRule};
pub use validation::ValidationResult;
