//! Shared plumbing for the toroidal surface geometry crates: the error taxonomy,
//! per-instance settings, cache cells and the dependent-object registry.

pub mod cache;
pub mod dependency;
pub mod error;
pub mod settings;
pub mod traits;

pub use cache::Cached;
pub use dependency::{Dependent, DependencyRegistry, DependentKey};
pub use error::{Result, TsgError};
pub use settings::Settings;
pub use traits::{Invalidate, Optimizable};
