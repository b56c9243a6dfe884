//! Module grouping and cross-file dependency edges
//!
//! Everything here is a pure function of the analyzed [`FileRecord`] set:
//! - **modules**: directory-based [`ModuleRecord`] identification
//! - **resolve**: best-effort import and inheritance edges
//! - **patterns**: architecture pattern keywords
//!
//! Edges only ever point at paths present in the input set. An import that
//! cannot be resolved is dropped rather than guessed.

pub mod modules;
pub mod patterns;
pub mod resolve;

pub use modules::{identify_modules, ModuleIdentifier, MAX_INTERNAL_COMPONENTS, MAX_PUBLIC_API};
pub use patterns::detect_architecture_patterns;
pub use resolve::{build_dependency_graph, normalize_reference, DependencyGraphBuilder};

use crate::types::DependencyEdge;

/// Human-readable `source -> target (kind)` lines for the first `limit` edges
pub fn key_relationships(edges: &[DependencyEdge], limit: usize) -> Vec<String> {
    edges
        .iter()
        .take(limit)
        .map(|e| format!("{} -> {} ({})", e.source, e.target, e.relationship))
        .collect()
}
