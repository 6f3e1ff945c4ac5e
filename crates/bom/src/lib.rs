//! `stocksmith-bom` — bill-of-materials graph and explosion.
//!
//! Pure computation: no IO, no locking, no suspension points. The graph is
//! an explicit adjacency mapping (not lazily-dereferenced references) so
//! that cycle detection and explosion stay terminating and testable in
//! isolation.

pub mod explosion;
pub mod graph;

pub use explosion::Requirement;
pub use graph::{BomGraph, BomLine};
