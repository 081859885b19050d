//! Import dependency graphs for TypeScript projects.
//!
//! This crate turns a YAML run configuration into a [`DependencyGraph`]: a map
//! from every project source file to the project files it imports.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use tsdeps_graph::{Config, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT_FILE, build_dependency_graph};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config::load(Path::new(DEFAULT_CONFIG_FILE))?;
//! let graph = build_dependency_graph(&cfg)?;
//! graph.write_to(Path::new(DEFAULT_OUTPUT_FILE))?;
//!
//! for related in graph.related_files("src/index.ts", 2) {
//!     println!("{related}");
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod graph;

// Re-export public API
pub use builder::build_dependency_graph;
pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT_FILE};
pub use graph::DependencyGraph;
