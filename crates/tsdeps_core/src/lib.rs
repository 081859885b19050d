//! Core utilities for tsdeps.
//!
//! This crate provides the pieces needed to discover the import graph of a
//! TypeScript project:
//! - Collecting source files under a root, honoring ignore globs
//! - Parsing import statements from TS/TSX files with oxc
//! - Reading `baseUrl` and `paths` from `tsconfig.json`
//! - Resolving module specifiers to files (relative, tsconfig, node_modules)

mod collector;
mod constants;
mod parser;
mod resolver;
mod tsconfig;
mod types;

// Re-export public API
pub use collector::{CollectorConfig, collect_sources};
pub use constants::{PARSEABLE_EXTENSIONS, SOURCE_EXTENSIONS};
pub use parser::imports_for;
pub use resolver::{ResolveCache, resolve};
pub use tsconfig::{PathAlias, TsConfig, read_tsconfig};
pub use types::{ImportFilter, SpecKind, Specifier};
