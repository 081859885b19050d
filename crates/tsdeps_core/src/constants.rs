//! Constants for file extensions and resolution strategies.
//!
//! ## Source files
//!
//! Only `.ts` and `.tsx` files form the project file set by default. Callers
//! can widen this through [`CollectorConfig::extensions`](crate::CollectorConfig).
//!
//! ## Resolution
//!
//! Resolution probes TypeScript extensions before JavaScript ones, the same
//! order `tsc` uses, and maps ESM-style `./foo.js` specifiers back to their
//! TypeScript sources.

/// Default extensions of files that form the project file set
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Extensions the parser understands
pub const PARSEABLE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] =
    &["ts", "tsx", "d.ts", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// JavaScript extensions a specifier may carry while pointing at a TypeScript source
pub const JS_TO_TS_EXTENSIONS: &[(&str, &[&str])] = &[
    ("js", &["ts", "tsx", "d.ts"]),
    ("jsx", &["tsx"]),
    ("mjs", &["mts", "d.mts"]),
    ("cjs", &["cts", "d.cts"]),
];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.d.ts",
    "index.mts",
    "index.cts",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
];

/// Project-wide compiler configuration looked up at the project root
pub const TSCONFIG_FILE: &str = "tsconfig.json";
