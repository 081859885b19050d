use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

pub struct CollectorConfig {
    pub root: PathBuf,
    /// Extensions (without the dot) of files to collect
    pub extensions: Vec<String>,
    /// Directory globs relative to `root`; each excludes the directory and everything below it
    pub ignore: Vec<String>,
    pub respect_gitignore: bool,
}

/// Walks `cfg.root` and returns every source file not excluded by `cfg.ignore`,
/// sorted by path.
pub fn collect_sources(cfg: &CollectorConfig) -> Result<Vec<PathBuf>> {
    debug!("Collecting source files");
    let root = cfg.root.clone();
    let excluded = build_ignore_set(&cfg.ignore)?;
    debug!("Walking directory tree from root: {}", root.display());

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .parents(cfg.respect_gitignore)
        .ignore(cfg.respect_gitignore)
        .git_ignore(cfg.respect_gitignore)
        .git_global(false)
        .git_exclude(cfg.respect_gitignore);

    let filter_root = root.clone();
    builder.filter_entry(move |dent| {
        let keep = !is_excluded(&excluded, &filter_root, dent.path());
        if !keep {
            trace!("Skipping ignored path: {}", dent.path().display());
        }
        keep
    });

    let mut files: Vec<PathBuf> = Vec::new();
    for res in builder.build() {
        let dent = res?;
        let p = dent.path();
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        if let Some(ext) = p.extension().and_then(|e| e.to_str())
            && cfg.extensions.iter().any(|e| e == ext)
        {
            trace!("Found source file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }

    files.sort();
    debug!("Collected {} source files", files.len());
    Ok(files)
}

/// Compiles ignore entries into a glob set matched against root-relative paths.
/// `dist` excludes `dist` and `dist/**`; `*` does not cross `/`.
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for raw in patterns {
        let pattern = normalize_pattern(raw);
        if pattern.is_empty() {
            continue;
        }
        for glob in [pattern.to_string(), format!("{}/**", pattern)] {
            builder.add(
                GlobBuilder::new(&glob)
                    .literal_separator(true)
                    .build()
                    .with_context(|| format!("Invalid ignore pattern '{}'", raw))?,
            );
        }
        trace!("Ignoring '{}' and everything below it", pattern);
    }
    builder.build().context("Failed to compile ignore patterns")
}

fn normalize_pattern(raw: &str) -> &str {
    let mut pattern = raw.trim();
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern.trim_end_matches('/')
}

fn is_excluded(set: &GlobSet, root: &Path, path: &Path) -> bool {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => set.is_match(rel),
        _ => false,
    }
}
