use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{INDEX_FILES, JS_TO_TS_EXTENSIONS, RESOLVE_EXTENSIONS};
use crate::tsconfig::TsConfig;

pub type ResolveCache = DashMap<(PathBuf, String), Option<PathBuf>>;

/// Resolves `request` as written in `from_file` to a file on disk.
///
/// Resolution order is: relative paths, tsconfig `paths` aliases, `baseUrl`,
/// then `node_modules` walking up from the importing file to `root`.
/// Returns `Ok(None)` when nothing on disk matches.
pub fn resolve(
    root: &Path,
    tsconfig: &TsConfig,
    from_file: &Path,
    request: &str,
    cache: &ResolveCache,
) -> Result<Option<PathBuf>> {
    let key = (from_file.to_path_buf(), request.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
        return Ok(v.clone());
    }
    trace!("Resolving: '{}' from {}", request, from_file.display());

    let base = from_file.parent().unwrap_or(root);
    let resolved = if is_relative(request) {
        trace!("Resolving as relative import: '{}'", request);
        resolve_file(&clean(base.join(request)))
    } else {
        resolve_with_tsconfig(tsconfig, request).or_else(|| {
            trace!("Resolving as node_modules package: '{}'", request);
            resolve_node_module_from_dir(base, request, root)
        })
    };

    if resolved.is_some() {
        debug!("Resolved '{}' from {} to {:?}", request, from_file.display(), resolved);
    } else {
        trace!("Failed to resolve '{}' from {}", request, from_file.display());
    }
    cache.insert(key, resolved.clone());
    Ok(resolved)
}

fn is_relative(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
        || request.starts_with('/')
}

fn resolve_with_tsconfig(tsconfig: &TsConfig, request: &str) -> Option<PathBuf> {
    for candidate in tsconfig.alias_candidates(request) {
        if let Some(resolved) = resolve_file(&candidate) {
            trace!("Resolved alias for '{}' to {:?}", request, resolved);
            return Some(resolved);
        }
    }

    let base_url = tsconfig.base_url.as_ref()?;
    let resolved = resolve_file(&clean(base_url.join(request)));
    if resolved.is_some() {
        trace!("Resolved '{}' against baseUrl {}", request, base_url.display());
    }
    resolved
}

fn canonical(p: &Path) -> PathBuf {
    p.canonicalize().unwrap_or_else(|_| p.to_path_buf())
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(canonical(p));
    }

    let display = p.to_string_lossy();
    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", display, ext));
        if candidate.is_file() {
            return Some(canonical(&candidate));
        }
    }

    // `./foo.js` written against `./foo.ts`
    if let Some(ext) = p.extension().and_then(|e| e.to_str())
        && let Some((_, targets)) = JS_TO_TS_EXTENSIONS.iter().find(|(js, _)| *js == ext)
    {
        for target in *targets {
            let candidate = p.with_extension(target);
            if candidate.is_file() {
                return Some(canonical(&candidate));
            }
        }
    }

    if p.is_dir() {
        for index_file in INDEX_FILES {
            let candidate = p.join(index_file);
            if candidate.is_file() {
                return Some(canonical(&candidate));
            }
        }
    }

    None
}

fn resolve_node_module_from_dir(
    start_dir: &Path,
    pkg: &str,
    workspace_root: &Path,
) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, pkg);
    let mut current_dir = start_dir;

    loop {
        let result = resolve_node_module(current_dir, pkg);
        if result.is_some() {
            return result;
        }

        if current_dir == workspace_root {
            break;
        }

        current_dir = current_dir.parent()?;
    }

    None
}

fn resolve_node_module(dir: &Path, request: &str) -> Option<PathBuf> {
    let nm = dir.join("node_modules").join(request);

    // Deep imports such as `lodash/fp` or `@scope/pkg/sub`
    if !nm.join("package.json").is_file()
        && let Some(resolved) = resolve_file(&nm)
    {
        return Some(resolved);
    }

    if !nm.is_dir() {
        trace!("node_modules path does not exist: {:?}", nm);
        return None;
    }
    trace!("Checking node_modules at: {:?}", nm);

    let pkg_json = nm.join("package.json");
    if let Ok(txt) = fs::read_to_string(&pkg_json)
        && let Ok(v) = serde_json::from_str::<serde_json::Value>(&txt)
    {
        for entry in package_entries(&v) {
            if let Some(resolved) = resolve_file(&nm.join(entry.trim_start_matches("./"))) {
                return Some(resolved);
            }
        }
    }

    INDEX_FILES
        .iter()
        .map(|index_file| nm.join(index_file))
        .find(|p| p.is_file())
        .map(|p| canonical(&p))
}

/// Package entry points in lookup order: typings first, then `exports["."]`,
/// `module` and `main`.
fn package_entries(v: &serde_json::Value) -> Vec<&str> {
    let mut entries = Vec::new();

    for field in ["types", "typings"] {
        if let Some(s) = v.get(field).and_then(|x| x.as_str()) {
            entries.push(s);
        }
    }

    if let Some(exports) = v.get("exports") {
        if let Some(s) = exports.as_str() {
            entries.push(s);
        } else if let Some(dot_export) = exports.get(".") {
            if let Some(s) = dot_export.as_str() {
                entries.push(s);
            } else if let Some(conditions) = dot_export.as_object() {
                for key in ["types", "import", "require", "default"] {
                    if let Some(s) = conditions.get(key).and_then(|x| x.as_str()) {
                        entries.push(s);
                    }
                }
            }
        }
    }

    for field in ["module", "main"] {
        if let Some(s) = v.get(field).and_then(|x| x.as_str()) {
            entries.push(s);
        }
    }

    entries
}
