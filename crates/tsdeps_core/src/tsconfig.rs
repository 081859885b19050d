use anyhow::{Context, Result, bail};
use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::constants::TSCONFIG_FILE;

/// The parts of a `tsconfig.json` that influence module resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsConfig {
    /// Absolute `compilerOptions.baseUrl`
    pub base_url: Option<PathBuf>,
    pub aliases: Vec<PathAlias>,
}

/// One `compilerOptions.paths` entry. Targets are absolute and may contain a
/// single `*` that receives the text captured from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub targets: Vec<String>,
}

impl PathAlias {
    /// Returns the text matched by `*`, or `""` for an exact pattern.
    pub fn capture<'a>(&self, request: &'a str) -> Option<&'a str> {
        match self.pattern.split_once('*') {
            None => (request == self.pattern).then_some(""),
            Some((prefix, suffix)) => {
                if request.len() >= prefix.len() + suffix.len()
                    && request.starts_with(prefix)
                    && request.ends_with(suffix)
                {
                    Some(&request[prefix.len()..request.len() - suffix.len()])
                } else {
                    None
                }
            }
        }
    }

    /// Exact patterns outrank wildcards; among wildcards the longest prefix wins.
    fn specificity(&self) -> usize {
        match self.pattern.split_once('*') {
            None => usize::MAX,
            Some((prefix, _)) => prefix.len(),
        }
    }
}

impl TsConfig {
    /// Candidate paths for a bare request according to `paths`, best match first.
    pub fn alias_candidates(&self, request: &str) -> Vec<PathBuf> {
        let best = self
            .aliases
            .iter()
            .filter_map(|alias| alias.capture(request).map(|captured| (alias, captured)))
            .max_by_key(|(alias, _)| alias.specificity());

        match best {
            Some((alias, captured)) => {
                trace!("Request '{}' matched path alias '{}'", request, alias.pattern);
                alias
                    .targets
                    .iter()
                    .map(|target| PathBuf::from(target.replacen('*', captured, 1)))
                    .collect()
            }
            None => Vec::new(),
        }
    }
}

/// Reads `<root>/tsconfig.json` if present, following relative `extends`.
pub fn read_tsconfig(root: &Path) -> Result<Option<TsConfig>> {
    let path = root.join(TSCONFIG_FILE);
    if !path.is_file() {
        debug!("No {} at {}", TSCONFIG_FILE, root.display());
        return Ok(None);
    }
    debug!("Reading compiler options from {}", path.display());

    let mut seen = HashSet::new();
    let config = load_chain(&path, &mut seen)?;
    debug!(
        "Loaded tsconfig: baseUrl={:?}, {} path aliases",
        config.base_url,
        config.aliases.len()
    );
    Ok(Some(config))
}

fn load_chain(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<TsConfig> {
    let path = clean(path);
    if !seen.insert(path.clone()) {
        bail!("Circular extends in {}", path.display());
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = content.trim_start_matches('\u{feff}');
    let json: Value = serde_json::from_str(&strip_jsonc(content))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let dir = path.parent().unwrap_or(Path::new("."));

    let mut config = TsConfig::default();
    for parent in extends_paths(&json, dir) {
        trace!("{} extends {}", path.display(), parent.display());
        let inherited = load_chain(&parent, seen)?;
        if inherited.base_url.is_some() {
            config.base_url = inherited.base_url;
        }
        if !inherited.aliases.is_empty() {
            config.aliases = inherited.aliases;
        }
    }

    let Some(compiler_options) = json.get("compilerOptions") else {
        return Ok(config);
    };

    if let Some(base_url) = compiler_options.get("baseUrl").and_then(|b| b.as_str()) {
        config.base_url = Some(clean(dir.join(base_url)));
    }

    if let Some(paths_obj) = compiler_options.get("paths").and_then(|p| p.as_object()) {
        // paths are relative to baseUrl, or to the declaring file without one
        let paths_base = config.base_url.clone().unwrap_or_else(|| dir.to_path_buf());
        config.aliases = paths_obj
            .iter()
            .filter_map(|(pattern, targets)| {
                let targets: Vec<String> = targets
                    .as_array()?
                    .iter()
                    .filter_map(|t| t.as_str())
                    .map(|t| clean(paths_base.join(t)).to_string_lossy().to_string())
                    .collect();
                if targets.is_empty() {
                    return None;
                }
                trace!("Found tsconfig path alias: '{}' -> {:?}", pattern, targets);
                Some(PathAlias { pattern: pattern.clone(), targets })
            })
            .collect();
    }

    Ok(config)
}

/// Relative `extends` entries, in application order. Package extends are skipped.
fn extends_paths(json: &Value, dir: &Path) -> Vec<PathBuf> {
    let entries: Vec<&str> = match json.get("extends") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str()).collect(),
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            if !(entry.starts_with('.') || entry.starts_with('/')) {
                debug!("Skipping package extends '{}'", entry);
                return None;
            }
            let candidate = dir.join(entry);
            if candidate.is_file() || entry.ends_with(".json") {
                Some(candidate)
            } else {
                // `./tsconfig.base` names `./tsconfig.base.json`
                Some(PathBuf::from(format!("{}.json", candidate.display())))
            }
        })
        .collect()
}

/// Strips `//` and `/* */` comments and trailing commas so tsconfig files
/// parse as plain JSON. String contents are left untouched.
fn strip_jsonc(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}
