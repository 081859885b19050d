use anyhow::{Context, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
};

/// Mapping from a project-relative file path to the project files it imports.
///
/// Keys are kept sorted so serialization is stable across runs. Each value list
/// is deduplicated and keeps the order imports first appear in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `file` with its imports, dropping repeated targets.
    pub fn insert<I>(&mut self, file: impl Into<String>, imports: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut seen = HashSet::new();
        let deps: Vec<String> =
            imports.into_iter().map(Into::into).filter(|dep| seen.insert(dep.clone())).collect();
        self.edges.insert(file.into(), deps);
    }

    pub fn get(&self, file: &str) -> Option<&[String]> {
        self.edges.get(file).map(Vec::as_slice)
    }

    pub fn contains(&self, file: &str) -> bool {
        self.edges.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize dependency graph")
    }

    /// Writes the pretty JSON to `path` and returns its canonical location.
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        debug!("Writing {} files to {}", self.len(), path.display());
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        path.canonicalize().with_context(|| format!("Failed to resolve {}", path.display()))
    }

    /// Reads a graph written by [`DependencyGraph::write_to`]. Windows separators
    /// are normalized to `/`.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading dependency graph from {}", path.display());
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let mut graph = Self::new();
        for (file, deps) in parsed {
            graph.insert(normalize(&file), deps.iter().map(|d| normalize(d)));
        }
        Ok(graph)
    }

    /// Files reachable from `file` within `depth` hops, in breadth-first order.
    ///
    /// Neighbours are visited in sorted order; `file` itself is never listed and
    /// a `depth` below one yields nothing.
    pub fn related_files(&self, file: &str, depth: i64) -> Vec<String> {
        if depth < 1 {
            return Vec::new();
        }

        let start = normalize(file);
        let mut visited: HashSet<String> = HashSet::from([start.clone()]);
        let mut queue: VecDeque<(String, i64)> = VecDeque::from([(start, 0)]);
        let mut result = Vec::new();

        while let Some((current, dist)) = queue.pop_front() {
            if dist == depth {
                continue;
            }
            let mut neighbours: Vec<&String> =
                self.edges.get(&current).map(|deps| deps.iter().collect()).unwrap_or_default();
            neighbours.sort();

            for neighbour in neighbours {
                if visited.insert(neighbour.clone()) {
                    trace!("{} is related at distance {}", neighbour, dist + 1);
                    result.push(neighbour.clone());
                    queue.push_back((neighbour.clone(), dist + 1));
                }
            }
        }

        result
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}
