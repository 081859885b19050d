use anyhow::Result;
use dashmap::DashMap;
use log::{debug, info, trace};
use rayon::prelude::*;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    thread,
};

use tsdeps_core::{
    ResolveCache, Specifier, TsConfig, collect_sources, imports_for, read_tsconfig, resolve,
};

use crate::{config::Config, graph::DependencyGraph};

/// Builds the dependency graph for the project described by `cfg`.
///
/// Every collected source file becomes a key. Its value lists the project files
/// it imports; specifiers that resolve outside the collected set (packages,
/// ignored directories, missing files) are dropped.
pub fn build_dependency_graph(cfg: &Config) -> Result<DependencyGraph> {
    info!("Building dependency graph");

    let root = cfg.project_root()?;

    let tsconfig = if cfg.use_tsconfig {
        read_tsconfig(&root)?.unwrap_or_default()
    } else {
        debug!("tsconfig.json lookup disabled");
        TsConfig::default()
    };

    debug!("Collecting source files, ignore={:?}", cfg.ignore_patterns());
    let files = collect_sources(&cfg.collector_config(root.clone()))?;
    info!("Found {} source files", files.len());

    // resolved targets are canonical, so compare against canonical paths
    let project_files: HashSet<PathBuf> =
        files.iter().map(|f| f.canonicalize().unwrap_or_else(|_| f.clone())).collect();
    let filter = cfg.import_filter();

    let import_cache: DashMap<PathBuf, Vec<Specifier>> = DashMap::new();
    let resolve_cache = ResolveCache::new();

    let entries: Vec<(String, Vec<String>)> = files
        .par_iter()
        .map(|file| -> Result<(String, Vec<String>)> {
            debug!("Thread {:?} processing: {}", thread::current().id(), file.display());

            let specs = imports_for(file, &import_cache)?;
            let mut deps = Vec::new();
            for spec in specs.iter().filter(|s| filter.accepts(s.kind)) {
                let Some(target) = resolve(&root, &tsconfig, file, &spec.request, &resolve_cache)?
                else {
                    trace!("Dropping unresolved import '{}' in {}", spec.request, file.display());
                    continue;
                };
                if !project_files.contains(&target) {
                    trace!("Dropping import '{}' outside the project files", spec.request);
                    continue;
                }
                deps.push(relative_path(&root, &target));
            }

            Ok((relative_path(&root, file), deps))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut graph = DependencyGraph::new();
    for (file, deps) in entries {
        graph.insert(file, deps);
    }

    info!("Dependency graph complete: {} files, {} edges", graph.len(), graph.edge_count());
    debug!(
        "Cache statistics: imports={}, resolutions={}",
        import_cache.len(),
        resolve_cache.len()
    );
    Ok(graph)
}

/// `path` relative to `root`, always with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn config_for(root: &Path, extra: &str) -> Config {
        Config::from_yaml(&format!("project_path: {}\n{}", root.display(), extra)).unwrap()
    }

    fn deps<'a>(graph: &'a DependencyGraph, file: &str) -> Vec<&'a str> {
        graph.get(file).unwrap().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_two_file_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "a.ts", "import { x } from './b';");
        create_test_file(root, "b.ts", "export const x = 1;");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(
            serde_json::to_value(&graph).unwrap(),
            serde_json::json!({ "a.ts": ["b.ts"], "b.ts": [] })
        );
    }

    #[test]
    fn test_nested_paths_use_forward_slashes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/app/main.ts", "import { util } from '../lib/util';");
        create_test_file(root, "src/lib/util.ts", "export const util = 1;");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(deps(&graph, "src/app/main.ts"), vec!["src/lib/util.ts"]);
        assert!(deps(&graph, "src/lib/util.ts").is_empty());
    }

    #[test]
    fn test_duplicate_imports_collapse() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "a.ts",
            "import { x } from './b';\nimport { y } from './b.ts';\nimport type { Z } from './b';",
        );
        create_test_file(root, "b.ts", "export const x = 1, y = 2; export type Z = number;");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(deps(&graph, "a.ts"), vec!["b.ts"]);
    }

    #[test]
    fn test_external_and_missing_imports_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "a.ts",
            "import React from 'react';\nimport { gone } from './missing';\nimport './b';",
        );
        create_test_file(root, "b.ts", "");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(deps(&graph, "a.ts"), vec!["b.ts"]);
    }

    #[test]
    fn test_node_modules_targets_dropped_when_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "a.ts", "import { pkg } from 'pkg';");
        create_test_file(root, "node_modules/pkg/index.ts", "export const pkg = 1;");

        let graph =
            build_dependency_graph(&config_for(root, "ignore:\n  - node_modules\n")).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(deps(&graph, "a.ts").is_empty());
    }

    #[test]
    fn test_ignored_files_absent_from_keys_and_values() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/a.ts", "import { gen } from '../generated/gen';");
        create_test_file(root, "generated/gen.ts", "export const gen = 1;");

        let graph = build_dependency_graph(&config_for(root, "ignore: [generated]\n")).unwrap();
        assert!(!graph.contains("generated/gen.ts"));
        assert!(graph.iter().all(|(_, deps)| deps.iter().all(|d| !d.starts_with("generated/"))));
        assert!(deps(&graph, "src/a.ts").is_empty());
    }

    #[test]
    fn test_gitignored_files_included_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        create_test_file(root, ".gitignore", "gen/\n");
        create_test_file(root, "a.ts", "import { x } from './gen/api';");
        create_test_file(root, "gen/api.ts", "export const x = 1;");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(
            serde_json::to_value(&graph).unwrap(),
            serde_json::json!({ "a.ts": ["gen/api.ts"], "gen/api.ts": [] })
        );
    }

    #[test]
    fn test_gitignore_honored_when_requested() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        create_test_file(root, ".gitignore", "gen/\n");
        create_test_file(root, "a.ts", "import { x } from './gen/api';");
        create_test_file(root, "gen/api.ts", "export const x = 1;");

        let graph =
            build_dependency_graph(&config_for(root, "respect_gitignore: true\n")).unwrap();
        assert!(!graph.contains("gen/api.ts"));
        assert!(deps(&graph, "a.ts").is_empty());
    }

    #[test]
    fn test_tsconfig_paths_are_honored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "tsconfig.json",
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@lib/*": ["src/lib/*"] } } }"#,
        );
        create_test_file(root, "src/main.ts", "import { a } from '@lib/a';");
        create_test_file(root, "src/lib/a.ts", "export const a = 1;");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(deps(&graph, "src/main.ts"), vec!["src/lib/a.ts"]);

        let graph = build_dependency_graph(&config_for(root, "use_tsconfig: false\n")).unwrap();
        assert!(deps(&graph, "src/main.ts").is_empty());
    }

    #[test]
    fn test_import_kind_options() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "index.ts",
            "import type { T } from './types';\nexport * from './reexported';\nconst lazy = import('./lazy');",
        );
        create_test_file(root, "types.ts", "export type T = string;");
        create_test_file(root, "reexported.ts", "export const r = 1;");
        create_test_file(root, "lazy.ts", "export const l = 1;");

        let graph = build_dependency_graph(&config_for(root, "")).unwrap();
        assert_eq!(deps(&graph, "index.ts"), vec!["types.ts"]);

        let graph = build_dependency_graph(&config_for(
            root,
            "type_imports: false\nreexports: true\ndynamic_imports: true\n",
        ))
        .unwrap();
        assert_eq!(deps(&graph, "index.ts"), vec!["reexported.ts", "lazy.ts"]);
    }

    #[test]
    fn test_output_is_stable_across_runs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "a.ts", "import './c';\nimport './b';");
        create_test_file(root, "b.ts", "import './c';");
        create_test_file(root, "c.ts", "");

        let cfg = config_for(root, "");
        let first = build_dependency_graph(&cfg).unwrap().to_json_pretty().unwrap();
        let second = build_dependency_graph(&cfg).unwrap().to_json_pretty().unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"c.ts\"").unwrap() < first.find("\"b.ts\"").unwrap());
    }

    #[test]
    fn test_missing_project_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_for(&temp_dir.path().join("nope"), "");
        assert!(build_dependency_graph(&cfg).is_err());
    }
}
