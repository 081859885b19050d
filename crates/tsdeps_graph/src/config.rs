use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use tsdeps_core::{CollectorConfig, ImportFilter, PARSEABLE_EXTENSIONS, SOURCE_EXTENSIONS};

/// Default location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default location of the generated graph, relative to the working directory
pub const DEFAULT_OUTPUT_FILE: &str = "dependency_graph.json";

/// Run configuration, read from YAML.
///
/// ```yaml
/// project_path: ../web
/// ignore:
///   - node_modules
///   - dist
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root of the project to analyze; relative paths resolve against the working directory
    pub project_path: PathBuf,

    /// Directory globs relative to `project_path` to leave out
    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    /// Extensions of files that form the project
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Count `import type` declarations as edges
    #[serde(default = "default_true")]
    pub type_imports: bool,

    /// Count `import()` and `require()` calls as edges
    #[serde(default)]
    pub dynamic_imports: bool,

    /// Count `export ... from` as edges
    #[serde(default)]
    pub reexports: bool,

    /// Honor `<project_path>/tsconfig.json` for `baseUrl` and `paths`
    #[serde(default = "default_true")]
    pub use_tsconfig: bool,

    /// Also skip files excluded by `.gitignore` and `.ignore`; off unless requested
    #[serde(default)]
    pub respect_gitignore: bool,
}

fn default_extensions() -> Vec<String> {
    SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut cfg: Config = serde_yaml::from_str(raw).context("Failed to parse YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&mut self) -> Result<()> {
        if self.project_path.as_os_str().is_empty() {
            bail!("project_path must not be empty");
        }

        for ext in &mut self.extensions {
            *ext = ext.trim_start_matches('.').to_string();
        }
        if self.extensions.is_empty() {
            bail!("extensions must list at least one file extension");
        }
        if let Some(ext) = self.extensions.iter().find(|e| !PARSEABLE_EXTENSIONS.contains(&e.as_str()))
        {
            bail!("Unsupported extension '{}', expected one of {:?}", ext, PARSEABLE_EXTENSIONS);
        }
        Ok(())
    }

    pub fn ignore_patterns(&self) -> &[String] {
        self.ignore.as_deref().unwrap_or_default()
    }

    pub fn import_filter(&self) -> ImportFilter {
        ImportFilter {
            type_imports: self.type_imports,
            reexports: self.reexports,
            dynamic_imports: self.dynamic_imports,
        }
    }

    /// Absolute, canonical project root. Fails when it does not exist or is not a directory.
    pub fn project_root(&self) -> Result<PathBuf> {
        let root = self.project_path.canonicalize().with_context(|| {
            format!("project_path {} does not exist", self.project_path.display())
        })?;
        if !root.is_dir() {
            bail!("project_path {} is not a directory", root.display());
        }
        info!("Using project root: {}", root.display());
        Ok(root)
    }

    pub fn collector_config(&self, root: PathBuf) -> CollectorConfig {
        CollectorConfig {
            root,
            extensions: self.extensions.clone(),
            ignore: self.ignore_patterns().to_vec(),
            respect_gitignore: self.respect_gitignore,
        }
    }
}
