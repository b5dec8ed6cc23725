use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ProjectConfig {
    pub extender: ExtenderConfig,
    pub diff: DiffConfig,
    pub http: HttpConfig,
    pub replay: ReplayConfig,
}

/// Response and request post-processing toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtenderConfig {
    pub pretty_json: bool,
    pub trim_headers: bool,
    pub lowercase_header_keys: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiffConfig {
    pub max_lines_per_side: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ReplayConfig {
    pub policy: ReplayPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayPolicy {
    /// Overlapping replays all apply, in completion order.
    #[default]
    Concurrent,
    /// Only the newest replay issued for a record may update the session.
    LatestWins,
}

impl Default for ExtenderConfig {
    fn default() -> Self {
        Self {
            pretty_json: false,
            trim_headers: true,
            lowercase_header_keys: false,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_lines_per_side: 220,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            base_url: None,
        }
    }
}

impl ProjectConfig {
    pub fn load_or_create(path: &Path) -> Result<Self, String> {
        if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
            toml::from_str(&raw).map_err(|err| err.to_string())
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let contents = toml::to_string_pretty(self).map_err(|err| err.to_string())?;
        std::fs::write(path, contents).map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectLayout {
    pub config_filename: String,
    pub database_filename: String,
    pub exports_dirname: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            config_filename: "project.toml".to_string(),
            database_filename: "webbench.db".to_string(),
            exports_dirname: "exports".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub database: PathBuf,
    pub exports_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl AsRef<Path>, layout: &ProjectLayout) -> Self {
        let root = root.as_ref().to_path_buf();
        let config = root.join(&layout.config_filename);
        let database = root.join(&layout.database_filename);
        let exports_dir = root.join(&layout.exports_dirname);

        Self {
            root,
            config,
            database,
            exports_dir,
        }
    }
}
