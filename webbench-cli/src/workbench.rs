use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use webbench_replay::{HttpTransport, InterceptorController, ReplayController};
use webbench_storage::{
    ProjectConfig, ProjectLayout, ProjectPaths, SavedRequestStore, SqliteBlobStore,
};
use webbench_target::ScopeStore;

/// Everything one CLI invocation works against.
pub struct Workbench {
    pub paths: ProjectPaths,
    pub config: ProjectConfig,
    pub requests: SavedRequestStore<SqliteBlobStore>,
    pub scope: ScopeStore<SqliteBlobStore>,
    pub transport: HttpTransport,
    pub replay: ReplayController,
    pub interceptor: InterceptorController,
}

impl Workbench {
    pub fn open(root: &Path) -> Result<Self> {
        let paths = ProjectPaths::new(root, &ProjectLayout::default());
        ensure_dir(&paths.root)?;
        ensure_dir(&paths.exports_dir)?;

        let config = ProjectConfig::load_or_create(&paths.config)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("failed to load {}", paths.config.display()))?;
        let requests = SavedRequestStore::new(
            SqliteBlobStore::open(&paths.database)
                .with_context(|| format!("failed to open {}", paths.database.display()))?,
        );
        let scope = ScopeStore::open(SqliteBlobStore::open(&paths.database)?);
        let transport = HttpTransport::from_config(&config.http).context("invalid [http] config")?;
        let replay = ReplayController::from_config(&config);
        debug!(root = %paths.root.display(), "project opened");

        Ok(Self {
            paths,
            config,
            requests,
            scope,
            transport,
            replay,
            interceptor: InterceptorController::new(),
        })
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
}
