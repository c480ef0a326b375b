//! Shared wiring: config resolution, engine construction and target
//! selection.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;

use sharekeep_core::{
    Config, CredentialStore, Engine, KeyringStore, MdnsDiscovery, MountCommand, MountTable,
    MountTarget, Mounter, Reconciler, ShareDiscovery, SystemMountCommand, SystemMountTable,
    TargetStore,
};

/// Target-selection failures, typed so they map to exit codes.
#[derive(Debug, Error)]
pub enum SelectError {
    /// No configured target matches the selector.
    #[error("no target matches '{0}'")]
    NoSuchTarget(String),
    /// More than one target matches the selector.
    #[error("'{0}' is ambiguous, use the id prefix instead")]
    Ambiguous(String),
}

/// Everything a command needs.
pub struct App {
    /// The orchestration engine over the real seams.
    pub engine: Arc<Engine>,
    /// The OS-backed credential store, shared with the engine.
    pub credentials: Arc<dyn CredentialStore>,
    /// Loaded configuration.
    pub config: Config,
}

/// Config directory: `SHAREKEEP_CONFIG_DIR` override, else the
/// platform default.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SHAREKEEP_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Config::default_dir().context("could not determine a configuration directory")
}

impl App {
    /// Wire up the engine against the production seams.
    pub fn load() -> Result<Self> {
        let dir = config_dir()?;
        let config_path = dir.join("config.json");
        let config = Config::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;

        let store = TargetStore::new(dir.join("targets.json"));
        let table: Arc<dyn MountTable> = Arc::new(SystemMountTable::new());
        let command = mount_command(&config);
        let discovery: Arc<dyn ShareDiscovery> = Arc::new(MdnsDiscovery::new());
        let credentials: Arc<dyn CredentialStore> = Arc::new(KeyringStore::new());

        let reconciler = Reconciler::new(config.volumes_root.clone(), table);
        let mounter = Mounter::new(reconciler, command, discovery, config.discovery_timeout);
        let engine = Engine::new(
            store,
            mounter,
            credentials.clone(),
            config.reconnect_interval,
            config.min_retry_gap,
        )
        .context("loading target list")?;

        Ok(Self {
            engine: Arc::new(engine),
            credentials,
            config,
        })
    }

    /// Resolve a user-supplied selector to one target: exact name
    /// match first, then host, then id prefix. Matching is
    /// case-insensitive.
    pub fn find_target(&self, selector: &str) -> Result<MountTarget> {
        let targets = self.engine.targets();
        let sel = selector.trim().to_lowercase();

        for pick in [
            targets
                .iter()
                .filter(|t| t.name.to_lowercase() == sel)
                .collect::<Vec<_>>(),
            targets
                .iter()
                .filter(|t| t.host.to_lowercase() == sel)
                .collect::<Vec<_>>(),
            targets
                .iter()
                .filter(|t| t.id.to_string().starts_with(&sel))
                .collect::<Vec<_>>(),
        ] {
            match pick.len() {
                0 => {}
                1 => return Ok(pick[0].clone()),
                _ => return Err(SelectError::Ambiguous(selector.to_string()).into()),
            }
        }
        Err(SelectError::NoSuchTarget(selector.to_string()).into())
    }
}

fn mount_command(config: &Config) -> Arc<dyn MountCommand> {
    #[cfg(unix)]
    if let Some(socket) = &config.helper_socket {
        tracing::debug!(socket = %socket.display(), "using privileged helper");
        return Arc::new(sharekeep_core::HelperClient::new(socket.clone()));
    }
    let _ = config;
    Arc::new(SystemMountCommand::new())
}
