use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::app::error::{LecternError, Result};
use crate::config::Config;
use crate::domain::NavigationContext;
use crate::navigator::{
    FetchCoordinator, HydratingCallback, Hydrator, Navigator, SessionHistory,
};
use crate::normalizer::UrlNormalizer;
use crate::provider::{HttpProvider, Provider};
use crate::store::SqliteStore;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub provider: Arc<dyn Provider>,
    pub navigator: Navigator,
    pub hydrator: Arc<Hydrator>,
    pub fetcher: FetchCoordinator,
    pub history: Arc<SessionHistory>,
    /// Session navigation state. Operations read a snapshot and hand back
    /// deltas; commits are serialized through [`commit`](Self::commit).
    pub session: Arc<Mutex<NavigationContext>>,
}

impl AppContext {
    pub fn new(config: &Config) -> Result<Self> {
        let db_path = match &config.db_path {
            Some(path) => path.clone(),
            None => Self::default_db_path()?,
        };
        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: &Config, store: Arc<SqliteStore>) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::new(HttpProvider::new(
            config.sites.clone(),
            config.fetch.timeout(),
            &config.fetch.user_agent,
        )?);
        let navigator = Navigator::new(UrlNormalizer::new(config.sites.clone()));

        let session = Arc::new(Mutex::new(NavigationContext::default()));
        let hydrating_session = session.clone();
        let on_hydrating: HydratingCallback = Arc::new(move |stable_id, hydrating| {
            hydrating_session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set_hydrating(stable_id, hydrating);
        });
        let hydrator = Arc::new(Hydrator::new(store.clone()).with_callback(on_hydrating));
        let fetcher = FetchCoordinator::new(store.clone(), provider.clone(), hydrator.clone());

        Ok(Self {
            store,
            provider,
            navigator,
            hydrator,
            fetcher,
            history: Arc::new(SessionHistory::new()),
            session,
        })
    }

    /// Snapshot of the session state for a navigation call.
    pub fn session_snapshot(&self) -> NavigationContext {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply one commit to the session state.
    pub fn commit<F: FnOnce(&mut NavigationContext)>(&self, apply: F) {
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        apply(&mut session);
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| LecternError::Config("Could not find data directory".into()))?;
        let lectern_dir = data_dir.join("lectern");
        std::fs::create_dir_all(&lectern_dir)?;
        Ok(lectern_dir.join("lectern.db"))
    }
}
