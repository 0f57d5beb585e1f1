pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod matching;
pub mod notifier;
pub mod ports;
pub mod state;
pub mod templates;
pub mod types;

use adapters::oauth::{OAuthError, ServiceAccountKey, TokenSource};
use adapters::{FcmSender, FirestoreStore, LogPushSender, MemoryStore, TokioTimeProvider};
use config::{AppConfig, Backend, ConfigError, FirestoreConfig, WebConfig};
use matching::MatchOptions;
use notifier::{Outcome, WishlistNotifier};
use types::listing::ListingCreatedEvent;

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

pub use templates::render_service_worker;

const USER_AGENT: &str = concat!("wishlist-notifier/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Credentials(#[from] OAuthError),
    #[error(transparent)]
    Seed(#[from] adapters::memory::MemoryStoreError),
    #[error(transparent)]
    WebConfig(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] templates::TemplateError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

pub type FirestoreNotifier = WishlistNotifier<FirestoreStore, FcmSender, TokioTimeProvider>;
pub type MemoryNotifier = WishlistNotifier<MemoryStore, LogPushSender, TokioTimeProvider>;

/// Process-wide service handles, built once at startup.
pub enum Services {
    Firestore(FirestoreNotifier),
    Memory(MemoryNotifier),
}

impl Services {
    pub fn init(config: &AppConfig) -> Result<Self, StartupError> {
        let options = MatchOptions {
            skip_notified: config.skip_notified,
        };
        let services = match &config.backend {
            Backend::Firestore(firestore) => {
                Services::Firestore(firestore_notifier(firestore)?.with_options(options))
            }
            Backend::Memory { seed } => {
                let store = match seed {
                    Some(path) => MemoryStore::load(path)?,
                    None => MemoryStore::new(),
                };
                tracing::warn!("using in-memory store; push messages are only logged");
                Services::Memory(
                    WishlistNotifier::new(store, LogPushSender, TokioTimeProvider)
                        .with_options(options),
                )
            }
        };
        Ok(services)
    }

    pub async fn handle(&self, event: &ListingCreatedEvent) -> Result<Outcome, error::NotifyError> {
        match self {
            Services::Firestore(notifier) => notifier.on_listing_created(event).await,
            Services::Memory(notifier) => notifier.on_listing_created(event).await,
        }
    }
}

fn firestore_notifier(config: &FirestoreConfig) -> Result<FirestoreNotifier, StartupError> {
    let key = ServiceAccountKey::load(&config.credentials)?;
    let project_id = config
        .project_id
        .clone()
        .unwrap_or_else(|| key.project_id.clone());
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let tokens = TokenSource::service_account(key, client.clone())?;

    let mut store = FirestoreStore::new(client.clone(), tokens.clone(), &project_id)
        .with_database(&project_id, &config.database);
    if let Some(url) = config.firestore_url.as_deref() {
        store = store.with_base_url(url);
    }
    let mut sender = FcmSender::new(client, tokens, &project_id);
    if let Some(url) = config.fcm_url.as_deref() {
        sender = sender.with_base_url(url, &project_id);
    }
    tracing::info!(project_id = %project_id, database = %config.database, "using firestore backend");
    Ok(WishlistNotifier::new(store, sender, TokioTimeProvider))
}

fn load_service_worker(config: &AppConfig) -> Result<Option<Arc<str>>, StartupError> {
    let Some(path) = config.web_config.as_deref() else {
        return Ok(None);
    };
    let web = WebConfig::load(path)?;
    Ok(Some(Arc::from(render_service_worker(&web)?)))
}

pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let service_worker = load_service_worker(&config)?;
    match Services::init(&config)? {
        Services::Firestore(notifier) => serve_with(config.bind, notifier, service_worker).await,
        Services::Memory(notifier) => serve_with(config.bind, notifier, service_worker).await,
    }
}

async fn serve_with<S, P, T>(
    addr: SocketAddr,
    notifier: WishlistNotifier<S, P, T>,
    service_worker: Option<Arc<str>>,
) -> Result<(), StartupError>
where
    S: ports::DocumentStore,
    P: ports::PushSender,
    T: ports::TimeProvider,
{
    let state = state::AppState {
        notifier: Arc::new(notifier),
        service_worker,
    };
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app::app(state))
        .await
        .map_err(StartupError::Serve)
}
