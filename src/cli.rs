use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use wishlist_notifier::config::{AppConfig, Backend, DEFAULT_DATABASE, FirestoreConfig, WebConfig};

pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Handle(AppConfig, PathBuf),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::ServiceWorker(args)) = cli.command.as_ref() {
        let code = run_service_worker(args);
        return RunOutcome::Exit(code);
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    match cli.command {
        Some(Command::Handle(args)) => RunOutcome::Handle(config, args.event),
        _ => RunOutcome::Serve(config),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "wishlist-notifier",
    version,
    about = "Notifies wishlist owners when a matching book listing is created"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "WISHLIST_NOTIFIER_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    #[arg(long, env = "WISHLIST_NOTIFIER_BACKEND", value_enum, default_value_t = BackendKind::Firestore)]
    backend: BackendKind,
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,
    #[arg(long, env = "WISHLIST_NOTIFIER_PROJECT_ID")]
    project_id: Option<String>,
    #[arg(long, env = "WISHLIST_NOTIFIER_DATABASE")]
    database: Option<String>,
    #[arg(long, env = "WISHLIST_NOTIFIER_FIRESTORE_URL")]
    firestore_url: Option<String>,
    #[arg(long, env = "WISHLIST_NOTIFIER_FCM_URL")]
    fcm_url: Option<String>,
    #[arg(long, env = "WISHLIST_NOTIFIER_SEED")]
    seed: Option<PathBuf>,
    #[arg(long, env = "WISHLIST_NOTIFIER_WEB_CONFIG")]
    web_config: Option<PathBuf>,
    #[arg(long, env = "WISHLIST_NOTIFIER_SKIP_NOTIFIED")]
    skip_notified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Firestore,
    Memory,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one created-listing event read from a JSON file and exit.
    Handle(HandleArgs),
    /// Print the background push worker script.
    ServiceWorker(ServiceWorkerArgs),
}

#[derive(Args, Debug)]
struct HandleArgs {
    event: PathBuf,
}

#[derive(Args, Debug)]
struct ServiceWorkerArgs {
    #[arg(long)]
    web_config: PathBuf,
}

fn run_service_worker(args: &ServiceWorkerArgs) -> i32 {
    let web = match WebConfig::load(&args.web_config) {
        Ok(web) => web,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    match wishlist_notifier::render_service_worker(&web) {
        Ok(script) => {
            print!("{script}");
            0
        }
        Err(err) => {
            eprintln!("failed to render service worker: {err}");
            1
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    Ok(AppConfig {
        bind: cli.bind,
        backend: resolve_backend(cli)?,
        skip_notified: cli.skip_notified,
        web_config: cli.web_config.clone(),
    })
}

fn resolve_backend(cli: &Cli) -> Result<Backend, String> {
    match cli.backend {
        BackendKind::Memory => {
            if cli.credentials.is_some() || cli.firestore_url.is_some() || cli.fcm_url.is_some() {
                tracing::warn!("firestore options are ignored with the memory backend");
            }
            Ok(Backend::Memory {
                seed: cli.seed.clone(),
            })
        }
        BackendKind::Firestore => {
            if cli.seed.is_some() {
                return Err("--seed requires --backend memory".to_string());
            }
            let credentials = cli
                .credentials
                .clone()
                .ok_or("the firestore backend requires --credentials or GOOGLE_APPLICATION_CREDENTIALS")?;
            if let Some(project_id) = cli.project_id.as_deref()
                && project_id.trim().is_empty()
            {
                return Err("project id cannot be empty".to_string());
            }
            let database = match cli.database.as_deref().map(str::trim) {
                Some("") => return Err("database id cannot be empty".to_string()),
                Some(database) => database.to_string(),
                None => DEFAULT_DATABASE.to_string(),
            };
            Ok(Backend::Firestore(FirestoreConfig {
                credentials,
                project_id: cli.project_id.as_deref().map(|id| id.trim().to_string()),
                database,
                firestore_url: cli.firestore_url.clone(),
                fcm_url: cli.fcm_url.clone(),
            }))
        }
    }
}
