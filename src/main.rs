//! todo-sync Entry Point
//!
//! Startup order: logger, configuration, persistence check, initial load,
//! then the requested command.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;

use rolling_logger::{Level, LoggerConfig};
use todo_sync::bootstrap::{connect_db, PersistenceConfig, TcpConnector};
use todo_sync::cli::{Cli, Commands};
use todo_sync::notify::ConsoleNotifier;
use todo_sync::{
    ClientConfig, HttpTodoEndpoint, TodoCollection, TodoEndpoint, TodoId, TodoStore,
    ToggleOutcome, ToggleSynchronizer,
};

const APP_NAME: &str = "TodoSync";

/// Exit status when at least one toggle did not apply
const TOGGLE_INCOMPLETE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger = LoggerConfig::new(APP_NAME);
    logger.stderr = cli.verbose;
    if let Err(e) = rolling_logger::init_logger_with(&cli.log_dir, logger) {
        eprintln!("[{}] Logger unavailable: {}", timestamp(), e);
    }

    let config = match ClientConfig::from_env().and_then(|config| cli.apply(config)) {
        Ok(config) => config,
        Err(e) => return fatal(&format!("Invalid configuration: {}", e), cli.verbose),
    };
    let persistence = match PersistenceConfig::from_env() {
        Ok(persistence) => persistence,
        Err(e) => return fatal(&format!("Invalid configuration: {}", e), cli.verbose),
    };
    log::info!(
        "backend={} timeout={:?} policy={}",
        config.backend_url,
        config.request_timeout,
        config.policy.as_str()
    );

    match connect_db(&persistence, &TcpConnector).await {
        Ok(db) => {
            let _ = rolling_logger::info(&format!("Persistence ready at {}", db.address()));
        }
        Err(e) => return fatal(&format!("Startup aborted: {}", e), cli.verbose),
    }

    let endpoint: Arc<dyn TodoEndpoint> =
        match HttpTodoEndpoint::new(&config.backend_url, config.request_timeout) {
            Ok(endpoint) => Arc::new(endpoint),
            Err(e) => return fatal(&format!("Failed to build HTTP client: {}", e), cli.verbose),
        };

    let todos = match endpoint.list_todos().await {
        Ok(todos) => todos,
        Err(e) => return fatal(&format!("Failed to load todos: {}", e), cli.verbose),
    };
    let _ = rolling_logger::info(&format!("Loaded {} todos", todos.len()));

    let store = Arc::new(TodoStore::new(TodoCollection::from_items(todos)));
    let sync = Arc::new(ToggleSynchronizer::from_config(
        endpoint,
        Arc::new(ConsoleNotifier),
        &config,
    ));

    let all_applied = match &cli.command {
        Commands::List => true,
        Commands::Toggle { ids } => toggle_all(&sync, &store, ids).await,
    };
    let status = if all_applied {
        ExitCode::SUCCESS
    } else {
        if !cli.verbose {
            dump_warnings();
        }
        ExitCode::from(TOGGLE_INCOMPLETE)
    };

    print_todos(&store.snapshot(), cli.json);
    status
}

/// Toggle every id concurrently against the session store.
/// Returns whether every toggle was applied.
async fn toggle_all(sync: &Arc<ToggleSynchronizer>, store: &Arc<TodoStore>, ids: &[String]) -> bool {
    let snapshot = store.snapshot();
    let mut tasks = JoinSet::new();
    let mut all_applied = true;

    for id in ids {
        let id = TodoId::new(id.as_str());
        let Some(item) = snapshot.get(&id).cloned() else {
            let _ = rolling_logger::warn(&format!("todo {} not found", id));
            all_applied = false;
            continue;
        };
        let sync = Arc::clone(sync);
        let store = Arc::clone(store);
        tasks.spawn(async move { sync.toggle_in(&item, &store).await });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(ToggleOutcome::Reconciled { .. }) => {}
            Ok(outcome) => {
                let _ = rolling_logger::warn(&format!("toggle not applied: {:?}", outcome));
                all_applied = false;
            }
            Err(e) => {
                let _ = rolling_logger::error(&format!("toggle task failed: {}", e));
                all_applied = false;
            }
        }
    }

    all_applied
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Log a fatal startup error and give the failure exit status
fn fatal(message: &str, verbose: bool) -> ExitCode {
    if rolling_logger::error(message).is_err() {
        eprintln!("[{}] {}", timestamp(), message);
    } else if !verbose {
        dump_warnings();
    }
    ExitCode::FAILURE
}

/// Without `--verbose` nothing reaches stderr, so replay what went wrong
fn dump_warnings() {
    for entry in rolling_logger::recent_logs_at(Level::WARN) {
        eprintln!("{}", entry);
    }
}

fn print_todos(collection: &TodoCollection, json: bool) {
    if json {
        match serde_json::to_string_pretty(&collection.to_vec()) {
            Ok(out) => println!("{}", out),
            Err(e) => log::error!("Failed to encode todos: {}", e),
        }
        return;
    }

    for item in collection.iter() {
        let mark = if item.is_completed { "x" } else { " " };
        println!("[{}] {}  ({})", mark, item.title().unwrap_or("<untitled>"), item.id);
    }
}
