//! SDG Portal CLI
//!
//! Chat with the SDG expert assistant, view activity analytics and run the
//! activity tracker.

use clap::{Parser, Subcommand};
use sdg_portal::{
    chat::Role, ActivityDashboard, ActivityTracker, ApiClient, ChannelSource, ChatPanel, Config,
    FileTokenStore, HttpSink, PageContext, TimeRange, VERSION,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Time given to in-flight logging calls before the process exits.
const FLUSH_GRACE: Duration = Duration::from_millis(500);

/// Page reported by the tracker while chatting from the terminal.
const CHAT_PAGE_URL: &str = "sdg-portal://chat";
const CHAT_PAGE_TITLE: &str = "SDG Expert Assistant";

#[derive(Parser)]
#[command(name = "sdg-portal")]
#[command(version = VERSION)]
#[command(about = "Client for the SDG information portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the SDG expert assistant
    Chat {
        /// Continue an existing chat session instead of opening a new one
        #[arg(long)]
        session: Option<String>,

        /// Do not report questions and page time to the activity log
        #[arg(long)]
        no_tracking: bool,
    },

    /// Show your activity analytics
    Dashboard {
        /// Time range: all, past day, past week, past month, past 6 months, past year
        #[arg(long, default_value = "all")]
        range: TimeRange,
    },

    /// Store the auth token used for activity logging and analytics
    Login {
        #[arg(long)]
        token: String,
    },

    /// Remove the stored auth token
    Logout,

    /// Receive browser interaction events and report them to the activity log
    #[cfg(feature = "server")]
    Track {
        /// Port for the local ingest server (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,

        /// Page shown until the browser reports one
        #[arg(long, default_value = "http://localhost/")]
        url: String,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load configuration, using defaults: {e}");
            Config::default()
        }
    };

    match cli.command {
        Commands::Chat {
            session,
            no_tracking,
        } => cmd_chat(&config, session, !no_tracking),
        Commands::Dashboard { range } => cmd_dashboard(&config, range),
        Commands::Login { token } => cmd_login(&config, &token),
        Commands::Logout => cmd_logout(&config),
        #[cfg(feature = "server")]
        Commands::Track { port, url } => cmd_track(&config, port, &url),
        Commands::Config => cmd_config(&config),
    }
}

fn build_runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Could not start async runtime: {e}");
            std::process::exit(1);
        }
    }
}

fn build_api(config: &Config) -> ApiClient {
    let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
    match ApiClient::from_config(config, tokens) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_chat(config: &Config, session: Option<String>, tracking: bool) {
    let runtime = build_runtime();
    let _guard = runtime.enter();
    let api = build_api(config);

    let mut panel = ChatPanel::new(api.clone());

    let tracker = if tracking {
        let source = Arc::new(ChannelSource::new(PageContext::new(
            CHAT_PAGE_URL,
            CHAT_PAGE_TITLE,
        )));
        let tracker = ActivityTracker::new(
            source,
            Arc::new(HttpSink::new(api)),
            config.tracker_config(),
        );
        match tracker.start() {
            Ok(()) => {
                panel = panel.with_tracker(tracker.clone());
                Some(tracker)
            }
            Err(e) => {
                eprintln!("Warning: Activity tracking disabled: {e}");
                None
            }
        }
    } else {
        None
    };

    println!("SDG Expert Assistant v{VERSION}");
    println!("Intelligent Q&A System Based on SDG Database");
    println!("Commands: /clear, /reload, /quit");
    println!();

    match session {
        Some(session_id) => {
            panel = panel.with_session(session_id);
            runtime.block_on(panel.reload_history());
        }
        None => runtime.block_on(panel.initialize()),
    }

    if let Some(error) = panel.error() {
        eprintln!("Error: {error}");
    }
    for message in panel.messages() {
        println!("{message}");
        println!();
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };

        let command = line.trim().to_string();
        match command.as_str() {
            "/quit" | "/exit" => break,
            "/clear" => {
                panel.clear();
                for message in panel.messages() {
                    println!("{message}");
                }
            }
            "/reload" => {
                runtime.block_on(panel.reload_history());
                for message in panel.messages() {
                    println!("{message}");
                    println!();
                }
            }
            _ => {
                panel.set_input(line);
                if !panel.can_send() {
                    continue;
                }
                let before = panel.messages().len();
                println!("Thinking...");
                runtime.block_on(panel.send_message());

                for message in panel.messages()[before..]
                    .iter()
                    .filter(|m| m.role != Role::User)
                {
                    println!("{message}");
                }
                if panel.database_used() {
                    println!("  [Database Info]");
                }
                if let Some(error) = panel.error() {
                    eprintln!("Error: {error}");
                }
                println!();
            }
        }
    }

    if let Some(tracker) = tracker {
        tracker.stop();
        tracing::debug!("{}", tracker.summary());
        runtime.block_on(tokio::time::sleep(FLUSH_GRACE));
    }
}

fn cmd_dashboard(config: &Config, range: TimeRange) {
    let runtime = build_runtime();
    let mut dashboard = ActivityDashboard::new(build_api(config));

    runtime.block_on(dashboard.set_time_range(range));
    println!("{}", dashboard.render());
}

fn cmd_login(config: &Config, token: &str) {
    let store = FileTokenStore::new(config.token_path.clone());
    match store.save(token) {
        Ok(()) => println!("Token stored in {:?}", store.path()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_logout(config: &Config) {
    let store = FileTokenStore::new(config.token_path.clone());
    match store.clear() {
        Ok(()) => println!("Logged out."),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "server")]
fn cmd_track(config: &Config, port: Option<u16>, url: &str) {
    use sdg_portal::server::{run, ServerConfig, ServerState};

    let runtime = build_runtime();
    let _guard = runtime.enter();
    let api = build_api(config);

    if !api.has_token() {
        eprintln!("Warning: No auth token stored; logging calls will be unauthenticated.");
        eprintln!("Run `sdg-portal login --token <TOKEN>` to store one.");
    }

    let source = Arc::new(ChannelSource::new(PageContext::new(url, "")));
    let host = source.handle();
    let tracker = ActivityTracker::new(
        source,
        Arc::new(HttpSink::new(api)),
        config.tracker_config(),
    );
    if let Err(e) = tracker.start() {
        eprintln!("Error starting tracker: {e}");
        std::process::exit(1);
    }

    let server_config = ServerConfig::new(port.unwrap_or(config.ingest_port));
    let state = ServerState::new(host, tracker.clone());
    let (addr, shutdown_tx) = match runtime.block_on(run(server_config, state)) {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting ingest server: {e}");
            std::process::exit(1);
        }
    };

    println!("SDG Portal activity tracker v{VERSION}");
    println!("  Session ID: {}", tracker.session_id());
    println!("  Ingest endpoint: http://{addr}/events");
    println!();
    println!("Press Ctrl+C to stop");

    let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    ctrlc_handler(stop_tx);
    runtime.block_on(stop_rx.recv());

    println!();
    println!("Stopping...");
    tracker.stop();
    let _ = shutdown_tx.send(());
    runtime.block_on(tokio::time::sleep(FLUSH_GRACE));
    println!("{}", tracker.summary());
}

fn cmd_config(config: &Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
#[cfg(feature = "server")]
fn ctrlc_handler(stop: tokio::sync::mpsc::UnboundedSender<()>) {
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop.send(());
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
