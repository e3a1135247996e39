//! PYQ bot entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Open the paper store and build the conversation engine
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run comms channels until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pyq_bot::subsystems::auth::AdminAllowList;
use pyq_bot::subsystems::comms;
use pyq_bot::subsystems::conversation::Engine;
use pyq_bot::subsystems::papers::SqlitePaperStore;
use pyq_bot::{config, error, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;

    // Without -i the console channel stays off (daemon-safe default).
    if !args.interactive {
        config.comms.pty.enabled = false;
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        bot_name = %config.bot_name,
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        interactive = %args.interactive,
        "config loaded"
    );

    let store = SqlitePaperStore::open(&config.db_path)?;
    info!(db = %store.db_path().display(), papers = store.count()?, "paper store ready");

    let admins = AdminAllowList::new(config.admin_ids.iter().cloned());
    if admins.is_empty() {
        warn!("no admin user ids configured, /admin is disabled");
    } else {
        info!(admins = admins.len(), "admin allow-list loaded");
    }

    let engine = Arc::new(Engine::new(Arc::new(store), Arc::new(admins)));

    let shutdown = CancellationToken::new();

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    print_startup_summary(&config, args.interactive);

    let channels = comms::start(&config, engine.clone(), shutdown.clone());
    channels.join().await?;

    // Channels may also end on EOF; make sure everything else stops.
    shutdown.cancel();
    info!(open_flows = engine.active_sessions(), "channels stopped");

    if args.interactive {
        use std::io::Write as _;
        println!("\nBye :) ...");
        let _ = std::io::stdout().flush();
    }

    Ok(())
}

fn print_startup_summary(config: &config::Config, interactive: bool) {
    let mode = if interactive { "interactive" } else { "daemon" };
    let on_off = |enabled: bool| if enabled { "enabled" } else { "disabled" };

    println!("┌─ {} ({mode}, pid {})", config.bot_name, std::process::id());
    println!("│  store:    {}", config.db_path.display());
    println!("│  admins:   {}", config.admin_ids.len());
    #[cfg(feature = "channel-pty")]
    println!("│  ⌨️  pty:      {}", on_off(config.comms_pty_should_load()));
    #[cfg(feature = "channel-telegram")]
    println!("│  ✈️  telegram: {}", on_off(config.comms_telegram_should_load()));
    println!("└─");
}

struct CliArgs {
    log_level: Option<&'static str>,
    interactive: bool,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: pyq-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -i, --interactive          Run in interactive mode (enables the console channel)");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    CliArgs { log_level: logger::level_for_verbosity(verbosity), interactive, config_path }
}
