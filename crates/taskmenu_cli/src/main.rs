mod app;
mod cli;
mod menu;
mod render;

use app::App;
use clap::Parser;
use cli::Cli;
use taskmenu_core::config::{load_config_with_fallback, merge_overrides};
use taskmenu_core::error::AppError;
use taskmenu_core::storage::json_store;
use taskmenu_core::task_service::TaskService;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKMENU_LOG";

fn install_tracing() {
    // TASKMENU_LOG wins over RUST_LOG; logs go to stderr so menus stay readable.
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn run(cli: Cli) -> Result<(), AppError> {
    let overrides = cli::collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: ignoring config: {err}");
    }
    let config = merge_overrides(&loaded.config, &overrides);

    let path = json_store::store_path(config.store_path.as_deref())?;
    debug!(path = %path.display(), "opening task store");
    let mut app = App::new(TaskService::open(path), config, cli.json);

    match cli.command {
        Some(command) => app.run_command(command),
        None => menu::run(&mut app),
    }
}

fn main() {
    install_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
