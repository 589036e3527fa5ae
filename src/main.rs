use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod dumps;
mod error;
mod profile;
mod prompt;
mod settings;
mod tooling;
mod ui;
mod utils;

use profile::ProfileStore;
use prompt::{Prompter, TermPrompter};
use settings::Settings;
use utils::process::{ProcessRunner, Runner};

pub struct AppCtx<'a> {
    pub store: ProfileStore,
    pub settings: Settings,
    pub runner: &'a dyn Runner,
    pub prompter: &'a dyn Prompter,
}

#[derive(Parser, Debug)]
#[command(
    name = "jdump",
    about = "Interactive dump/restore/clean helper for MySQL and PostgreSQL profiles",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Profile document (default: config.yml next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tool settings (default: settings.toml next to the executable)
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    debug: bool,

    /// Log every command instead of running it
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    check_config: bool,

    #[arg(long)]
    print_config: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .without_time()
        .try_init();
}

fn beside_exe(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join(name)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let store = ProfileStore::new(cli.config.unwrap_or_else(|| beside_exe("config.yml")));
    let settings_path = cli.settings.unwrap_or_else(|| beside_exe("settings.toml"));
    let settings = Settings::load(&settings_path)?;

    if cli.check_config || cli.print_config {
        let doc = store.load()?;
        if cli.check_config {
            tracing::info!(
                "config OK ({} configurations, {})",
                doc.profiles().len(),
                store.path().display()
            );
        }
        if cli.print_config {
            println!("{}", doc.to_redacted_yaml()?);
            println!("# {}", settings_path.display());
            println!("{}", settings.to_toml()?);
        }
        return Ok(());
    }

    let runner = ProcessRunner::new(settings.tools.clone(), cli.dry_run);
    let prompter = TermPrompter::new();
    let ctx = AppCtx {
        store,
        settings,
        runner: &runner,
        prompter: &prompter,
    };

    commands::menu::run(&ctx)
}
