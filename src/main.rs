//! Modstacker - command-line front end.
//!
//! # Execution Flow
//!
//! 1. Load (or create) `settings.yaml` from the user configuration directory
//! 2. Initialize logging → `<config dir>/logs/modstacker.<date>`
//! 3. Discover stacks on a tokio blocking worker (archive loading is slow)
//! 4. Run one command against the registry
//!
//! # Commands
//!
//! ```text
//! modstacker list
//! modstacker show <stack> [page]
//! modstacker enable <stack>
//! modstacker disable
//! modstacker add <stack> <archive.zip>
//! modstacker update <stack> <archive.zip>
//! modstacker remove <stack> <archive name>
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modstacker::logging::{self, LogOptions};
use modstacker::services::{DEFAULT_PAGE_SIZE, LoadReport};
use modstacker::{APP_NAME, AppContext, ConfigManager, ModDetails, StackRegistry, VERSION};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "modstacker")]
#[command(version = VERSION)]
#[command(about = "Switch between stacks of Farming Simulator mods", long_about = None)]
struct Args {
    /// Debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Also log to the terminal
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stacks (* marks the enabled one)
    List,
    /// List the mods of a stack
    Show {
        stack: String,
        /// Zero-based page number
        #[arg(default_value_t = 0)]
        page: usize,
    },
    /// Link a stack as the game's mod folder
    Enable { stack: String },
    /// Remove the game mod folder link
    Disable,
    /// Copy a mod archive into a stack
    Add { stack: String, archive: String },
    /// Replace a mod archive in a stack
    Update { stack: String, archive: String },
    /// Delete a mod archive from a stack
    Remove { stack: String, name: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = ConfigManager::in_default_location()?;
    let settings = config_manager.load_or_init_settings()?;

    let _log_guard = logging::setup_logging(&LogOptions {
        log_dir: config_manager.config_dir().join("logs"),
        log_prefix: APP_NAME.to_string(),
        debug_mode: args.debug,
        console_output: args.verbose,
    })?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let core = settings.resolve().with_context(|| {
        format!(
            "Set stack_folder in {} first",
            config_manager.settings_path()
        )
    })?;
    let ctx = Arc::new(AppContext::new(core));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("modstacker-worker")
        .build()?;

    let mut registry = runtime.block_on(async move {
        tokio::task::spawn_blocking(move || StackRegistry::load(ctx))
            .await
            .context("Stack loading worker panicked")
    })??;

    let result = run(args.command, &mut registry);

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Shutdown complete");

    result.inspect_err(|e| tracing::error!("{:#}", e))
}

fn run(command: Command, registry: &mut StackRegistry) -> Result<()> {
    match command {
        Command::List => {
            let active = registry.active_stack_name().map(str::to_string);
            for stack in registry.stacks() {
                let marker = if Some(stack.name()) == active.as_deref() { "*" } else { " " };
                println!("{marker} {} ({} mods)", stack.name(), stack.len());
            }
        }
        Command::Show { stack, page } => {
            let stack = registry.get_stack(&stack)?;
            let pages = stack.page_count(DEFAULT_PAGE_SIZE).max(1);
            println!("{} - page {}/{}", stack.name(), page.saturating_add(1), pages);
            for (i, loaded) in stack.page(page, DEFAULT_PAGE_SIZE).into_iter().enumerate() {
                println!(
                    "{:>4}. {} v{} by {}{}",
                    entry_number(page, i),
                    loaded.title().trim(),
                    loaded.version(),
                    loaded.author(),
                    if loaded.supports_multiplayer() { " [MP]" } else { "" }
                );
                println!("      {} (icon: {})", loaded.file_name(), loaded.icon_cache_path());
            }
        }
        Command::Enable { stack } => {
            registry.enable(&stack)?;
            println!("Enabled {stack}");
        }
        Command::Disable => {
            registry.disable()?;
            println!("Disabled current mod stack");
        }
        Command::Add { stack, archive } => {
            let report = registry
                .get_stack_mut(&stack)?
                .add_mod(archive.as_str())
                .with_context(|| format!("Failed to add {archive} to {stack}"))?;
            print_report(&report);
        }
        Command::Update { stack, archive } => {
            let report = registry
                .get_stack_mut(&stack)?
                .update_mod(archive.as_str())
                .with_context(|| format!("Failed to update {archive} in {stack}"))?;
            print_report(&report);
        }
        Command::Remove { stack, name } => {
            let report = registry
                .get_stack_mut(&stack)?
                .remove_mod(&name)
                .with_context(|| format!("Failed to remove {name} from {stack}"))?;
            print_report(&report);
        }
    }
    Ok(())
}

/// One-based position of the `index`th mod on `page`.
fn entry_number(page: usize, index: usize) -> usize {
    page.saturating_mul(DEFAULT_PAGE_SIZE)
        .saturating_add(index.saturating_add(1))
}

fn print_report(report: &LoadReport) {
    for name in &report.loaded {
        println!("loaded  {name}");
    }
    for name in &report.removed {
        println!("removed {name}");
    }
    for name in &report.failed {
        println!("failed  {name} (see log)");
    }
}
