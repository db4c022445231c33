//! # todust
//!
//! A terminal client for a remote to-do service. Log in once, then manage short
//! text tasks across four views: all, active, completed and trash.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! todust
//! # or explicitly
//! todust ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! *   `1`-`4` / `Tab`: Switch view
//! *   `a`: Focus the add box (`Enter` adds, `Esc` leaves)
//! *   `Space`: Toggle completed
//! *   `e` / `Enter`: Edit inline (`Enter` saves, `Esc` cancels, moving away saves)
//! *   `d`: Delete (permanent from Trash)
//! *   `r`: Restore (Trash only)
//! *   `L`: Logout
//! *   `q`: Quit
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! todust login --email me@example.com --password 'S3cret!pw'
//! todust add "buy milk"
//! todust list --view active
//! todust toggle <ID>
//! todust delete <ID>            # to trash
//! todust restore <ID>
//! todust delete <ID> --permanent
//! todust logout
//! ```
//!
//! ## Configuration
//!
//! `~/.config/todust/config.toml` (or `--config` / `TODUST_CONFIG`):
//!
//! ```toml
//! api_url = "http://127.0.0.1:4000"
//! add_policy = "refetch"   # or "append-when-visible"
//! ```
//!
//! `TODUST_API_URL` and `--api-url` override `api_url`. The session cookie is
//! kept in `~/.local/share/todust/session` unless `TODUST_SESSION` says otherwise.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tokio::task::LocalSet;

use todust::commands::*;
use todust::config::Config;
use todust::filter::ViewFilter;
use todust::logging;
use todust::manager::TaskManager;
use todust::storage::SessionFile;
use todust::tui::run_tui;

#[derive(Parser)]
#[command(name = "todust", version)]
#[command(about = "Terminal client for a remote to-do service", long_about = None)]
struct Cli {
    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Gateway base URL (overrides the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    quiet: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Repeat the password
        #[arg(short, long)]
        confirm: String,
    },
    /// End the session
    Logout {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Check whether the stored session is still valid
    Whoami,
    /// List tasks in a view (all, active, completed, trash)
    List {
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Add a new task
    Add {
        /// Task text (quoted if it has spaces)
        text: String,
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Flip a task between active and completed
    Toggle {
        id: String,
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Change a task's text
    Edit {
        id: String,
        text: String,
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Move a task to trash, or delete it for good from the trash view
    Delete {
        id: String,
        #[arg(long, default_value = "all")]
        view: String,
        /// Act from the trash view
        #[arg(long)]
        permanent: bool,
    },
    /// Bring a task back from trash
    Restore { id: String },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

fn view_arg(raw: &str) -> ViewFilter {
    let view = ViewFilter::parse(raw);
    if view.as_str() != raw.trim().to_ascii_lowercase() {
        tracing::warn!(requested = raw, "unknown view; showing all tasks");
    }
    view
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config,
        api_url,
        verbose,
        quiet,
        command,
    } = cli;

    if let Some(Commands::Completions { shell }) = &command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => anyhow::bail!("Unsupported shell: {shell}"),
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "todust", &mut io::stdout());
        return Ok(());
    }

    let is_tui = matches!(command, None | Some(Commands::Ui));
    let mut cfg = Config::load(config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = api_url {
        cfg.api_url = url;
    }

    // The TUI owns the terminal, so it logs to a file instead.
    let _log_guard = if is_tui {
        Some(logging::init_file_tracing(&cfg.log_dir(), verbose, quiet)?)
    } else {
        logging::init_tracing(verbose, quiet)?;
        None
    };
    tracing::debug!(api_url = %cfg.api_url, "configuration loaded");

    let session = SessionFile::resolve(&cfg);
    let gateway = build_gateway(&cfg, &session)?;
    let manager = TaskManager::new(gateway).with_add_policy(cfg.add_policy);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let local = LocalSet::new();

    local.block_on(&runtime, async move {
        match command {
            Some(Commands::Login { email, password }) => cmd_login(manager.gateway(), &session, email, password).await,
            Some(Commands::Register { name, email, password, confirm }) => {
                cmd_register(manager.gateway(), name, email, password, confirm).await
            }
            Some(Commands::Logout { yes }) => cmd_logout(&manager, &session, yes).await.map(drop),
            Some(Commands::Whoami) => cmd_whoami(manager.gateway()).await.map(drop),
            Some(Commands::List { view }) => cmd_list(&manager, view_arg(&view)).await,
            Some(Commands::Add { text, view }) => cmd_add(&manager, view_arg(&view), text).await.map(drop),
            Some(Commands::Toggle { id, view }) => cmd_toggle(&manager, view_arg(&view), id).await.map(drop),
            Some(Commands::Edit { id, text, view }) => cmd_edit(&manager, view_arg(&view), id, text).await.map(drop),
            Some(Commands::Delete { id, view, permanent }) => {
                let view = if permanent { ViewFilter::Trash } else { view_arg(&view) };
                cmd_delete(&manager, view, id).await.map(drop)
            }
            Some(Commands::Restore { id }) => cmd_restore(&manager, id).await.map(drop),
            Some(Commands::Completions { .. }) => Ok(()),
            Some(Commands::Ui) | None => run_tui(manager, Some(session)).await,
        }
    })
}
