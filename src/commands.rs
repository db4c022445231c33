use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::warn;

use crate::auth;
use crate::config::Config;
use crate::filter::{resolve, ViewFilter};
use crate::gateway::{HttpGateway, TodoGateway};
use crate::manager::{Outcome, TaskManager};
use crate::models::{Credentials, Registration, Task};
use crate::session::{self, SessionStatus};
use crate::state::{LoadPhase, TaskList};
use crate::storage::SessionFile;

/// Builds the HTTP gateway, resuming the stored session if there is one.
pub fn build_gateway(cfg: &Config, session: &SessionFile) -> anyhow::Result<HttpGateway> {
    let gateway = HttpGateway::new(&cfg.api_url, cfg.request_timeout())
        .with_context(|| format!("failed to set up gateway client for {}", cfg.api_url))?;
    Ok(match session.load() {
        Some(cookie) => gateway.with_session(&cookie),
        None => gateway,
    })
}

fn store_session<G: TodoGateway>(gateway: &G, session: &SessionFile) {
    match gateway.session_cookie() {
        Some(cookie) => {
            if let Err(e) = session.save(&cookie) {
                warn!(path = %session.path().display(), error = %e, "failed to save session");
            }
        }
        None => warn!("gateway returned no session cookie; the session will not persist"),
    }
}

/// Logs in and stores the session cookie for later commands.
pub async fn cmd_login<G: TodoGateway>(
    gateway: &G,
    session: &SessionFile,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let credentials = Credentials { email, password };
    auth::login(gateway, &credentials).await?;
    store_session(gateway, session);
    println!("Logged in as {}.", credentials.email);
    Ok(())
}

pub async fn cmd_register<G: TodoGateway>(
    gateway: &G,
    name: String,
    email: String,
    password: String,
    confirm: String,
) -> anyhow::Result<()> {
    let registration = Registration { name, email, password };
    auth::register(gateway, &registration, &confirm).await?;
    println!("Account created. Run `todust login` to sign in.");
    Ok(())
}

/// Ends the session. The stored cookie is removed even if the gateway call fails.
pub async fn cmd_logout<G: TodoGateway>(
    manager: &TaskManager<G>,
    session: &SessionFile,
    yes: bool,
) -> anyhow::Result<Outcome> {
    let outcome = if yes {
        manager.logout(&|_: &str| true).await
    } else {
        manager.logout(&prompt_yes_no).await
    };
    match outcome {
        Outcome::Skipped => println!("Aborted."),
        _ => {
            session
                .clear()
                .with_context(|| format!("failed to remove session file {}", session.path().display()))?;
            println!("Logged out.");
        }
    }
    Ok(outcome)
}

pub async fn cmd_whoami<G: TodoGateway>(gateway: &G) -> anyhow::Result<SessionStatus> {
    let status = session::probe(gateway).await;
    match status {
        SessionStatus::Authenticated => println!("Logged in."),
        SessionStatus::Unauthenticated => println!("Not logged in."),
    }
    Ok(status)
}

/// Session guard for task commands: refuses to continue without a session,
/// then loads `view`.
async fn open_view<G: TodoGateway>(manager: &TaskManager<G>, view: ViewFilter) -> anyhow::Result<()> {
    if session::probe(manager.gateway()).await == SessionStatus::Unauthenticated {
        bail!("not logged in; run `todust login`");
    }
    manager.load(view).await;
    Ok(())
}

pub async fn cmd_list<G: TodoGateway>(manager: &TaskManager<G>, view: ViewFilter) -> anyhow::Result<()> {
    open_view(manager, view).await?;
    print_view(&manager.list());
    Ok(())
}

pub async fn cmd_add<G: TodoGateway>(
    manager: &TaskManager<G>,
    view: ViewFilter,
    text: String,
) -> anyhow::Result<Outcome> {
    open_view(manager, view).await?;
    if !resolve(view).shows_add {
        println!("Tasks cannot be added from the {view} view.");
        return Ok(Outcome::Skipped);
    }
    let outcome = manager.add(&text).await;
    match outcome {
        Outcome::Confirmed => println!("Task added."),
        Outcome::Skipped => println!("Nothing to add: the task text is empty."),
        _ => {}
    }
    print_view(&manager.list());
    Ok(outcome)
}

pub async fn cmd_toggle<G: TodoGateway>(
    manager: &TaskManager<G>,
    view: ViewFilter,
    id: String,
) -> anyhow::Result<Outcome> {
    open_view(manager, view).await?;
    let outcome = manager.toggle_complete(view, &id).await;
    match outcome {
        Outcome::Confirmed => println!("Task {id} toggled."),
        Outcome::Skipped if view == ViewFilter::Trash => println!("Tasks in the trash cannot be toggled."),
        Outcome::Skipped => println!("Task {id} not found in the {view} view."),
        _ => {}
    }
    print_view(&manager.list());
    Ok(outcome)
}

pub async fn cmd_edit<G: TodoGateway>(
    manager: &TaskManager<G>,
    view: ViewFilter,
    id: String,
    text: String,
) -> anyhow::Result<Outcome> {
    open_view(manager, view).await?;
    let outcome = manager.edit(&id, &text).await;
    match outcome {
        Outcome::Confirmed => println!("Task {id} updated."),
        Outcome::Skipped => println!("Nothing to change for task {id}."),
        _ => {}
    }
    print_view(&manager.list());
    Ok(outcome)
}

/// Soft-deletes, or permanently deletes when acting from the trash view.
pub async fn cmd_delete<G: TodoGateway>(
    manager: &TaskManager<G>,
    view: ViewFilter,
    id: String,
) -> anyhow::Result<Outcome> {
    open_view(manager, view).await?;
    let outcome = manager.delete(view, &id).await;
    if outcome == Outcome::Confirmed {
        if view == ViewFilter::Trash {
            println!("Task {id} permanently deleted.");
        } else {
            println!("Task {id} moved to trash.");
        }
    }
    print_view(&manager.list());
    Ok(outcome)
}

pub async fn cmd_restore<G: TodoGateway>(manager: &TaskManager<G>, id: String) -> anyhow::Result<Outcome> {
    open_view(manager, ViewFilter::Trash).await?;
    let outcome = manager.restore(ViewFilter::Trash, &id).await;
    if outcome == Outcome::Confirmed {
        println!("Task {id} restored.");
    }
    print_view(&manager.list());
    Ok(outcome)
}

fn print_view(list: &TaskList) {
    println!("{}", render_view(list));
}

/// Heading, summary line, and either the task table or the empty-state message.
pub fn render_view(list: &TaskList) -> String {
    let filter = list.filter();
    let spec = resolve(filter);
    let tasks = list.tasks();

    let mut out = format!("{}\n{}\n", spec.heading, filter.summary(tasks.len()));
    if list.phase() == LoadPhase::Loading {
        out.push_str("Loading your tasks...");
    } else if tasks.is_empty() {
        out.push_str(spec.empty_message);
    } else {
        out.push_str(&view_table(filter, tasks).to_string());
    }
    out
}

pub fn view_table(filter: ViewFilter, tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Added").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let (status, color) = if filter == ViewFilter::Trash {
            ("Deleted", Color::Grey)
        } else if t.completed {
            ("Done", Color::Green)
        } else {
            ("Pending", Color::Yellow)
        };
        let added = t
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.text),
            Cell::new(status).fg(color),
            Cell::new(added),
        ]);
    }
    table
}

/// Blocking `[y/N]` prompt on stdin. Anything but `y` declines.
pub fn prompt_yes_no(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}
