mod common;

use common::{texts, MemoryGateway};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::LocalSet;
use todust::filter::ViewFilter;
use todust::manager::TaskManager;
use todust::storage::SessionFile;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use todust::tui::app::{App, AppEvent, InputMode, Screen};
use todust::tui::ui::ui;

type TestApp = App<MemoryGateway>;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut TestApp, text: &str) {
    for c in text.chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
}

/// Lets spawned work finish and feeds its events back into the app.
async fn settle(app: &mut TestApp, events: &mut UnboundedReceiver<AppEvent>) {
    for _ in 0..5 {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }
    }
}

fn seeded() -> MemoryGateway {
    MemoryGateway::new()
        .with_task("write report", false)
        .with_task("call mom", true)
}

#[tokio::test]
async fn test_start_with_session_shows_all_tasks() {
    LocalSet::new()
        .run_until(async {
            let (mut app, mut events) = App::new(TaskManager::new(seeded()), None);
            app.start();
            assert_eq!(app.screen, Screen::Checking);

            settle(&mut app, &mut events).await;
            assert_eq!(app.screen, Screen::Tasks);
            assert_eq!(texts(&app.tasks()), ["write report", "call mom"]);
            assert_eq!(app.state.selected(), Some(0));
        })
        .await;
}

#[tokio::test]
async fn test_login_flow() {
    LocalSet::new()
        .run_until(async {
            let gw = MemoryGateway::logged_out().with_task("write report", false);
            let (mut app, mut events) = App::new(TaskManager::new(gw), None);
            app.start();
            settle(&mut app, &mut events).await;
            assert_eq!(app.screen, Screen::Login);

            type_text(&mut app, "me@example.com");
            app.handle_key(key(KeyCode::Tab));
            type_text(&mut app, "Wrong#Pass1");
            app.handle_key(key(KeyCode::Enter));
            settle(&mut app, &mut events).await;
            assert_eq!(app.screen, Screen::Login);
            assert_eq!(app.login.error.as_deref(), Some("Invalid credentials"));

            for _ in 0.."Wrong#Pass1".len() {
                app.handle_key(key(KeyCode::Backspace));
            }
            type_text(&mut app, "Right#Pass1");
            app.handle_key(key(KeyCode::Enter));
            settle(&mut app, &mut events).await;
            assert_eq!(app.screen, Screen::Tasks);
            assert_eq!(texts(&app.tasks()), ["write report"]);
        })
        .await;
}

#[tokio::test]
async fn test_add_clears_box_after_confirmation() {
    LocalSet::new()
        .run_until(async {
            let (mut app, mut events) = App::new(TaskManager::new(seeded()), None);
            app.start();
            settle(&mut app, &mut events).await;

            app.handle_key(key(KeyCode::Char('a')));
            assert_eq!(app.input_mode, InputMode::Adding);
            type_text(&mut app, "buy milk");
            app.handle_key(key(KeyCode::Enter));
            assert!(app.adding);

            settle(&mut app, &mut events).await;
            assert!(!app.adding);
            assert!(app.add_buffer.is_empty());
            assert_eq!(texts(&app.tasks()), ["write report", "call mom", "buy milk"]);
        })
        .await;
}

#[tokio::test]
async fn test_failed_add_keeps_text() {
    LocalSet::new()
        .run_until(async {
            let gw = seeded();
            gw.fail("create");
            let (mut app, mut events) = App::new(TaskManager::new(gw), None);
            app.start();
            settle(&mut app, &mut events).await;

            app.handle_key(key(KeyCode::Char('a')));
            type_text(&mut app, "buy milk");
            app.handle_key(key(KeyCode::Enter));
            settle(&mut app, &mut events).await;

            assert_eq!(app.add_buffer, "buy milk");
            assert!(!app.adding);
        })
        .await;
}

#[tokio::test]
async fn test_moving_away_commits_edit_and_escape_discards() {
    LocalSet::new()
        .run_until(async {
            let (mut app, mut events) = App::new(TaskManager::new(seeded()), None);
            app.start();
            settle(&mut app, &mut events).await;

            app.handle_key(key(KeyCode::Char('e')));
            assert_eq!(app.input_mode, InputMode::Editing);
            type_text(&mut app, " now");
            app.handle_key(key(KeyCode::Down));
            settle(&mut app, &mut events).await;
            assert_eq!(texts(&app.tasks())[0], "write report now");
            assert_eq!(app.state.selected(), Some(1));

            app.handle_key(key(KeyCode::Char('e')));
            type_text(&mut app, "!!!");
            app.handle_key(key(KeyCode::Esc));
            settle(&mut app, &mut events).await;
            assert_eq!(app.input_mode, InputMode::Normal);
            assert_eq!(texts(&app.tasks())[1], "call mom");
            assert_eq!(app.manager.gateway().count("update"), 1);
        })
        .await;
}

#[tokio::test]
async fn test_trash_view_has_no_add_box() {
    LocalSet::new()
        .run_until(async {
            let (mut app, mut events) = App::new(TaskManager::new(seeded()), None);
            app.start();
            settle(&mut app, &mut events).await;

            app.handle_key(key(KeyCode::Char('d')));
            settle(&mut app, &mut events).await;
            assert_eq!(texts(&app.tasks()), ["call mom"]);

            app.handle_key(key(KeyCode::Char('4')));
            settle(&mut app, &mut events).await;
            assert_eq!(app.filter(), ViewFilter::Trash);
            assert_eq!(texts(&app.tasks()), ["write report"]);

            app.handle_key(key(KeyCode::Char('a')));
            assert_eq!(app.input_mode, InputMode::Normal);

            app.handle_key(key(KeyCode::Char('r')));
            settle(&mut app, &mut events).await;
            assert!(app.tasks().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_keys_typed_ahead_of_a_view_switch_do_not_hit_the_new_view() {
    LocalSet::new()
        .run_until(async {
            let gw = MemoryGateway::new().with_task("keep me", false);
            let (mut app, mut events) = App::new(TaskManager::new(gw), None);
            app.start();
            settle(&mut app, &mut events).await;

            // Trash is requested but its load has not started yet; the rows on
            // screen still belong to the all view.
            app.handle_key(key(KeyCode::Char('4')));
            app.sync_selection();
            app.handle_key(key(KeyCode::Char('d')));
            app.handle_key(key(KeyCode::Char(' ')));
            app.handle_key(key(KeyCode::Char('r')));
            settle(&mut app, &mut events).await;

            let gateway = app.manager.gateway();
            assert_eq!(gateway.count("delete_permanent"), 0);
            assert_eq!(gateway.count("soft_delete"), 0);
            assert_eq!(gateway.count("update"), 0);
            assert_eq!(gateway.count("restore"), 0);
            assert_eq!(app.filter(), ViewFilter::Trash);

            app.handle_key(key(KeyCode::Char('1')));
            settle(&mut app, &mut events).await;
            assert_eq!(texts(&app.tasks()), ["keep me"]);
        })
        .await;
}

#[tokio::test]
async fn test_trash_rows_cannot_be_toggled() {
    LocalSet::new()
        .run_until(async {
            let gw = MemoryGateway::new().with_deleted("old idea", false);
            let (mut app, mut events) = App::new(TaskManager::new(gw), None);
            app.start();
            settle(&mut app, &mut events).await;

            app.handle_key(key(KeyCode::Char('4')));
            settle(&mut app, &mut events).await;
            app.handle_key(key(KeyCode::Char(' ')));
            settle(&mut app, &mut events).await;
            assert_eq!(app.manager.gateway().count("update"), 0);
        })
        .await;
}

#[tokio::test]
async fn test_logout_needs_confirmation_and_clears_session() {
    LocalSet::new()
        .run_until(async {
            let dir = tempfile::tempdir().unwrap();
            let session = SessionFile::at(dir.path().join("session"));
            session.save("sid=abc").unwrap();

            let (mut app, mut events) = App::new(TaskManager::new(seeded()), Some(session.clone()));
            app.start();
            settle(&mut app, &mut events).await;

            app.handle_key(key(KeyCode::Char('L')));
            assert_eq!(app.input_mode, InputMode::ConfirmLogout);
            app.handle_key(key(KeyCode::Char('n')));
            settle(&mut app, &mut events).await;
            assert_eq!(app.screen, Screen::Tasks);
            assert_eq!(app.manager.gateway().count("logout"), 0);

            app.handle_key(key(KeyCode::Char('L')));
            app.handle_key(key(KeyCode::Char('y')));
            settle(&mut app, &mut events).await;
            assert_eq!(app.screen, Screen::Login);
            assert!(app.tasks().is_empty());
            assert_eq!(session.load(), None);
        })
        .await;
}

fn screen_text(app: &mut TestApp) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|f| ui(f, app)).unwrap();
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

#[tokio::test]
async fn test_render_heading_and_empty_state() {
    LocalSet::new()
        .run_until(async {
            let (mut app, mut events) = App::new(TaskManager::new(seeded()), None);
            app.start();
            settle(&mut app, &mut events).await;

            let text = screen_text(&mut app);
            assert!(text.contains("My Tasks"));
            assert!(text.contains("write report"));

            app.handle_key(key(KeyCode::Char('4')));
            settle(&mut app, &mut events).await;
            let text = screen_text(&mut app);
            assert!(text.contains("Trash"));
            assert!(text.contains("No deleted tasks"));
        })
        .await;
}
