use std::future::Future;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::auth;
use crate::edit::{EditCommit, EditSession};
use crate::filter::{resolve, ViewFilter};
use crate::gateway::TodoGateway;
use crate::manager::{Outcome, TaskManager};
use crate::models::{Credentials, Task};
use crate::session::{self, SessionStatus};
use crate::storage::SessionFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for the first session probe.
    Checking,
    Login,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding,
    Editing,
    ConfirmLogout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

/// Results of spawned gateway work, delivered back to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SessionChecked(SessionStatus),
    LoggedIn,
    LoginFailed(String),
    TaskAdded,
    AddFinished,
    LoggedOut,
    /// Some view state changed; redraw.
    Refreshed,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub field: LoginField,
    pub error: Option<String>,
    pub pending: bool,
}

impl LoginForm {
    fn field_mut(&mut self) -> &mut String {
        match self.field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }
}

pub struct App<G> {
    pub manager: Rc<TaskManager<G>>,
    session_file: Option<SessionFile>,
    tx: UnboundedSender<AppEvent>,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub login: LoginForm,
    /// Text of the add box. Cleared only once the gateway confirms the create.
    pub add_buffer: String,
    /// A create is in flight; the add box is disabled meanwhile.
    pub adding: bool,
    pub edit: EditSession,
    /// View most recently switched to, until its load has started.
    pending_view: Option<ViewFilter>,
    pub state: TableState,
    pub should_quit: bool,
}

impl<G: TodoGateway + 'static> App<G> {
    /// Creates the app and the receiver its spawned work reports to.
    pub fn new(manager: TaskManager<G>, session_file: Option<SessionFile>) -> (App<G>, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let app = App {
            manager: Rc::new(manager),
            session_file,
            tx,
            screen: Screen::Checking,
            input_mode: InputMode::Normal,
            login: LoginForm::default(),
            add_buffer: String::new(),
            adding: false,
            edit: EditSession::new(),
            pending_view: None,
            state: TableState::default(),
            should_quit: false,
        };
        (app, rx)
    }

    /// Runs `work` on the local task set. Must be called inside a `LocalSet`.
    fn spawn<F, Fut>(&self, work: F)
    where
        F: FnOnce(Rc<TaskManager<G>>, UnboundedSender<AppEvent>) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        let fut = work(self.manager.clone(), self.tx.clone());
        tokio::task::spawn_local(fut);
    }

    /// Probes the session and loads the initial view.
    pub fn start(&mut self) {
        self.screen = Screen::Checking;
        self.spawn(|manager, tx| async move {
            let status = session::enter(&manager).await;
            let _ = tx.send(AppEvent::SessionChecked(status));
        });
    }

    pub fn filter(&self) -> ViewFilter {
        self.manager.filter()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.manager.tasks()
    }

    pub fn selected_task(&self) -> Option<Task> {
        let i = self.state.selected()?;
        self.manager.list().tasks().get(i).cloned()
    }

    /// Keeps the selection inside the current collection.
    pub fn sync_selection(&mut self) {
        let len = self.manager.list().tasks().len();
        if len == 0 {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= len {
                self.state.select(Some(len - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Selects the next task.
    pub fn next(&mut self) {
        let len = self.manager.list().tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task.
    pub fn previous(&mut self) {
        let len = self.manager.list().tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionChecked(SessionStatus::Authenticated) => self.screen = Screen::Tasks,
            AppEvent::SessionChecked(SessionStatus::Unauthenticated) => self.screen = Screen::Login,
            AppEvent::LoggedIn => {
                self.login = LoginForm::default();
                self.pending_view = None;
                self.screen = Screen::Tasks;
                self.state.select(None);
                self.spawn(|manager, tx| async move {
                    manager.load(ViewFilter::All).await;
                    let _ = tx.send(AppEvent::Refreshed);
                });
            }
            AppEvent::LoginFailed(message) => {
                self.login.pending = false;
                self.login.error = Some(message);
            }
            AppEvent::TaskAdded => self.add_buffer.clear(),
            AppEvent::AddFinished => self.adding = false,
            AppEvent::LoggedOut => {
                if let Some(file) = &self.session_file {
                    if let Err(e) = file.clear() {
                        warn!(error = %e, "failed to remove session file");
                    }
                }
                self.edit.cancel();
                self.pending_view = None;
                self.add_buffer.clear();
                self.input_mode = InputMode::Normal;
                self.state.select(None);
                self.screen = Screen::Login;
            }
            AppEvent::Refreshed => {}
        }
        self.sync_selection();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Checking => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.should_quit = true;
                }
            }
            Screen::Login => self.handle_login_key(key),
            Screen::Tasks => match self.input_mode {
                InputMode::Normal => self.handle_normal_key(key),
                InputMode::Adding => self.handle_adding_key(key),
                InputMode::Editing => self.handle_editing_key(key),
                InputMode::ConfirmLogout => self.handle_confirm_key(key),
            },
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.field = match self.login.field {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => {
                self.login.field_mut().pop();
                self.login.error = None;
            }
            KeyCode::Char(c) => {
                self.login.field_mut().push(c);
                self.login.error = None;
            }
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        if self.login.pending {
            return;
        }
        self.login.pending = true;
        self.login.error = None;
        let credentials = Credentials {
            email: self.login.email.trim().to_string(),
            password: self.login.password.clone(),
        };
        let session_file = self.session_file.clone();
        self.spawn(move |manager, tx| async move {
            let event = match auth::login(manager.gateway(), &credentials).await {
                Ok(()) => {
                    if let (Some(file), Some(cookie)) = (session_file, manager.gateway().session_cookie()) {
                        if let Err(e) = file.save(&cookie) {
                            warn!(error = %e, "failed to save session");
                        }
                    }
                    AppEvent::LoggedIn
                }
                Err(e) => AppEvent::LoginFailed(e.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Tab => self.switch_filter(self.filter().next()),
            KeyCode::BackTab => self.switch_filter(self.filter().previous()),
            KeyCode::Char(c @ '1'..='4') => {
                let i = (c as usize) - ('1' as usize);
                self.switch_filter(ViewFilter::ALL[i]);
            }
            KeyCode::Char('a') => {
                if resolve(self.filter()).shows_add {
                    self.input_mode = InputMode::Adding;
                }
            }
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('e') | KeyCode::Enter => self.start_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('r') => self.restore_selected(),
            KeyCode::Char('L') => self.input_mode = InputMode::ConfirmLogout,
            _ => {}
        }
    }

    fn handle_adding_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => self.submit_add(),
            KeyCode::Backspace if !self.adding => {
                self.add_buffer.pop();
            }
            KeyCode::Char(c) if !self.adding => self.add_buffer.push(c),
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.commit_edit(),
            KeyCode::Esc => {
                self.edit.cancel();
                self.input_mode = InputMode::Normal;
            }
            // Moving away from the row is a focus loss.
            KeyCode::Down => {
                self.commit_edit();
                self.next();
            }
            KeyCode::Up => {
                self.commit_edit();
                self.previous();
            }
            KeyCode::Tab => self.switch_filter(self.filter().next()),
            KeyCode::BackTab => self.switch_filter(self.filter().previous()),
            KeyCode::Backspace => self.edit.backspace(),
            KeyCode::Char(c) => self.edit.insert(c),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.input_mode = InputMode::Normal;
                self.spawn(|manager, tx| async move {
                    // The popup already asked.
                    if manager.logout(&|_: &str| true).await == Outcome::Confirmed {
                        let _ = tx.send(AppEvent::LoggedOut);
                    }
                });
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.input_mode = InputMode::Normal,
            _ => {}
        }
    }

    /// Switches the view, committing any open edit first.
    pub fn switch_filter(&mut self, filter: ViewFilter) {
        if self.edit.is_active() {
            self.commit_edit();
        }
        if !resolve(filter).shows_add && self.input_mode == InputMode::Adding {
            self.input_mode = InputMode::Normal;
        }
        self.state.select(None);
        self.pending_view = Some(filter);
        self.spawn(move |manager, tx| async move {
            manager.load(filter).await;
            let _ = tx.send(AppEvent::Refreshed);
        });
    }

    fn submit_add(&mut self) {
        if self.adding || self.add_buffer.trim().is_empty() {
            return;
        }
        self.adding = true;
        let text = self.add_buffer.clone();
        self.spawn(move |manager, tx| async move {
            if manager.add(&text).await == Outcome::Confirmed {
                let _ = tx.send(AppEvent::TaskAdded);
            }
            let _ = tx.send(AppEvent::AddFinished);
        });
    }

    /// The selected row together with the view it was listed in. `None` while
    /// a switch to another view is still pending, since the rows on screen
    /// belong to the previous view.
    fn selected_row(&self) -> Option<(ViewFilter, Task)> {
        if self.pending_view.is_some_and(|v| v != self.filter()) {
            return None;
        }
        let view = self.filter();
        self.selected_task().map(|task| (view, task))
    }

    fn toggle_selected(&mut self) {
        if let Some((view, task)) = self.selected_row() {
            if view == ViewFilter::Trash {
                return;
            }
            self.spawn(move |manager, tx| async move {
                manager.toggle_complete(view, &task.id).await;
                let _ = tx.send(AppEvent::Refreshed);
            });
        }
    }

    fn start_edit(&mut self) {
        if let Some((view, task)) = self.selected_row() {
            if view == ViewFilter::Trash {
                return;
            }
            if let Some(commit) = self.edit.start(&task) {
                self.send_edit(commit);
            }
            self.input_mode = InputMode::Editing;
        }
    }

    /// Leaves edit mode; sends the edit when the text actually changed.
    pub fn commit_edit(&mut self) {
        if let Some(commit) = self.edit.commit() {
            self.send_edit(commit);
        }
        self.input_mode = InputMode::Normal;
    }

    fn send_edit(&self, commit: EditCommit) {
        self.spawn(move |manager, tx| async move {
            manager.edit(&commit.id, &commit.text).await;
            let _ = tx.send(AppEvent::Refreshed);
        });
    }

    fn delete_selected(&mut self) {
        if let Some((view, task)) = self.selected_row() {
            self.spawn(move |manager, tx| async move {
                manager.delete(view, &task.id).await;
                let _ = tx.send(AppEvent::Refreshed);
            });
        }
    }

    fn restore_selected(&mut self) {
        if let Some((view, task)) = self.selected_row() {
            if view != ViewFilter::Trash {
                return;
            }
            self.spawn(move |manager, tx| async move {
                manager.restore(view, &task.id).await;
                let _ = tx.send(AppEvent::Refreshed);
            });
        }
    }
}
