//! App state and main loop: merges snapshot arrivals with keystrokes,
//! drives redraws and owns the operator's display options.

use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::options::DisplayOptions;
use crate::screen::{Screen, View};
use crate::snapshot::ServerSnapshot;
use crate::sort::SortKey;
use crate::ui::{self, help::help_text};

pub const FLASH_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Viewing,
    EnteringSort,
    EnteringLimit,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Redraw,
    Quit,
}

#[derive(Debug)]
struct Flash {
    message: String,
    until: Instant,
}

pub struct App {
    mode: Mode,
    input: String,
    flash: Option<Flash>,

    // Display options are published to the engine through this channel.
    options: watch::Sender<DisplayOptions>,
    shutdown: watch::Sender<bool>,

    last: ServerSnapshot,
    body: String,

    refreshes: usize,
    max_refresh: Option<usize>,
}

impl App {
    pub fn new(options: watch::Sender<DisplayOptions>, shutdown: watch::Sender<bool>) -> Self {
        let last = ServerSnapshot::default();
        let body = ui::render(&last, &options.borrow(), None);
        Self {
            mode: Mode::Viewing,
            input: String::new(),
            flash: None,
            options,
            shutdown,
            last,
            body,
            refreshes: 0,
            max_refresh: None,
        }
    }

    /// Quit on our own after `n` snapshot-triggered redraws.
    pub fn with_max_refresh(mut self, n: Option<usize>) -> Self {
        self.max_refresh = n;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn options(&self) -> DisplayOptions {
        self.options.borrow().clone()
    }

    pub fn flash_message(&self) -> Option<&str> {
        self.flash.as_ref().map(|f| f.message.as_str())
    }

    pub async fn run<S, E, Q>(
        &mut self,
        screen: &mut S,
        mut snapshots: mpsc::Receiver<ServerSnapshot>,
        mut events: E,
        quit_signal: Q,
    ) -> io::Result<()>
    where
        S: Screen,
        E: Stream<Item = io::Result<Event>> + Unpin,
        Q: Future<Output = ()>,
    {
        tokio::pin!(quit_signal);
        screen.clear()?;
        screen.redraw(&self.view())?;

        let res = loop {
            let deadline = self.flash.as_ref().map(|f| f.until);
            let action = tokio::select! {
                snap = snapshots.recv() => match snap {
                    Some(s) => self.on_snapshot(s),
                    None => Action::Quit,
                },
                Some(ev) = events.next() => match ev {
                    Ok(Event::Key(k)) => self.handle_key(k, Instant::now()),
                    Ok(Event::Resize(_, _)) => Action::Redraw,
                    Ok(_) => Action::None,
                    Err(e) => break Err(e),
                },
                _ = flash_expiry(deadline) => self.expire_flash(Instant::now()),
                _ = &mut quit_signal => Action::Quit,
            };

            match action {
                Action::None => {}
                Action::Redraw => {
                    if let Err(e) = screen.redraw(&self.view()) {
                        break Err(e);
                    }
                }
                Action::Quit => break Ok(()),
            }
            if self.refresh_limit_reached() {
                tracing::debug!(refreshes = self.refreshes, "max refresh reached");
                break Ok(());
            }
        };

        // Stop the engine before its next tick; an in-flight poll just finishes.
        self.shutdown.send_replace(true);
        drop(snapshots);
        res
    }

    fn refresh_limit_reached(&self) -> bool {
        self.max_refresh.is_some_and(|n| self.refreshes >= n)
    }

    /// New data replaces the body; the mode and input buffer are untouched.
    pub fn on_snapshot(&mut self, snapshot: ServerSnapshot) -> Action {
        self.last = snapshot;
        self.rerender();
        self.refreshes += 1;
        Action::Redraw
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }
        // A keystroke cuts a pending error flash short, then counts as usual.
        if self.flash.is_some() {
            self.cancel_flash();
        }
        match self.mode {
            Mode::Help => match key.code {
                KeyCode::Char('q') => Action::Quit,
                _ => {
                    self.mode = Mode::Viewing;
                    Action::Redraw
                }
            },
            Mode::Viewing => self.handle_viewing(key),
            Mode::EnteringSort | Mode::EnteringLimit => self.handle_entry(key, now),
        }
    }

    fn handle_viewing(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('o') => self.begin_entry(Mode::EnteringSort),
            KeyCode::Char('n') => self.begin_entry(Mode::EnteringLimit),
            KeyCode::Char('?') | KeyCode::Char('h') => {
                self.mode = Mode::Help;
                Action::Redraw
            }
            KeyCode::Char('s') => self.toggle(|o| o.show_subs = !o.show_subs),
            KeyCode::Char('d') => self.toggle(|o| o.lookup_dns = !o.lookup_dns),
            KeyCode::Char('b') => self.toggle(|o| o.raw_bytes = !o.raw_bytes),
            KeyCode::Char('r') => self.toggle(|o| o.show_rates = !o.show_rates),
            _ => Action::None,
        }
    }

    fn handle_entry(&mut self, key: KeyEvent, now: Instant) -> Action {
        match key.code {
            KeyCode::Enter => self.submit(now),
            KeyCode::Backspace => {
                self.input.pop();
                Action::Redraw
            }
            KeyCode::Esc => {
                self.input.clear();
                self.mode = Mode::Viewing;
                Action::Redraw
            }
            KeyCode::Char('?') => {
                self.input.clear();
                self.mode = Mode::Help;
                Action::Redraw
            }
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char(c) => {
                self.input.push(c);
                Action::Redraw
            }
            _ => Action::None,
        }
    }

    fn begin_entry(&mut self, mode: Mode) -> Action {
        self.input.clear();
        self.mode = mode;
        Action::Redraw
    }

    fn toggle(&mut self, f: impl FnOnce(&mut DisplayOptions)) -> Action {
        self.options.send_modify(f);
        self.rerender();
        Action::Redraw
    }

    fn submit(&mut self, now: Instant) -> Action {
        let entered = self.input.trim().to_string();
        if entered.is_empty() {
            self.input.clear();
            self.mode = Mode::Viewing;
            return Action::Redraw;
        }
        let applied = match self.mode {
            Mode::EnteringSort => entered
                .parse::<SortKey>()
                .map(|key| self.options.send_modify(|o| o.sort = key))
                .map_err(|e| e.to_string()),
            Mode::EnteringLimit => match entered.parse::<usize>() {
                Ok(n) if n > 0 => {
                    self.options.send_modify(|o| o.limit = n);
                    Ok(())
                }
                _ => Err(format!("invalid limit: {entered}")),
            },
            _ => Ok(()),
        };
        match applied {
            Ok(()) => {
                self.input.clear();
                self.mode = Mode::Viewing;
                self.rerender();
            }
            Err(message) => {
                tracing::debug!(%message, "rejected input");
                // Stay in the entry mode until the flash expires.
                self.flash = Some(Flash {
                    message,
                    until: now + FLASH_DURATION,
                });
            }
        }
        Action::Redraw
    }

    /// Ends an expired flash: back to viewing with an empty buffer.
    pub fn expire_flash(&mut self, now: Instant) -> Action {
        match &self.flash {
            Some(f) if now >= f.until => {
                self.cancel_flash();
                Action::Redraw
            }
            _ => Action::None,
        }
    }

    fn cancel_flash(&mut self) {
        self.flash = None;
        self.input.clear();
        self.mode = Mode::Viewing;
    }

    fn rerender(&mut self) {
        self.body = ui::render(&self.last, &self.options.borrow(), None);
    }

    pub fn view(&self) -> View {
        let opts = self.options.borrow();
        let prompt = match self.mode {
            Mode::EnteringSort => Some(format!("sort by [{}]: {}", opts.sort, self.input)),
            Mode::EnteringLimit => Some(format!("limit   [{}]: {}", opts.limit, self.input)),
            _ => None,
        };
        View {
            body: self.body.clone(),
            prompt,
            flash: self.flash.as_ref().map(|f| f.message.clone()),
            help: (self.mode == Mode::Help).then(help_text),
        }
    }
}

async fn flash_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending().await,
    }
}

/// Ctrl-C (outside raw mode) or SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
