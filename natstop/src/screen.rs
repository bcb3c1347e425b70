//! Terminal output behind a small trait so the controller never deals with
//! escape sequences or ratatui directly.

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};

use crate::ui::theme::{FLASH_ERROR, HELP_BORDER, PROMPT, TABLE_HEADER};

/// Everything one frame shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub body: String,
    /// Modal input line (`sort by [cid]: msg`), cursor goes at its end.
    pub prompt: Option<String>,
    /// Inline error shown in place of the prompt for a short while.
    pub flash: Option<String>,
    pub help: Option<String>,
}

pub trait Screen {
    fn redraw(&mut self, view: &View) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

pub struct TerminalScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl TerminalScreen {
    /// Raw mode + alternate screen. Pair with [`TerminalScreen::restore`].
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Screen for TerminalScreen {
    fn redraw(&mut self, view: &View) -> io::Result<()> {
        self.terminal.draw(|f| draw_view(f, view))?;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }
}

fn draw_view(f: &mut ratatui::Frame<'_>, view: &View) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    let header_style = Style::default()
        .fg(TABLE_HEADER)
        .add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = view
        .body
        .lines()
        .map(|l| {
            if l.trim_start().starts_with("HOST ") {
                Line::from(Span::styled(l.to_string(), header_style))
            } else {
                Line::from(l.to_string())
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), rows[0]);

    if let Some(msg) = &view.flash {
        let line = Line::from(Span::styled(msg.clone(), Style::default().fg(FLASH_ERROR)));
        f.render_widget(Paragraph::new(line), rows[1]);
    } else if let Some(prompt) = &view.prompt {
        let line = Line::from(Span::styled(prompt.clone(), Style::default().fg(PROMPT)));
        f.render_widget(Paragraph::new(line), rows[1]);
        let x = rows[1].x + (prompt.chars().count() as u16).min(rows[1].width.saturating_sub(1));
        f.set_cursor_position((x, rows[1].y));
    }

    if let Some(help) = &view.help {
        let area = centered(f.area(), help);
        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(HELP_BORDER))
            .title("Help");
        f.render_widget(Paragraph::new(help.as_str()).block(block), area);
    }
}

fn centered(area: Rect, text: &str) -> Rect {
    let w = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
    let h = text.lines().count() as u16 + 2;
    let width = w.min(area.width);
    let height = h.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
