/// Ratatui-based TUI for tonecoach.
///
/// Architecture:
///   main thread:  event loop: crossterm keyboard events + mpsc UiEvent drain
///   requests:     tokio::spawn per API call, results sent back as UiEvents
///
/// Layout:
///   ┌ search ────────┐┌ thread ─────────────────────────┐
///   │                ││                                 │
///   ├ threads ───────┤├ draft ──────────────────────────┤
///   │                │├ goal ───────────────────────────┤
///   │                │├ output ─────────────────────────┤
///   └────────────────┘└─────────────────────────────────┘
///    status bar (1 line)
pub mod render;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    style::{Color, Style},
    widgets::{Block, Borders},
};
use tokio::sync::mpsc;
use tui_textarea::TextArea;

use crate::actions;
use crate::client::Client;
use crate::composer::{Channel, Composer, StreamKind, ThreadDetail, ThreadSummary, Ticket};
use crate::config::ResolvedConfig;

// ── UiEvent: results from request tasks → TUI ───────────────────────────────

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Search response
    ThreadsLoaded { ticket: Ticket, threads: Vec<ThreadSummary> },
    /// Thread detail response
    ThreadLoaded { ticket: Ticket, detail: ThreadDetail },
    /// A streamed text chunk for the output pane
    Chunk { ticket: Ticket, text: String },
    /// Stream reached end-of-body
    StreamDone { ticket: Ticket },
    /// Request failed; already logged
    Failed { ticket: Ticket, channel: Channel },
}

// ── Focus ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Query,
    Threads,
    Draft,
    Goal,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Query => Focus::Threads,
            Focus::Threads => Focus::Draft,
            Focus::Draft => Focus::Goal,
            Focus::Goal => Focus::Query,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Query => Focus::Goal,
            Focus::Threads => Focus::Query,
            Focus::Draft => Focus::Threads,
            Focus::Goal => Focus::Draft,
        }
    }
}

// ── AppState ──────────────────────────────────────────────────────────────────

pub const DRAFT_PLACEHOLDER: &str = "Your draft…";
pub const GOAL_PLACEHOLDER: &str = "Goal (e.g., confirm ETA, under 120 words)";
pub const QUERY_PLACEHOLDER: &str = "search";

pub struct AppState {
    pub composer: Composer,
    pub focus: Focus,
    pub query_cursor: usize, // byte offset in composer.query
    pub goal_cursor: usize,  // byte offset in composer.goal
    pub draft: TextArea<'static>,
    /// Highlighted row in the thread list
    pub list_selected: usize,
    /// Lines scrolled up from the bottom of the output pane
    pub output_scroll: u16,
    pub thread_scroll: u16,
    /// Incremented every 120ms while streaming, for the spinner
    pub spinner_tick: u32,
    pub profile: String,
    pub base_url: String,
}

impl AppState {
    pub fn new(resolved: &ResolvedConfig) -> Self {
        let composer = Composer::new(&resolved.query);
        let query_cursor = composer.query.len();
        let mut draft = TextArea::default();
        draft.set_placeholder_text(DRAFT_PLACEHOLDER);
        draft.set_cursor_line_style(Style::default());
        let mut state = Self {
            composer,
            focus: Focus::default(),
            query_cursor,
            goal_cursor: 0,
            draft,
            list_selected: 0,
            output_scroll: 0,
            thread_scroll: 0,
            spinner_tick: 0,
            profile: resolved.profile_name.clone(),
            base_url: resolved.base_url.clone(),
        };
        state.refresh_draft_block();
        state
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.refresh_draft_block();
    }

    fn refresh_draft_block(&mut self) {
        let color = if self.focus == Focus::Draft { Color::Cyan } else { render::BORDER };
        self.draft.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(" draft ")
                .border_style(Style::default().fg(color)),
        );
    }

    fn sync_draft(&mut self) {
        self.composer.draft = self.draft.lines().join("\n");
    }

    /// Apply a request result, following a fresh search with a load of its
    /// first thread.
    fn apply_event(&mut self, ev: UiEvent, client: &Client, tx: &mpsc::UnboundedSender<UiEvent>) {
        match &ev {
            UiEvent::ThreadLoaded { .. } => self.thread_scroll = 0,
            UiEvent::Chunk { .. } => self.output_scroll = 0,
            _ => {}
        }
        if actions::dispatch(client, &mut self.composer, ev, tx) {
            self.list_selected = 0;
        }
    }
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ── Main TUI run loop ─────────────────────────────────────────────────────────

pub async fn run(client: Client, resolved: ResolvedConfig) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook: restore terminal before printing panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        orig_hook(info);
    }));

    let result = event_loop(&mut terminal, client, resolved).await;

    restore_terminal(&mut terminal);
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: Client,
    resolved: ResolvedConfig,
) -> Result<()> {
    let mut state = AppState::new(&resolved);

    // Channel: request tasks → TUI
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();

    actions::launch_search(&client, &mut state.composer, &ui_tx);

    let mut crossterm_events = EventStream::new();
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(120));

    terminal.draw(|f| render::draw(f, &state))?;

    loop {
        tokio::select! {
            // ── Animation tick ────────────────────────────────────────────────
            _ = ticker.tick() => {
                if state.composer.is_streaming() {
                    state.spinner_tick = state.spinner_tick.wrapping_add(1);
                    terminal.draw(|f| render::draw(f, &state))?;
                }
            }

            // ── Drain request results ─────────────────────────────────────────
            Some(ev) = ui_rx.recv() => {
                state.apply_event(ev, &client, &ui_tx);
                terminal.draw(|f| render::draw(f, &state))?;
            }

            // ── Keyboard/resize events ────────────────────────────────────────
            Some(Ok(ev)) = crossterm_events.next() => {
                if let Event::Key(key) = ev {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let keep = handle_key(key, &mut state, &client, &ui_tx);
                    if !keep { break; }
                }
                terminal.draw(|f| render::draw(f, &state))?;
            }
        }
    }

    Ok(())
}

// ── Key handler ───────────────────────────────────────────────────────────────

/// Returns false when the user asked to quit.
fn handle_key(
    key: KeyEvent,
    state: &mut AppState,
    client: &Client,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // ── Global keys ───────────────────────────────────────────────────────────
    match key.code {
        KeyCode::Char('c') if ctrl => return false,
        KeyCode::Esc => return false,
        KeyCode::Char('k') if ctrl => {
            start_stream(state, client, StreamKind::Coach, ui_tx);
            return true;
        }
        KeyCode::Char('l') if ctrl => {
            start_stream(state, client, StreamKind::Madlibs, ui_tx);
            return true;
        }
        KeyCode::Tab => {
            state.set_focus(state.focus.next());
            return true;
        }
        KeyCode::BackTab => {
            state.set_focus(state.focus.prev());
            return true;
        }
        KeyCode::PageUp => {
            state.output_scroll = state.output_scroll.saturating_add(5);
            return true;
        }
        KeyCode::PageDown => {
            state.output_scroll = state.output_scroll.saturating_sub(5);
            return true;
        }
        _ => {}
    }

    match state.focus {
        Focus::Query => {
            if key.code == KeyCode::Enter {
                actions::launch_search(client, &mut state.composer, ui_tx);
            } else {
                edit_line(key, &mut state.composer.query, &mut state.query_cursor);
            }
        }
        Focus::Goal => {
            if key.code == KeyCode::Enter {
                start_stream(state, client, StreamKind::Coach, ui_tx);
            } else {
                edit_line(key, &mut state.composer.goal, &mut state.goal_cursor);
            }
        }
        Focus::Draft => {
            state.draft.input(key);
        }
        Focus::Threads => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.list_selected = state.list_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if state.list_selected + 1 < state.composer.threads().len() {
                    state.list_selected += 1;
                }
            }
            KeyCode::Home => state.list_selected = 0,
            KeyCode::End => {
                state.list_selected = state.composer.threads().len().saturating_sub(1);
            }
            KeyCode::Enter => {
                let id = state
                    .composer
                    .threads()
                    .get(state.list_selected)
                    .map(|t| t.id.clone());
                if let Some(id) = id {
                    actions::launch_select(client, &mut state.composer, &id, ui_tx);
                }
            }
            KeyCode::Char('J') => state.thread_scroll = state.thread_scroll.saturating_add(3),
            KeyCode::Char('K') => state.thread_scroll = state.thread_scroll.saturating_sub(3),
            _ => {}
        },
    }
    true
}

fn start_stream(
    state: &mut AppState,
    client: &Client,
    kind: StreamKind,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
) {
    state.sync_draft();
    state.output_scroll = 0;
    actions::launch_stream(client, &mut state.composer, kind, ui_tx);
}

/// Single-line editing shared by the query and goal fields.
fn edit_line(key: KeyEvent, input: &mut String, cursor: &mut usize) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('w') if ctrl => input_delete_word(input, cursor),
        KeyCode::Char('u') if ctrl => {
            input.drain(..*cursor);
            *cursor = 0;
        }
        KeyCode::Char('a') if ctrl => *cursor = 0,
        KeyCode::Char('e') if ctrl => *cursor = input.len(),
        KeyCode::Char(c) if !ctrl => {
            input.insert(*cursor, c);
            *cursor += c.len_utf8();
        }
        KeyCode::Backspace => input_backspace(input, cursor),
        KeyCode::Delete => input_delete_forward(input, cursor),
        KeyCode::Left => *cursor = prev_char_boundary(input, *cursor),
        KeyCode::Right => *cursor = next_char_boundary(input, *cursor),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = input.len(),
        _ => {}
    }
}

// ── Input editing helpers ─────────────────────────────────────────────────────

/// Remove the character immediately before the cursor (UTF-8 safe).
fn input_backspace(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let prev = prev_char_boundary(input, *cursor);
    input.drain(prev..*cursor);
    *cursor = prev;
}

/// Delete the character at the cursor position.
fn input_delete_forward(input: &mut String, cursor: &mut usize) {
    if *cursor >= input.len() {
        return;
    }
    let next = next_char_boundary(input, *cursor);
    input.drain(*cursor..next);
}

/// Delete the word immediately before the cursor (stops at whitespace boundary).
fn input_delete_word(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let bytes = input.as_bytes();
    let mut start = *cursor;
    while start > 0 && bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    while start > 0 && !bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    input.drain(start..*cursor);
    *cursor = start;
}

fn prev_char_boundary(s: &str, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let mut p = pos - 1;
    while !s.is_char_boundary(p) {
        p -= 1;
    }
    p
}

fn next_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut p = pos + 1;
    while p < s.len() && !s.is_char_boundary(p) {
        p += 1;
    }
    p
}
