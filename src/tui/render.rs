/// Ratatui draw entry-point for tonecoach.
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{AppState, Focus, GOAL_PLACEHOLDER, QUERY_PLACEHOLDER};
use crate::composer::StreamStatus;
use crate::ui;

pub const BORDER: Color = Color::Rgb(60, 60, 80);
const PLACEHOLDER: Color = Color::Rgb(70, 70, 90);
pub const SPINNER_GLYPHS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// ── Main draw entry point ─────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(rows[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(cols[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35), // thread text
            Constraint::Length(7),      // draft
            Constraint::Length(3),      // goal
            Constraint::Min(0),         // output
        ])
        .split(cols[1]);

    draw_line_input(
        f,
        " search ",
        &state.composer.query,
        state.query_cursor,
        QUERY_PLACEHOLDER,
        state.focus == Focus::Query,
        left[0],
    );
    draw_thread_list(f, state, left[1]);
    draw_thread_text(f, state, right[0]);
    f.render_widget(&state.draft, right[1]);
    draw_line_input(
        f,
        " goal ",
        &state.composer.goal,
        state.goal_cursor,
        GOAL_PLACEHOLDER,
        state.focus == Focus::Goal,
        right[2],
    );
    draw_output(f, state, right[3]);
    draw_status_bar(f, state, rows[1]);
}

fn block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(if focused { Color::Cyan } else { BORDER }))
}

// ── Single-line inputs (search, goal) ─────────────────────────────────────────

fn draw_line_input(
    f: &mut Frame,
    title: &str,
    text: &str,
    cursor: usize,
    placeholder: &str,
    focused: bool,
    area: Rect,
) {
    let content = if text.is_empty() {
        Span::styled(placeholder.to_string(), Style::default().fg(PLACEHOLDER))
    } else {
        Span::styled(text.to_string(), Style::default().fg(Color::White))
    };
    f.render_widget(Paragraph::new(Line::from(content)).block(block(title, focused)), area);

    if focused {
        let before = &text[..cursor.min(text.len())];
        let cursor_x = area.x + 1 + before.width() as u16;
        if cursor_x < area.x + area.width.saturating_sub(1) {
            f.set_cursor_position((cursor_x, area.y + 1));
        }
    }
}

// ── Thread list ───────────────────────────────────────────────────────────────

fn draw_thread_list(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.focus == Focus::Threads;
    let threads = state.composer.threads();
    let title = format!(" threads ({}) ", threads.len());
    let block = block(&title, focused);
    let w = block.inner(area).width as usize;

    let items: Vec<ListItem<'static>> = threads
        .iter()
        .map(|t| {
            let current = t.id == state.composer.thread_id();
            let bullet = format!("{} ", ui::thread_bullet(current));
            let snippet = truncate_to_width(&t.snippet.replace('\n', " "), w.saturating_sub(2));
            let style = if current {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(150, 145, 190))
            };
            ListItem::new(Line::from(vec![
                Span::styled(bullet, style),
                Span::styled(snippet, style),
            ]))
        })
        .collect();

    let highlight = if focused {
        Style::default().bg(Color::Rgb(28, 26, 48))
    } else {
        Style::default()
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut list_state = ListState::default()
        .with_selected((!threads.is_empty()).then_some(state.list_selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

// ── Thread text ───────────────────────────────────────────────────────────────

fn draw_thread_text(f: &mut Frame, state: &AppState, area: Rect) {
    let text = state.composer.thread_display();
    let style = if state.composer.thread_text().is_empty() {
        Style::default().fg(PLACEHOLDER)
    } else {
        Style::default().fg(Color::Rgb(210, 210, 225))
    };
    let title = if state.composer.thread_id().is_empty() {
        " thread ".to_string()
    } else {
        format!(" thread {} ", state.composer.thread_id())
    };
    f.render_widget(
        Paragraph::new(text.to_string())
            .style(style)
            .block(block(&title, false))
            .wrap(Wrap { trim: false })
            .scroll((state.thread_scroll, 0)),
        area,
    );
}

// ── Output pane ───────────────────────────────────────────────────────────────

fn draw_output(f: &mut Frame, state: &AppState, area: Rect) {
    let composer = &state.composer;
    let text = composer.output_display();
    let style = if composer.output().is_empty() {
        Style::default().fg(PLACEHOLDER)
    } else {
        Style::default().fg(Color::White)
    };
    let title = match composer.status() {
        StreamStatus::Streaming(kind) => format!(" output {} {} ", ui::stream_glyph(kind), kind.label()),
        StreamStatus::Idle => " output ".to_string(),
    };
    let block = block(&title, composer.is_streaming());
    let inner = block.inner(area);

    // Follow the tail of the stream; PageUp/PageDown move away from it.
    let paragraph = Paragraph::new(text.to_string())
        .style(style)
        .wrap(Wrap { trim: false });
    let total = paragraph.line_count(inner.width);
    let bottom = total.saturating_sub(inner.height as usize);
    let offset = bottom.saturating_sub(state.output_scroll as usize);

    f.render_widget(
        paragraph
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0)),
        area,
    );
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn draw_status_bar(f: &mut Frame, state: &AppState, area: Rect) {
    let (glyph, glyph_color) = if state.composer.is_streaming() {
        let g = SPINNER_GLYPHS[(state.spinner_tick as usize) % SPINNER_GLYPHS.len()];
        (g, Color::Cyan)
    } else {
        ("▲", Color::White)
    };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(glyph, Style::default().fg(glyph_color).add_modifier(Modifier::BOLD)),
        Span::styled(" tonecoach", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(state.profile.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.base_url.clone(), Style::default().fg(Color::Rgb(100, 180, 220))),
        Span::styled(
            "  Tab focus  Enter search/select  Ctrl+K coach  Ctrl+L identify  PgUp/PgDn scroll  Esc quit",
            Style::default().fg(Color::Rgb(55, 50, 90)),
        ),
    ]);

    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Rgb(10, 10, 18))),
        area,
    );
}

// ── Utilities ─────────────────────────────────────────────────────────────────

/// Cut `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if used + cw > max - 1 {
            break;
        }
        out.push(c);
        used += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{StreamKind, THREAD_PLACEHOLDER, ThreadDetail};
    use crate::config::ResolvedConfig;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("Hi", 10), "Hi");
        assert_eq!(truncate_to_width("Lunch tomorrow?", 6), "Lunch…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_output_pane_shows_latest_chunk() {
        let resolved = ResolvedConfig {
            base_url: "http://127.0.0.1:9".into(),
            query: "in:inbox".into(),
            profile_name: "test".into(),
        };
        let mut state = AppState::new(&resolved);
        let t = state.composer.begin_stream(StreamKind::Coach);
        for i in 0..60 {
            state.composer.apply_chunk(t, &format!("word{i:02}abcdefgh "));
        }
        state.composer.apply_chunk(t, "ENDMARK");

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &state)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("ENDMARK"), "latest streamed text not visible");
    }

    #[test]
    fn test_scrolling_up_leaves_the_tail() {
        let resolved = ResolvedConfig {
            base_url: "http://127.0.0.1:9".into(),
            query: "in:inbox".into(),
            profile_name: "test".into(),
        };
        let mut state = AppState::new(&resolved);
        let t = state.composer.begin_stream(StreamKind::Coach);
        for i in 0..60 {
            state.composer.apply_chunk(t, &format!("line{i:02}\n"));
        }
        state.composer.apply_chunk(t, "ENDMARK");
        state.output_scroll = 40;

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &state)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(!screen.contains("ENDMARK"));
        assert!(screen.contains("line20"));
    }

    #[test]
    fn test_thread_placeholder_until_text_arrives() {
        let resolved = ResolvedConfig {
            base_url: "http://127.0.0.1:9".into(),
            query: "in:inbox".into(),
            profile_name: "test".into(),
        };
        let mut state = AppState::new(&resolved);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let screen = |terminal: &Terminal<TestBackend>| -> String {
            terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
        };

        terminal.draw(|f| draw(f, &state)).unwrap();
        assert!(screen(&terminal).contains(THREAD_PLACEHOLDER));

        let t = state.composer.begin_select("1");
        state.composer.apply_thread(t, ThreadDetail { thread: "Lunch at noon?".into() });
        terminal.draw(|f| draw(f, &state)).unwrap();
        let shown = screen(&terminal);
        assert!(shown.contains("Lunch at noon?"));
        assert!(!shown.contains(THREAD_PLACEHOLDER));
    }
}
