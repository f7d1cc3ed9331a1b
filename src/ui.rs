use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::sensor::TriState;
use crate::session::{InputMode, Session};
use crate::stats::{format_average, format_ms};
use crate::timer::TimerPhase;

const HORIZONTAL_MARGIN: u16 = 4;
const HISTORY_ROWS: usize = 8;

/// Snapshot handed to the renderer once per frame.
pub struct TimerView<'a> {
    pub session: &'a Session,
    pub now: Instant,
    pub release_events: bool,
}

impl Widget for &TimerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;

        let scramble_lines = if session.scramble().width() as u16 > area.width {
            2
        } else {
            1
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(scramble_lines + 1),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_scramble(chunks[0], buf);
        self.render_clock(chunks[1], buf);
        self.render_status(chunks[2], buf);
        self.render_history(chunks[3], buf);
        self.render_help(chunks[4], buf);
    }
}

impl TimerView<'_> {
    fn render_scramble(&self, area: Rect, buf: &mut Buffer) {
        let dim_bold = Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::DIM);

        Paragraph::new(Span::styled(self.session.scramble().to_string(), dim_bold))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }

    fn render_clock(&self, area: Rect, buf: &mut Buffer) {
        let phase = self.session.phase();
        let style = match phase {
            TimerPhase::Idle => Style::default().add_modifier(Modifier::DIM),
            TimerPhase::Ready => Style::default().fg(Color::Yellow),
            TimerPhase::Running => Style::default().fg(Color::Green),
            TimerPhase::Stopped => Style::default().fg(Color::Magenta),
        }
        .add_modifier(Modifier::BOLD);

        let text = match phase {
            TimerPhase::Ready => "READY".to_string(),
            _ => format_ms(self.session.display_ms(self.now)),
        };

        Paragraph::new(Line::from(Span::styled(text, style)))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let italic = Style::default().add_modifier(Modifier::ITALIC);

        let mode = match self.session.mode() {
            InputMode::Manual => "manual".to_string(),
            InputMode::Motion => {
                let sensor = self.session.sensor_state();
                let perm = match sensor.permission {
                    TriState::Yes => "granted",
                    TriState::No => "denied",
                    TriState::Unknown => "probing",
                };
                format!(
                    "motion ({}, sens {}, last {:.1})",
                    perm,
                    self.session.sensitivity(),
                    self.session.last_event_strength()
                )
            }
        };

        let mut line = format!("mode: {}", mode);
        if let Some(status) = self.session.status() {
            line.push_str("  |  ");
            line.push_str(status);
        }

        Paragraph::new(Span::styled(line, italic))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_history(&self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let mut lines: Vec<Line> = Vec::new();

        let averages = format!(
            "ao5 {}   ao12 {}   best {}   mean {}",
            format_average(session.average_of(5)),
            format_average(session.average_of(12)),
            session
                .best_ms()
                .map(format_ms)
                .unwrap_or_else(|| "-".into()),
            format_average(session.session_mean()),
        );
        lines.push(Line::from(Span::styled(
            averages,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());

        for record in session.records().iter().take(HISTORY_ROWS) {
            let time = if record.dnf {
                format!("DNF ({})", format_ms(record.duration_ms))
            } else {
                format_ms(record.duration_ms)
            };
            let style = if record.dnf {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("#{:<4} {}", record.id, time),
                style,
            )));
        }

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::TOP).title("solves"))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let help = if self.release_events {
            "space hold/release  n next  x cancel  m mode  d dnf  u undo  +/- sens  esc quit"
        } else {
            "space tap  n next  x cancel  m mode  d dnf  u undo  +/- sens  esc quit"
        };
        Paragraph::new(Span::styled(
            help,
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(area, buf);
    }
}
