//! Drawing functions for the TUI
//!
//! The screen is split top to bottom:
//! - `header` - case selector, sync clock, mission status
//! - `feed` and `sidebar` - primary panel next to threat level and subjects
//! - `footer` - view buttons, briefing and negotiation controls, key hints
//!
//! The transient notice is drawn last, over everything else.

mod feed;
mod footer;
mod header;
mod sidebar;

use parking_lot::Mutex;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::sync::Arc;

use crate::config::AssetsConfig;
use crate::dashboard::Dashboard;
use crate::media::ThumbnailManager;
use crate::ui::theme::Theme;

use feed::draw_primary;
use footer::{draw_footer, FOOTER_HEIGHT};
use header::{draw_header, HEADER_HEIGHT};
use sidebar::draw_sidebar;

/// Sidebar share of the body width
const SIDEBAR_PERCENT: u16 = 36;

/// Main draw function
pub fn draw(
    f: &mut Frame,
    dashboard: &Dashboard,
    assets: &AssetsConfig,
    thumbnails: Option<&Arc<Mutex<ThumbnailManager>>>,
    theme: &Theme,
) {
    let area = f.area();
    let bg_block = Block::default().style(Style::default().bg(theme.background));
    f.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(6),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(100 - SIDEBAR_PERCENT),
            Constraint::Percentage(SIDEBAR_PERCENT),
        ])
        .split(chunks[1]);

    draw_header(f, dashboard, chunks[0], theme);
    draw_primary(f, dashboard, assets, body[0], thumbnails, theme);
    draw_sidebar(f, dashboard, body[1], thumbnails, theme);
    draw_footer(f, dashboard, chunks[2], theme);

    if let Some(message) = dashboard.notice() {
        draw_notice(f, message, area, theme);
    }
}

/// Centered rect of at most `width` x `height` inside `area`
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_notice(f: &mut Frame, message: &str, area: Rect, theme: &Theme) {
    let width = message.len() as u16 + 6;
    let popup = popup_area(area, width, 3);

    let notice = Paragraph::new(message)
        .style(
            Style::default()
                .fg(theme.alert)
                .bg(theme.panel)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.alert))
                .style(Style::default().bg(theme.panel)),
        );

    f.render_widget(Clear, popup);
    f.render_widget(notice, popup);
}
