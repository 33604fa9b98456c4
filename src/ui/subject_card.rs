//! Subject card widget
//!
//! Renders each detected subject as a small card:
//! - Name (bold)
//! - Status note (dimmed)
//! - Image line: file name, or the "NO IMAGE" placeholder
//!
//! When the terminal can draw the thumbnail, the text is shifted right and
//! the image itself is drawn over the reserved column by the sidebar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::Theme;
use crate::case::Subject;

/// Width of the thumbnail column in characters
pub const THUMB_WIDTH: u16 = 8;

/// Placeholder for subjects without a usable image
pub const NO_IMAGE: &str = "NO IMAGE";

/// Subject card widget
pub struct SubjectCard<'a> {
    subject: &'a Subject,
    theme: &'a Theme,
    /// Image reference did not resolve
    image_failed: bool,
    /// Reserve room for a graphics thumbnail
    thumb_space: bool,
}

impl<'a> SubjectCard<'a> {
    pub fn new(subject: &'a Subject, theme: &'a Theme) -> Self {
        Self {
            subject,
            theme,
            image_failed: false,
            thumb_space: false,
        }
    }

    pub fn image_failed(mut self, failed: bool) -> Self {
        self.image_failed = failed;
        self
    }

    pub fn thumb_space(mut self, thumb_space: bool) -> Self {
        self.thumb_space = thumb_space;
        self
    }

    /// Text for the image line
    fn image_line(&self) -> String {
        match self.subject.image {
            Some(ref image) if !self.image_failed => {
                let name = image.rsplit('/').next().unwrap_or(image);
                format!("IMG {}", name)
            }
            _ => NO_IMAGE.to_string(),
        }
    }
}

impl<'a> Widget for SubjectCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let bg = self.theme.panel;
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_bg(bg);
                }
            }
        }

        let padding_x = 1u16;
        let inner_width = area.width.saturating_sub(padding_x * 2);
        if inner_width == 0 {
            return;
        }

        let offset = if self.thumb_space { THUMB_WIDTH } else { 0 };
        let text_x = area.x + padding_x + offset;
        let text_width = inner_width.saturating_sub(offset) as usize;
        let max_y = area.y + area.height;
        let mut y = area.y;

        let name_style = Style::default()
            .fg(self.theme.foreground)
            .bg(bg)
            .add_modifier(Modifier::BOLD);
        buf.set_string(text_x, y, truncate(&self.subject.name, text_width), name_style);
        y += 1;

        if y < max_y {
            if let Some(ref status) = self.subject.status {
                let style = Style::default().fg(self.theme.dimmed).bg(bg);
                buf.set_string(text_x, y, truncate(status, text_width), style);
                y += 1;
            }
        }

        // The thumbnail speaks for itself
        if y < max_y && !(self.thumb_space && !self.image_failed) {
            let style = Style::default().fg(self.theme.dimmed_alt).bg(bg);
            buf.set_string(text_x, y, truncate(&self.image_line(), text_width), style);
        }
    }
}

/// Truncate string to fit within max_width, adding ellipsis if needed
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width + 1 > max_width {
            result.push('…');
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(buf: &Buffer, y: u16) -> String {
        let area = buf.area;
        (area.x..area.x + area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Subject A", 20), "Subject A");
        assert_eq!(truncate("Known offender", 8), "Known o…");
        assert_eq!(truncate("AB", 2), "AB");
        assert_eq!(truncate("Subject", 1), "…");
    }

    #[test]
    fn test_renders_name_and_image() {
        let theme = Theme::default();
        let subject = Subject::named("Subject A").with_image("images/subject1.jpg");
        let area = Rect::new(0, 0, 24, 3);
        let mut buf = Buffer::empty(area);

        SubjectCard::new(&subject, &theme).render(area, &mut buf);
        assert_eq!(row_text(&buf, 0), " Subject A");
        assert_eq!(row_text(&buf, 1), " IMG subject1.jpg");
    }

    #[test]
    fn test_failed_image_shows_placeholder() {
        let theme = Theme::default();
        let subject = Subject::named("Subject B").with_image("images/subject2.jpg");
        let area = Rect::new(0, 0, 24, 3);
        let mut buf = Buffer::empty(area);

        SubjectCard::new(&subject, &theme)
            .image_failed(true)
            .render(area, &mut buf);
        assert_eq!(row_text(&buf, 1), " NO IMAGE");
    }

    #[test]
    fn test_thumb_space_shifts_text() {
        let theme = Theme::default();
        let subject = Subject::named("John Doe").with_image("images/john.jpg");
        let area = Rect::new(0, 0, 24, 3);
        let mut buf = Buffer::empty(area);

        SubjectCard::new(&subject, &theme)
            .thumb_space(true)
            .render(area, &mut buf);
        assert_eq!(row_text(&buf, 0), "         John Doe");
        assert_eq!(row_text(&buf, 1), "");
    }
}
