// SPDX-License-Identifier: GPL-3.0-only

//! Error panel shown in place of the preview

use super::{PresentationAction, StatusInfo};
use crate::constants::ui;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

pub struct ErrorPanel {
    pub info: StatusInfo,
    pub action: Option<PresentationAction>,
}

/// Centre a `width` x `height` box in `area`, clamped to fit
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

impl Widget for ErrorPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let panel = centered(area, ui::ERROR_PANEL_WIDTH, ui::ERROR_PANEL_HEIGHT);
        Clear.render(panel, buf);

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{}  {}", self.info.glyph, self.info.label),
                Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(self.info.description),
        ];
        if let Some(action) = self.action {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("[o] ", Style::default().fg(Color::Yellow)),
                Span::raw(action.label()),
            ]));
        }

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Camera "))
            .render(panel, buf);
    }
}
