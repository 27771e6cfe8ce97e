// SPDX-License-Identifier: GPL-3.0-only

//! Camera overlay: rule-of-thirds grid and shutter affordance

use crate::constants::ui;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

/// Faint grid splitting the preview into thirds
pub struct GridOverlay;

/// Column/row offsets of the grid lines inside a span of `len` cells
pub fn grid_lines(len: u16) -> Vec<u16> {
    (1..ui::GRID_DIVISIONS)
        .map(|i| (len as u32 * i as u32 / ui::GRID_DIVISIONS as u32) as u16)
        .filter(|&offset| offset > 0 && offset < len)
        .collect()
}

impl Widget for GridOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::Gray).add_modifier(Modifier::DIM);
        let columns = grid_lines(area.width);
        let rows = grid_lines(area.height);

        for &dx in &columns {
            for y in area.top()..area.bottom() {
                if let Some(cell) = buf.cell_mut((area.x + dx, y)) {
                    cell.set_char('│');
                    cell.set_style(style);
                }
            }
        }
        for &dy in &rows {
            for x in area.left()..area.right() {
                let ch = if columns.iter().any(|&dx| area.x + dx == x) {
                    '┼'
                } else {
                    '─'
                };
                if let Some(cell) = buf.cell_mut((x, area.y + dy)) {
                    cell.set_char(ch);
                    cell.set_style(style);
                }
            }
        }
    }
}

/// Shutter ring drawn at the bottom centre of the preview
pub struct ShutterButton;

impl ShutterButton {
    /// Where the ring is drawn inside `area`, or `None` if it does not fit
    pub fn placement(area: Rect) -> Option<Rect> {
        let width = ui::SHUTTER_OUTER_WIDTH;
        let height = ui::SHUTTER_OUTER_HEIGHT;
        if area.width < width || area.height < height + ui::SHUTTER_BOTTOM_PADDING {
            return None;
        }
        Some(Rect::new(
            area.x + (area.width - width) / 2,
            area.bottom() - height - ui::SHUTTER_BOTTOM_PADDING,
            width,
            height,
        ))
    }
}

impl Widget for ShutterButton {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(ring) = Self::placement(area) else {
            return;
        };
        let ring_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

        let inner = "█".repeat((ring.width - 4) as usize);
        let rows = [
            format!("╭{}╮", "─".repeat((ring.width - 2) as usize)),
            format!("│ {} │", inner),
            format!("╰{}╯", "─".repeat((ring.width - 2) as usize)),
        ];
        for (i, row) in rows.iter().enumerate() {
            buf.set_string(ring.x, ring.y + i as u16, row, ring_style);
        }
    }
}
