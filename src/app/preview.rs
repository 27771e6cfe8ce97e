// SPDX-License-Identifier: GPL-3.0-only

//! Live preview surface
//!
//! Renders the latest frame with Unicode half-block characters: each cell
//! shows two vertical pixels (upper half as foreground, lower half as
//! background).

use crate::backends::camera::PreviewFrame;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, style::Style, widgets::Widget};

/// Widget that renders a preview frame
pub struct PreviewWidget<'a> {
    pub frame: Option<&'a PreviewFrame>,
    /// Flip horizontally (selfie mode)
    pub mirror: bool,
}

/// Where the frame lands inside `area`, keeping its aspect ratio
///
/// Returned rect is in cells; its height covers `2 * height` source rows.
pub fn fit_frame(area: Rect, frame_width: u32, frame_height: u32) -> Rect {
    if frame_width == 0 || frame_height == 0 || area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }

    let frame_aspect = frame_width as f64 / frame_height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;

    let (width, height) = if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        let w = term_height * frame_aspect;
        (w as u16, area.height)
    } else {
        // Terminal is taller - fit to width
        let h = term_width / frame_aspect;
        (area.width, (h / 2.0) as u16)
    };
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let target = fit_frame(area, frame.width, frame.height);
        if target.width == 0 || target.height == 0 {
            return;
        }

        let x_scale = frame.width as f64 / target.width as f64;
        let y_scale = frame.height as f64 / (target.height as f64 * 2.0);

        for ty in 0..target.height {
            for tx in 0..target.width {
                let src_tx = if self.mirror {
                    target.width - 1 - tx
                } else {
                    tx
                };
                let src_x = (src_tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.sample_rgb(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.sample_rgb(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((target.x + tx, target.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}
