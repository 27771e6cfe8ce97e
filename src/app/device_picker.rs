// SPDX-License-Identifier: GPL-3.0-only

//! Device picker sheet listing the discovered inputs

use crate::backends::camera::InputDevice;
use crate::constants::ui;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

/// Picker open/selection state
#[derive(Debug, Default)]
pub struct DevicePicker {
    open: bool,
    list: ListState,
}

impl DevicePicker {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open with the cursor on `current` (or the first entry)
    pub fn open(&mut self, devices: &[InputDevice], current: Option<&InputDevice>) {
        let index = current
            .and_then(|cur| devices.iter().position(|d| d.unique_id == cur.unique_id))
            .unwrap_or(0);
        self.list.select((!devices.is_empty()).then_some(index));
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.list.selected().map_or(0, |i| (i + 1) % len);
        self.list.select(Some(i));
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.list.selected().map_or(0, |i| (i + len - 1) % len);
        self.list.select(Some(i));
    }

    /// Close the sheet and return the highlighted device
    pub fn confirm(&mut self, devices: &[InputDevice]) -> Option<InputDevice> {
        self.open = false;
        self.list.selected().and_then(|i| devices.get(i)).cloned()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list.selected()
    }

    /// Bottom sheet area inside `area`
    pub fn sheet_area(area: Rect) -> Rect {
        let height = ((area.height as u32 * ui::PICKER_HEIGHT_PERCENT as u32) / 100)
            .max(3)
            .min(area.height as u32) as u16;
        Rect::new(area.x, area.bottom() - height, area.width, height)
    }

    pub fn render(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        devices: &[InputDevice],
        current: Option<&InputDevice>,
    ) {
        let sheet = Self::sheet_area(area);
        Clear.render(sheet, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Cameras ")
            .title_bottom(Line::from(" ↑/↓ select · Enter switch · Esc close "));

        if devices.is_empty() {
            let inner = block.inner(sheet);
            block.render(sheet, buf);
            // Borders eat the whole sheet on very short terminals
            if inner.height > 0 && inner.width > 0 {
                buf.set_string(inner.x, inner.y, "No cameras found", Style::default());
            }
            return;
        }

        let items: Vec<ListItem> = devices
            .iter()
            .map(|device| {
                let marker = if current.is_some_and(|c| c.unique_id == device.unique_id) {
                    "● "
                } else {
                    "  "
                };
                ListItem::new(format!(
                    "{}{}  [{}]  {}",
                    marker, device.display_name, device.kind, device.unique_id
                ))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        StatefulWidget::render(list, sheet, buf, &mut self.list);
    }
}
