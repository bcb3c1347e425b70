//! Shared UI theme constants.

use ratatui::style::Color;

pub const TABLE_HEADER: Color = Color::Cyan;
pub const PROMPT: Color = Color::Yellow;
pub const FLASH_ERROR: Color = Color::Red;
pub const HELP_BORDER: Color = Color::Rgb(170, 170, 180);
