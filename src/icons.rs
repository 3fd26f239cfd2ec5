//! Nerd Font glyphs for launcher entries, used by the TUI rows.
//!
//! Requires a Nerd Font in the terminal for the glyphs to render correctly.
//! Custom entry icons are image paths and cannot be drawn in a terminal; an
//! entry whose icon file exists gets the picture glyph instead.

use crate::render::DisplayRow;

pub const FOLDER_OPEN: &str = "\u{f07c}"; // nf-fa-folder_open
pub const FOLDER_CLOSED: &str = "\u{f07b}"; // nf-fa-folder
pub const CUSTOM_ICON: &str = "\u{f03e}"; // nf-fa-image

/// Glyph for a row: folder state, custom icon, or a guess from the command.
pub fn entry_icon(row: &DisplayRow) -> &'static str {
    if row.is_folder {
        return if row.is_expanded {
            FOLDER_OPEN
        } else {
            FOLDER_CLOSED
        };
    }
    if row.has_icon {
        return CUSTOM_ICON;
    }
    command_icon(&row.subtitle)
}

/// Return a glyph for the program a command starts.
/// Returns the generic gear for anything unrecognised.
pub fn command_icon(command: &str) -> &'static str {
    let program = command.split_whitespace().next().unwrap_or_default();
    let file = program.rsplit(['/', '\\']).next().unwrap_or(program);
    let (stem, ext) = match file.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_lowercase(), ext.to_lowercase()),
        None => (file.to_lowercase(), String::new()),
    };
    match stem.as_str() {
        "cmd" | "powershell" | "pwsh" | "bash" | "sh" | "zsh" | "fish" | "wt" => {
            return "\u{f489}"; // nf-oct-terminal
        }
        "code" | "vim" | "nvim" | "notepad" | "gedit" => return "\u{f044}", // nf-fa-edit
        "firefox" | "chrome" | "msedge" | "chromium" => return "\u{f0ac}",  // nf-fa-globe
        _ => {}
    }
    match ext.as_str() {
        "exe" | "bat" | "msi" => "\u{f17a}",   // nf-fa-windows
        "sh" | "py" | "ps1" => "\u{f489}",     // nf-oct-terminal
        "app" | "desktop" => "\u{f2d0}",       // nf-fa-window_maximize
        _ => "\u{f013}",                       // nf-fa-cog (generic)
    }
}
