pub mod core;
pub mod icons;
pub mod render;
pub mod tui_main;
