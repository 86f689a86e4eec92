//! medlens-tui: Terminal UI components
//!
//! A small terminal UI layer built on ratatui and crossterm: an app runner,
//! input actions, a theme, and the widgets the analyzer page needs.

pub mod app;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use theme::Theme;
