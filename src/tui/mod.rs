//! TUI module: Terminal User Interface using Ratatui.
//!
//! One page holds the patient form, the predict action and the result.

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
