//! TUI module: Terminal User Interface using Ratatui.
//!
//! - Clinical data form with range-checked fields
//! - Prediction result with the diabetes type on positive findings

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::ClinicalTheme;
