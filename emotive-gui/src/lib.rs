//! Desktop GUI for real-time face emotion detection (Library).

pub mod app;
pub mod app_impl;
pub mod core;
pub mod theme;
pub mod types;
pub mod ui;

pub use types::*;
pub use ui::{cards::CardListView, controls::ControlAction};
