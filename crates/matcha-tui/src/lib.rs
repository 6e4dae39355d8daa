//! # matcha-tui
//!
//! Interactive ratatui viewer for abundance-matching runs, built on the Elm
//! architecture: a background thread streams [`TuiMessage`]s, the model
//! folds them in, and every frame is rendered from the model alone.

pub mod bridge;
pub mod chart;
pub mod footer;
pub mod header;
pub mod keymap;
pub mod logs;
pub mod messages;
pub mod model;
pub mod styles;

pub use bridge::{TUIResultPresenter, TuiBridgeObserver};
pub use logs::LogScrollState;
pub use messages::TuiMessage;
pub use model::TuiApp;
