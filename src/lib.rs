#![doc = "drive-optima: AI-assisted reorganisation plans for a hierarchical file store."]

//! The hierarchy model and the mock drive feed an external classifier through
//! the [`contract::Classifier`] seam; the dashboard state machine turns the
//! returned report into selectable, appliable recommendations.

pub mod cli;
pub mod config;
pub mod contract;
pub mod dashboard;
pub mod distribution;
pub mod error;
pub mod gemini;
pub mod mock_drive;
pub mod model;
pub mod prompt;
pub mod render;
pub mod session;

pub use cli::{run, Cli, Commands};
