//! Core library: session state, upload intake, rendering, and the
//! validate / chat flows with their mock fallbacks.

pub mod config;
pub mod intake;
pub mod mock;
pub mod models;
pub mod presenter;
pub mod render;
pub mod session;
pub mod state;
