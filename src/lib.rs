#![allow(clippy::uninlined_format_args)]

pub mod apod;
pub mod app;
pub mod config;
pub mod data;
pub mod gallery;
pub mod loader;
pub mod logging;
pub mod media;
pub mod preview;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{run, RunOptions};
