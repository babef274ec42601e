//! Terminal front end: command parsing, environment config and text rendering.
mod app;
mod command;
mod config;
mod render;

pub use app::run_app;
