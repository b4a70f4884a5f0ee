pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod filter;
pub mod logging;
pub mod models;
pub mod report;
pub mod router;
pub mod session;
pub mod theme;
pub mod tui;
