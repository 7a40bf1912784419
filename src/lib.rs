// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod quote;
pub mod quote_source;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod ticker;
pub mod ui;
