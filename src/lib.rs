// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod motion;
pub mod records;
pub mod runtime;
pub mod scramble;
pub mod sensor;
pub mod session;
pub mod stats;
pub mod timer;
pub mod ui;
