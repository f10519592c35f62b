// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod chime;
pub mod clock;
pub mod config;
pub mod flow;
pub mod notice;
pub mod persist;
pub mod runtime;
pub mod session;
pub mod stats;
