//! # Vayu Core
//!
//! Shared runtime infrastructure for the hub:
//! - [`ReadingWindow`]: the bounded live window of recent readings
//! - `observability`: tracing bootstrap (bounded stdout + rotated file)

pub mod observability;
pub mod window;

pub use window::ReadingWindow;
