//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Workflows and chain client produce:
//!     → logging.rs (structured log events on stderr)
//! ```

pub mod logging;

pub use logging::init_logging;
