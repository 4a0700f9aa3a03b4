//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Diagnostics for rejected model operations (out-of-range arguments,
//! duplicate attachment, malformed drag payloads) are emitted at `warn`
//! level; signal dispatch is traced at `trace` level. Use the constants in
//! [`targets`] with `tracing` filter directives to narrow output to a
//! subsystem, e.g. `RUST_LOG=trellis::model=warn`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "trellis_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Item and model operations target.
    pub const MODEL: &str = "trellis::model";
    /// Drag payload codec target.
    pub const MIME: &str = "trellis::model::mime";
}
