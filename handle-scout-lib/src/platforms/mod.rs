//! Platform definitions and probing.
//!
//! This module contains the platform registry (which platforms to check and
//! how) and the probe executor (one request and one verdict per platform).

/// Built-in platform table and registry validation
pub mod registry;

/// HTTP probing and response classification
pub mod probe;

// Re-export commonly used functions and types
pub use probe::{classify_response, Prober};
pub use registry::{get_builtin_platform_names, get_builtin_platforms, PlatformRegistry};
