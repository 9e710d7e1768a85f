//! Falsification categories exercised end to end through the public API.
//!
//! Categories A and B live next to the bridge in `anfitrion-core`.

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod configuration;
mod lifecycle;
mod platform;
