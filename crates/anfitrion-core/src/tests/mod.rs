//! Test infrastructure for falsification testing.
//!
//! # Certeza Methodology - Popperian Falsification
//!
//! | Category | ID Range | Description |
//! |----------|----------|-------------|
//! | A | F001-F020 | Lifecycle bridge |
//! | B | F021-F026 | State machine and exit codes (property-based) |
//! | G | F070-F074 | Service panics, caught faults and stop ordering |

pub mod state;

pub use mocks::{RecordingRuntime, ScriptedEnvironment, SpyService};
