//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a downstream dependency:
//!     → circuit_breaker.rs (is the call admitted?)
//!     → timeouts.rs (enforce the call deadline)
//!     → circuit_breaker.rs (record success / failure; timeouts are failures)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries here; retry policy belongs to the caller
//! - Circuit breaker prevents cascading failures
//! - Time is injected through `clock.rs` so state machines are testable

pub mod circuit_breaker;
pub mod clock;
pub mod timeouts;

pub use circuit_breaker::{Gate, GateConfig, GatePermit, GateSnapshot, GateState};
pub use clock::{Clock, ManualClock, SystemClock};
