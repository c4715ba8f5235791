//! J1850 VPW transport layer: bus line adapters, capability traits, and the
//! software-timed driver receiving and transmitting frames.
//!
//! ## Response timeout
//!
//! The driver listens for activity in short fixed windows
//! ([`LISTEN_WINDOW`](crate::infra::timing::LISTEN_WINDOW), 100 µs). Waiting
//! for a response chains those windows in steps of
//! [`TIMEOUT_STEP_MS`]; the number of steps is the timeout multiplier.

pub mod line;
pub mod traits;
pub mod vpw_bus;

/// Granularity of the response timeout (ms).
pub const TIMEOUT_STEP_MS: u32 = 4;

/// Listen windows per timeout step: 40 × 100 µs = 4 ms.
pub const LISTEN_WINDOWS_PER_STEP: u32 = 40;

/// Default timeout multiplier.
///
/// # Rationale
///
/// - 25 steps × 4 ms = 100 ms, enough for a radio head unit to answer a
///   changer announcement.
/// - Applications polling a slower bus may raise it through
///   [`VpwBus::set_timeout_multiplier`](vpw_bus::VpwBus::set_timeout_multiplier).
pub const DEFAULT_TIMEOUT_MULTIPLIER: u8 = 25;
