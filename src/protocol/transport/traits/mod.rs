//! Capability traits used by the transport layer (bus line, pulse clock, and
//! async timer). Swapping them for deterministic fakes lets pulse trains be
//! simulated without hardware.
pub mod bus_line;
pub mod vpw_clock;
pub mod vpw_timer;
