//! Minimal abstraction for the single-wire J1850 line. Implementations hide
//! the physical polarity of the transceiver: the driver only reasons about
//! the logical [`BusState`].
use crate::core::BusState;

/// Contract to drive and sample the bus.
///
/// Output and input are independent paths: sampling while driving passive
/// reads back whatever the other nodes put on the wire, which is how the
/// transmitter detects collisions.
pub trait BusLine {
    /// Drive the dominant state.
    fn drive_active(&mut self);
    /// Release the bus to the recessive state.
    fn drive_passive(&mut self);
    /// Sample the wire; `true` when the bus is active.
    fn is_active(&mut self) -> bool;

    /// Sampled state as a [`BusState`].
    fn state(&mut self) -> BusState {
        BusState::from_active(self.is_active())
    }

    /// Drive `state`.
    fn drive(&mut self, state: BusState) {
        match state {
            BusState::Active => self.drive_active(),
            BusState::Passive => self.drive_passive(),
        }
    }
}
