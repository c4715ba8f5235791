//! Software-timed J1850 VPW driver.
//!
//! [`VpwBus`] owns the [`BusLine`] and the [`VpwClock`] for its whole life:
//! receive and transmit are blocking busy-wait state machines that must not
//! share either resource with anything else while they run. Every wait is
//! bounded by a window of the [`Timing`] table, so every call returns.
use crate::{
    core::{Frame, MAX_FRAME_LEN},
    error::VpwError,
    infra::timing::Timing,
    protocol::transport::{
        traits::{bus_line::BusLine, vpw_clock::VpwClock},
        DEFAULT_TIMEOUT_MULTIPLIER, LISTEN_WINDOWS_PER_STEP,
    },
};

mod receiver;
mod transmitter;

/// Handling of a pulse that is long enough to be valid but falls inside
/// neither the short nor the long window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodePolicy {
    /// Decode it as a `0` bit and keep going.
    #[default]
    Lenient,
    /// Abort the frame with [`VpwError::BusError`].
    Strict,
}

/// Driver configuration, fixed at construction and adjustable through the
/// accessors of [`VpwBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VpwConfig {
    /// Windows converted for the pulse timer frequency.
    pub timing: Timing,
    /// Number of 4 ms steps [`VpwBus::receive_timeout`] keeps listening.
    pub timeout_multiplier: u8,
    pub decode_policy: DecodePolicy,
}

impl VpwConfig {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            timeout_multiplier: DEFAULT_TIMEOUT_MULTIPLIER,
            decode_policy: DecodePolicy::Lenient,
        }
    }

    pub fn with_timeout_multiplier(mut self, multiplier: u8) -> Self {
        self.timeout_multiplier = multiplier;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }
}

impl Default for VpwConfig {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

//==================================================================================VPW_BUS
/// J1850 VPW node: one line, one pulse clock, one configuration.
pub struct VpwBus<L: BusLine, C: VpwClock> {
    line: L,
    clock: C,
    config: VpwConfig,
}

impl<L: BusLine, C: VpwClock> VpwBus<L, C> {
    /// Take ownership of the line and clock and release the bus.
    ///
    /// The line must already be configured as an output plus a pulled-up
    /// input; this only places it in the passive state.
    pub fn new(mut line: L, mut clock: C, config: VpwConfig) -> Self {
        line.drive_passive();
        clock.stop();
        Self {
            line,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &VpwConfig {
        &self.config
    }

    pub fn timing(&self) -> &Timing {
        &self.config.timing
    }

    pub fn timeout_multiplier(&self) -> u8 {
        self.config.timeout_multiplier
    }

    pub fn set_timeout_multiplier(&mut self, multiplier: u8) {
        self.config.timeout_multiplier = multiplier;
    }

    pub fn decode_policy(&self) -> DecodePolicy {
        self.config.decode_policy
    }

    pub fn set_decode_policy(&mut self, policy: DecodePolicy) {
        self.config.decode_policy = policy;
    }

    /// Give the line and the clock back. The line is left passive.
    pub fn release(mut self) -> (L, C) {
        self.line.drive_passive();
        (self.line, self.clock)
    }

    /// Keep listening for up to `timeout_multiplier` × 4 ms.
    ///
    /// Returns the first frame or the first error other than
    /// [`VpwError::NoData`]. A multiplier of zero listens once.
    pub fn receive_timeout(&mut self, buffer: &mut [u8; MAX_FRAME_LEN]) -> Result<usize, VpwError> {
        let windows = (self.config.timeout_multiplier as u32 * LISTEN_WINDOWS_PER_STEP).max(1);
        for _ in 0..windows {
            match self.receive(buffer) {
                Err(VpwError::NoData) => continue,
                other => return other,
            }
        }
        Err(VpwError::NoData)
    }

    /// Receive one frame into a [`Frame`]. An empty frame (SOF directly
    /// followed by EOD) is reported as [`VpwError::DataError`].
    pub fn receive_frame(&mut self) -> Result<Frame, VpwError> {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = self.receive(&mut buffer)?;
        Frame::new(&buffer[..len])
    }

    /// Transmit a [`Frame`].
    pub fn transmit_frame(&mut self, frame: &Frame) -> Result<(), VpwError> {
        self.transmit(frame.as_bytes())
    }
}
