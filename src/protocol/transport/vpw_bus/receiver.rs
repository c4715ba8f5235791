//! VPW receiver: decodes one frame from the pulse widths seen on the line.
use crate::{
    core::{BusState, MAX_FRAME_LEN},
    error::VpwError,
    infra::timing::PulseWidth,
    protocol::transport::traits::{bus_line::BusLine, vpw_clock::VpwClock},
};

use super::{DecodePolicy, VpwBus};

impl<L: BusLine, C: VpwClock> VpwBus<L, C> {
    /// Receive one frame into `buffer`.
    ///
    /// Returns the number of complete bytes written (`0..=12`). Bytes past the
    /// returned count are left untouched, including a byte cut short by the
    /// end of data. A frame longer than twelve bytes is truncated at twelve.
    ///
    /// # Errors
    ///
    /// - [`VpwError::NoData`] when the bus stays passive for the listen window.
    /// - [`VpwError::BusError`] on a malformed SOF or a pulse shorter than the
    ///   short window (or outside both data windows under
    ///   [`DecodePolicy::Strict`]).
    pub fn receive(&mut self, buffer: &mut [u8; MAX_FRAME_LEN]) -> Result<usize, VpwError> {
        let timing = self.config.timing;

        // Wait for activity.
        self.clock.start();
        while !self.line.is_active() {
            if self.clock.ticks() >= timing.listen_window {
                self.clock.stop();
                return Err(VpwError::NoData);
            }
        }

        // The first active symbol must be a SOF.
        self.clock.start();
        while self.line.is_active() {
            if self.clock.ticks() >= timing.rx_sof_max {
                self.clock.stop();
                #[cfg(feature = "defmt")]
                defmt::debug!("SOF longer than {} ticks", timing.rx_sof_max);
                return Err(VpwError::BusError);
            }
        }
        self.clock.stop();
        let sof = self.clock.ticks();
        if sof < timing.rx_sof_min {
            #[cfg(feature = "defmt")]
            defmt::debug!("SOF too short: {} ticks", sof);
            return Err(VpwError::BusError);
        }

        let mut held = self.line.state();
        self.clock.start();
        for (nbytes, slot) in buffer.iter_mut().enumerate() {
            let mut byte = 0u8;
            for _ in 0..8 {
                // Measure the symbol held since the last edge. Holding it up
                // to the EOD minimum ends the frame.
                while self.line.state() == held {
                    if self.clock.ticks() >= timing.rx_eod_min {
                        self.clock.stop();
                        #[cfg(feature = "defmt")]
                        defmt::trace!("EOD after {} bytes", nbytes);
                        return Ok(nbytes);
                    }
                }
                self.clock.stop();
                let width = self.clock.ticks();
                let pulse = held;
                held = pulse.toggled();

                let bit = self.decode_symbol(width, pulse)?;
                byte = (byte << 1) | bit as u8;
                self.clock.start();
            }
            *slot = byte;
        }

        self.clock.stop();
        Ok(MAX_FRAME_LEN)
    }

    /// Bit carried by a completed symbol of `width` ticks held in `pulse`.
    fn decode_symbol(&self, width: u16, pulse: BusState) -> Result<bool, VpwError> {
        let class = self.config.timing.classify(width);
        if class == PulseWidth::TooShort {
            #[cfg(feature = "defmt")]
            defmt::debug!("pulse too short: {} ticks", width);
            return Err(VpwError::BusError);
        }
        match (class.bit(pulse), self.config.decode_policy) {
            (Some(bit), _) => Ok(bit),
            (None, DecodePolicy::Lenient) => Ok(false),
            (None, DecodePolicy::Strict) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("pulse outside data windows: {} ticks", width);
                Err(VpwError::BusError)
            }
        }
    }
}
