//! SAE J1850 VPW timing windows.
//!
//! The standard defines every symbol in microseconds; the driver measures
//! pulses with a free-running counter, so the windows are converted once into
//! tick counts for the counter's frequency and stored in a [`Timing`] table.
//! Only the conversion depends on the clock: the ratios between windows are
//! fixed by the standard.
use crate::core::BusState;
use embassy_time::Duration;

//==================================================================================NOMINAL_TX
/// Short pulse nominal width.
pub const TX_SHORT: Duration = Duration::from_micros(64);
/// Long pulse nominal width.
pub const TX_LONG: Duration = Duration::from_micros(128);
/// Start Of Frame nominal width.
pub const TX_SOF: Duration = Duration::from_micros(200);
/// End Of Data nominal width.
pub const TX_EOD: Duration = Duration::from_micros(200);
/// End Of Frame nominal width.
pub const TX_EOF: Duration = Duration::from_micros(280);
/// Break nominal width.
pub const TX_BRK: Duration = Duration::from_micros(300);
/// Inter Frame Separation nominal width.
pub const TX_IFS: Duration = Duration::from_micros(300);

//==================================================================================RX_WINDOWS
pub const RX_SHORT_MIN: Duration = Duration::from_micros(34);
pub const RX_SHORT_MAX: Duration = Duration::from_micros(96);
pub const RX_LONG_MIN: Duration = Duration::from_micros(96);
pub const RX_LONG_MAX: Duration = Duration::from_micros(163);
pub const RX_SOF_MIN: Duration = Duration::from_micros(163);
pub const RX_SOF_MAX: Duration = Duration::from_micros(239);
pub const RX_EOD_MIN: Duration = Duration::from_micros(163);
pub const RX_EOD_MAX: Duration = Duration::from_micros(239);
/// End Of Frame lower bound; the symbol lasts until the minimum IFS.
pub const RX_EOF_MIN: Duration = Duration::from_micros(239);
pub const RX_BRK_MIN: Duration = Duration::from_micros(239);
/// Inter Frame Separation lower bound; ends at the next SOF.
pub const RX_IFS_MIN: Duration = Duration::from_micros(280);

/// Passive time after which the receiver reports that nobody is talking.
pub const LISTEN_WINDOW: Duration = Duration::from_micros(100);

/// Convert a duration into counter ticks at `timer_hz`, rounding down.
pub const fn us_to_ticks(duration: Duration, timer_hz: u32) -> u16 {
    let ticks = duration.as_micros() * timer_hz as u64 / 1_000_000;
    if ticks > u16::MAX as u64 {
        u16::MAX
    } else {
        ticks as u16
    }
}

//==================================================================================PULSE_WIDTH
/// Classification of a measured pulse against the short/long windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseWidth {
    /// Below the shortest valid symbol: always a bus error.
    TooShort,
    /// Inside `[short_min, short_max)`.
    Short,
    /// Inside `(long_min, long_max)`.
    Long,
    /// Valid length but inside neither data window.
    Undefined,
}

impl PulseWidth {
    /// Bit carried by a pulse of this width held in `state`.
    ///
    /// A `1` is a short active or a long passive symbol; a `0` is a long
    /// active or a short passive symbol. Returns `None` outside both windows.
    pub const fn bit(self, state: BusState) -> Option<bool> {
        match (self, state) {
            (PulseWidth::Short, BusState::Active) | (PulseWidth::Long, BusState::Passive) => {
                Some(true)
            }
            (PulseWidth::Short, BusState::Passive) | (PulseWidth::Long, BusState::Active) => {
                Some(false)
            }
            _ => None,
        }
    }
}

//==================================================================================TIMING
/// Every VPW window expressed in ticks of the pulse timer.
///
/// Fields are public so boards with unusual transceivers can widen or narrow
/// individual windows after conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub tx_short: u16,
    pub tx_long: u16,
    pub tx_sof: u16,
    pub tx_eod: u16,
    pub tx_eof: u16,
    pub tx_brk: u16,
    pub tx_ifs: u16,
    pub rx_short_min: u16,
    pub rx_short_max: u16,
    pub rx_long_min: u16,
    pub rx_long_max: u16,
    pub rx_sof_min: u16,
    pub rx_sof_max: u16,
    pub rx_eod_min: u16,
    pub rx_eod_max: u16,
    pub rx_eof_min: u16,
    pub rx_brk_min: u16,
    pub rx_ifs_min: u16,
    /// Passive time before [`crate::error::VpwError::NoData`].
    pub listen_window: u16,
}

impl Timing {
    /// Timing table for a pulse timer counting at `timer_hz`.
    pub const fn from_timer_hz(timer_hz: u32) -> Self {
        Self {
            tx_short: us_to_ticks(TX_SHORT, timer_hz),
            tx_long: us_to_ticks(TX_LONG, timer_hz),
            tx_sof: us_to_ticks(TX_SOF, timer_hz),
            tx_eod: us_to_ticks(TX_EOD, timer_hz),
            tx_eof: us_to_ticks(TX_EOF, timer_hz),
            tx_brk: us_to_ticks(TX_BRK, timer_hz),
            tx_ifs: us_to_ticks(TX_IFS, timer_hz),
            rx_short_min: us_to_ticks(RX_SHORT_MIN, timer_hz),
            rx_short_max: us_to_ticks(RX_SHORT_MAX, timer_hz),
            rx_long_min: us_to_ticks(RX_LONG_MIN, timer_hz),
            rx_long_max: us_to_ticks(RX_LONG_MAX, timer_hz),
            rx_sof_min: us_to_ticks(RX_SOF_MIN, timer_hz),
            rx_sof_max: us_to_ticks(RX_SOF_MAX, timer_hz),
            rx_eod_min: us_to_ticks(RX_EOD_MIN, timer_hz),
            rx_eod_max: us_to_ticks(RX_EOD_MAX, timer_hz),
            rx_eof_min: us_to_ticks(RX_EOF_MIN, timer_hz),
            rx_brk_min: us_to_ticks(RX_BRK_MIN, timer_hz),
            rx_ifs_min: us_to_ticks(RX_IFS_MIN, timer_hz),
            listen_window: us_to_ticks(LISTEN_WINDOW, timer_hz),
        }
    }

    /// Timing table for a timer clocked from `xtal_hz` through `prescaler`.
    ///
    /// An 8-bit AVR timer running at `F_CPU / 8` is `for_mcu(f_cpu, 8)`.
    pub const fn for_mcu(xtal_hz: u32, prescaler: u32) -> Self {
        Self::from_timer_hz(xtal_hz / prescaler)
    }

    /// Classify a measured pulse width.
    pub const fn classify(&self, width: u16) -> PulseWidth {
        if width < self.rx_short_min {
            PulseWidth::TooShort
        } else if width < self.rx_short_max {
            PulseWidth::Short
        } else if width > self.rx_long_min && width < self.rx_long_max {
            PulseWidth::Long
        } else {
            PulseWidth::Undefined
        }
    }

    /// Nominal width of the symbol sending `bit` in `state`.
    pub const fn symbol_width(&self, state: BusState, bit: bool) -> u16 {
        match (state, bit) {
            (BusState::Active, true) | (BusState::Passive, false) => self.tx_short,
            (BusState::Active, false) | (BusState::Passive, true) => self.tx_long,
        }
    }
}

impl Default for Timing {
    /// One tick per microsecond.
    fn default() -> Self {
        Self::from_timer_hz(1_000_000)
    }
}
