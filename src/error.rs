//! Error definitions shared across library modules.
//! The bus driver reports exactly three failure kinds; the legacy numeric
//! status codes are kept for firmware that forwards driver status as a byte.
use thiserror_no_std::Error;

//==================================================================================VPW_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures reported by the VPW receiver and transmitter.
pub enum VpwError {
    /// No activity within the short listen window. Expected while polling.
    #[error("No data: bus stayed passive during the listen window")]
    NoData,
    /// Timing violation (malformed SOF, pulse too short) or a transmit collision.
    #[error("Bus error: timing violation or collision")]
    BusError,
    /// Frame length outside `1..=12` bytes; detected before touching the bus.
    #[error("Data error: invalid frame length")]
    DataError,
}

impl VpwError {
    /// Legacy status code of this error.
    pub const fn code(self) -> ReturnCode {
        match self {
            VpwError::NoData => ReturnCode::NoData,
            VpwError::BusError => ReturnCode::BusError,
            VpwError::DataError => ReturnCode::DataError,
        }
    }
}

//==================================================================================RETURN_CODE
/// Numeric status codes used by byte-oriented firmware interfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReturnCode {
    Unknown = 0,
    Ok = 1,
    BusBusy = 2,
    BusError = 3,
    DataError = 4,
    NoData = 5,
    Data = 6,
}

/// Flag marking an error in a packed receive status byte.
pub const RECEIVE_ERROR_FLAG: u8 = 0x80;

impl From<u8> for ReturnCode {
    fn from(value: u8) -> Self {
        match value {
            1 => ReturnCode::Ok,
            2 => ReturnCode::BusBusy,
            3 => ReturnCode::BusError,
            4 => ReturnCode::DataError,
            5 => ReturnCode::NoData,
            6 => ReturnCode::Data,
            _ => ReturnCode::Unknown,
        }
    }
}

/// Pack a receive result into one byte: the byte count on success, the error
/// code with [`RECEIVE_ERROR_FLAG`] set otherwise.
pub fn encode_receive_status(result: Result<usize, VpwError>) -> u8 {
    match result {
        Ok(count) => count as u8 & !RECEIVE_ERROR_FLAG,
        Err(err) => err.code() as u8 | RECEIVE_ERROR_FLAG,
    }
}

/// Unpack a status byte produced by [`encode_receive_status`]. Unknown error
/// codes are reported as [`VpwError::BusError`].
pub fn decode_receive_status(status: u8) -> Result<usize, VpwError> {
    if status & RECEIVE_ERROR_FLAG == 0 {
        return Ok(status as usize);
    }
    match ReturnCode::from(status & !RECEIVE_ERROR_FLAG) {
        ReturnCode::NoData => Err(VpwError::NoData),
        ReturnCode::DataError => Err(VpwError::DataError),
        _ => Err(VpwError::BusError),
    }
}
