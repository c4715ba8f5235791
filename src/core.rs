//! Data types shared by the VPW transport and the application layer: the two
//! logical bus states and the fixed-capacity J1850 frame.
use crate::error::VpwError;
use crate::infra::crc::checksum;

/// Maximum number of bytes in a J1850 frame (header, data, and checksum).
pub const MAX_FRAME_LEN: usize = 12;

//==================================================================================BUS_STATE
/// Logical state of the single-wire bus, independent of the physical polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Dominant state; wins contention when several nodes drive the bus.
    Active,
    /// Recessive state; the bus rests here when nobody drives it.
    Passive,
}

impl BusState {
    /// Map a sampled "is active" flag onto a state.
    pub const fn from_active(active: bool) -> Self {
        if active {
            BusState::Active
        } else {
            BusState::Passive
        }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, BusState::Active)
    }

    /// The opposite state.
    pub const fn toggled(self) -> Self {
        match self {
            BusState::Active => BusState::Passive,
            BusState::Passive => BusState::Active,
        }
    }

    /// State of the symbol carrying bit `index` of a byte (0 = most significant).
    ///
    /// Every byte starts right after a passive-to-active or SOF edge, so even
    /// positions are passive symbols and odd positions are active ones.
    pub const fn for_bit_index(index: u8) -> Self {
        if index % 2 == 0 {
            BusState::Passive
        } else {
            BusState::Active
        }
    }
}

//==================================================================================FRAME
/// J1850 frame: 1 to [`MAX_FRAME_LEN`] bytes, stored inline without allocation.
///
/// By convention the last byte is the checksum trailer computed by
/// [`checksum`]; the transport does not enforce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    data: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl Frame {
    /// Copy `bytes` into a frame. Fails with [`VpwError::DataError`] when the
    /// length is 0 or exceeds [`MAX_FRAME_LEN`].
    pub fn new(bytes: &[u8]) -> Result<Self, VpwError> {
        if bytes.is_empty() || bytes.len() > MAX_FRAME_LEN {
            return Err(VpwError::DataError);
        }
        let mut data = [0u8; MAX_FRAME_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            data,
            len: bytes.len(),
        })
    }

    /// Build a frame from `payload` followed by its checksum trailer.
    pub fn with_checksum(payload: &[u8]) -> Result<Self, VpwError> {
        if payload.is_empty() || payload.len() >= MAX_FRAME_LEN {
            return Err(VpwError::DataError);
        }
        let mut data = [0u8; MAX_FRAME_LEN];
        data[..payload.len()].copy_from_slice(payload);
        data[payload.len()] = checksum(payload);
        Ok(Self {
            data,
            len: payload.len() + 1,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Bytes preceding the checksum trailer.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len - 1]
    }

    /// Last byte of the frame, conventionally the checksum.
    pub fn trailer(&self) -> u8 {
        self.data[self.len - 1]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a frame holds at least one byte.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when the trailer matches the checksum of the preceding bytes.
    /// Single-byte frames carry no payload to protect and never validate.
    pub fn has_valid_checksum(&self) -> bool {
        self.len >= 2 && checksum(self.payload()) == self.trailer()
    }
}
