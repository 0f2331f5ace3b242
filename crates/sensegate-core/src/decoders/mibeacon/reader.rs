use super::error::MiBeaconError;
use super::layout;

/// Cursor over an advertisement; field widths are fixed, field presence
/// is decided by the frame-control bits, so reads are sequential.
pub struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], MiBeaconError> {
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(MiBeaconError::TooShort {
                needed: end,
                actual: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, MiBeaconError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, MiBeaconError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16_le(&mut self) -> Result<i16, MiBeaconError> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24_le(&mut self) -> Result<u32, MiBeaconError> {
        let bytes = self.take(3)?;
        Ok(u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16)
    }

    /// Read the 6-byte MAC address, reversing wire order into canonical
    /// display order.
    pub fn read_mac(&mut self) -> Result<[u8; layout::MAC_LEN], MiBeaconError> {
        let bytes = self.take(layout::MAC_LEN)?;
        let mut mac = [0u8; layout::MAC_LEN];
        for (slot, byte) in mac.iter_mut().zip(bytes.iter().rev()) {
            *slot = *byte;
        }
        Ok(mac)
    }
}
