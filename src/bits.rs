use crate::{Error, Result};

/// Cursor reading unsigned integers of arbitrary bit width from a byte slice.
///
/// Bits are consumed most-significant first, i.e., network order, so a byte `0b101_00110`
/// read as a 3 bit and then a 5 bit value yields `5` and `6`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, pos: 0 }
    }

    /// Current offset in bits from the start of the data.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Read `width` bits, `1..=64`, as an unsigned integer.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if fewer than `width` bits remain. Nothing is consumed in
    /// that case.
    pub fn read(&mut self, width: u32) -> Result<u64> {
        let width = width as usize;
        debug_assert!((1..=64).contains(&width), "invalid bit width {width}");
        if width > self.remaining() {
            return Err(Error::NotEnoughData {
                actual: self.remaining(),
                minimum: width,
            });
        }

        let mut value: u64 = 0;
        let mut need = width;
        while need > 0 {
            let byte = self.data[self.pos / 8];
            let used = self.pos % 8;
            let avail = 8 - used;
            let take = avail.min(need);
            // bits [used, used + take) of this byte, counted from the MSB
            let bits = (byte >> (avail - take)) & (0xff >> (8 - take));
            value = (value << take) | u64::from(bits);
            self.pos += take;
            need -= take;
        }
        Ok(value)
    }

    /// Read `count` consecutive values of `width` bits each.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if there are not enough bits for all values.
    pub fn read_many(&mut self, width: u32, count: usize) -> Result<Vec<u64>> {
        let minimum = width as usize * count;
        if minimum > self.remaining() {
            return Err(Error::NotEnoughData {
                actual: self.remaining(),
                minimum,
            });
        }
        if width == 16 && self.pos % 8 == 0 {
            // aligned big-endian words are the common case for packet arrays
            let start = self.pos / 8;
            let values = self.data[start..start + count * 2]
                .chunks_exact(2)
                .map(|w| u64::from(u16::from_be_bytes([w[0], w[1]])))
                .collect();
            self.pos += minimum;
            return Ok(values);
        }
        (0..count).map(|_| self.read(width)).collect()
    }
}
