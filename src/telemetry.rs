//! Typed views of records decoded with the built-in schemas.
//!
//! Values are copied out of the [Record] as-is; nothing here converts raw values to
//! physical units.
use ndarray::Array2;
use serde::Serialize;

use crate::decode::Record;
use crate::schema::{
    CHECKSUM, END_TIME, FLAGS, HISTOGRAM_BINS, HISTOGRAM_DATA, HISTOGRAM_DETNUM,
    HISTOGRAM_PIXNUM, HISTOGRAM_SYNC, HOUSEKEEPING, HOUSEKEEPING_VALUES, INT_TIME, PIXEL_DATA,
    START_TIME, TIME,
};
use crate::{Error, Result};

fn narrow<T: TryFrom<u64>>(name: &str, value: u64) -> Result<T> {
    T::try_from(value).map_err(|_| Error::FieldShape {
        name: name.to_string(),
    })
}

/// Identifies the pixel a histogram belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelId {
    pub sync: u8,
    pub detector: u8,
    pub pixel: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    pub start_time: u64,
    pub end_time: u64,
    /// One entry per row of `counts`
    pub pixels: Vec<PixelId>,
    /// Shape `(pixels, HISTOGRAM_BINS)`
    pub counts: Array2<u16>,
    pub checksum: u16,
}

impl TryFrom<&Record> for Histogram {
    type Error = Error;

    fn try_from(rec: &Record) -> Result<Self> {
        let mut pixels = Vec::default();
        let mut counts = Vec::default();
        for i in 0.. {
            let sync = format!("{HISTOGRAM_SYNC}{i}");
            if rec.get(&sync).is_none() {
                break;
            }
            let detector = format!("{HISTOGRAM_DETNUM}{i}");
            let pixel = format!("{HISTOGRAM_PIXNUM}{i}");
            pixels.push(PixelId {
                sync: narrow(&sync, rec.scalar(&sync)?)?,
                detector: narrow(&detector, rec.scalar(&detector)?)?,
                pixel: narrow(&pixel, rec.scalar(&pixel)?)?,
            });

            let name = format!("{HISTOGRAM_DATA}{i}");
            let data = rec.array(&name)?;
            if data.len() != HISTOGRAM_BINS {
                return Err(Error::FieldShape { name });
            }
            for v in data {
                counts.push(narrow::<u16>(&name, *v)?);
            }
        }

        let counts = Array2::from_shape_vec((pixels.len(), HISTOGRAM_BINS), counts).map_err(
            |_| Error::FieldShape {
                name: HISTOGRAM_DATA.to_string(),
            },
        )?;

        Ok(Histogram {
            start_time: rec.scalar(START_TIME)?,
            end_time: rec.scalar(END_TIME)?,
            pixels,
            counts,
            checksum: narrow(CHECKSUM, rec.scalar(CHECKSUM)?)?,
        })
    }
}

impl Histogram {
    /// Total counts for each pixel.
    #[must_use]
    pub fn totals(&self) -> Vec<u64> {
        self.counts
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| u64::from(*v)).sum())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photon {
    pub time: u64,
    pub int_time: u16,
    pub flags: u16,
    pub checksum: u16,
    pub pixel_data: Vec<u16>,
}

impl TryFrom<&Record> for Photon {
    type Error = Error;

    fn try_from(rec: &Record) -> Result<Self> {
        let pixel_data = rec
            .array(PIXEL_DATA)?
            .iter()
            .map(|v| narrow(PIXEL_DATA, *v))
            .collect::<Result<Vec<u16>>>()?;
        Ok(Photon {
            time: rec.scalar(TIME)?,
            int_time: narrow(INT_TIME, rec.scalar(INT_TIME)?)?,
            flags: narrow(FLAGS, rec.scalar(FLAGS)?)?,
            checksum: narrow(CHECKSUM, rec.scalar(CHECKSUM)?)?,
            pixel_data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Housekeeping {
    pub time: u32,
    pub values: [u16; HOUSEKEEPING_VALUES],
    pub checksum: u16,
}

impl TryFrom<&Record> for Housekeeping {
    type Error = Error;

    fn try_from(rec: &Record) -> Result<Self> {
        let data = rec.array(HOUSEKEEPING)?;
        if data.len() != HOUSEKEEPING_VALUES {
            return Err(Error::FieldShape {
                name: HOUSEKEEPING.to_string(),
            });
        }
        let mut values = [0u16; HOUSEKEEPING_VALUES];
        for (dst, src) in values.iter_mut().zip(data) {
            *dst = narrow(HOUSEKEEPING, *src)?;
        }
        Ok(Housekeeping {
            time: narrow(TIME, rec.scalar(TIME)?)?,
            values,
            checksum: narrow(CHECKSUM, rec.scalar(CHECKSUM)?)?,
        })
    }
}
