//! CRC32 for MPEG-2 TS PSI sections.
//!
//! Based on ITU-T H.222.0 / ISO/IEC 13818-1 Annex B.
//! Polynomial: x32 + x26 + x23 + x22 + x16 + x12 + x11 + x10 + x8 + x7 + x5 + x4 + x2 + x + 1
//! Initial value: 0xFFFFFFFF, no reflection, no final XOR.

use std::ops::Range;

use crc::{Crc, CRC_32_MPEG_2};

use crate::error::{Id3TsError, Result};

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Size of the CRC field trailing every PSI section
pub const CRC32_SIZE: usize = 4;

/// MPEG-2 CRC32 calculator used for PAT/PMT sections
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Mpeg2;

impl Crc32Mpeg2 {
    /// Calculates the CRC32 checksum for the given data using the MPEG-2 algorithm
    ///
    /// # Examples
    ///
    /// ```
    /// use id3ts::utils::Crc32Mpeg2;
    ///
    /// assert_eq!(Crc32Mpeg2::calculate(&[0x01, 0x01]), 0xD66FB816);
    /// ```
    pub fn calculate(data: &[u8]) -> u32 {
        CRC_MPEG.checksum(data)
    }
}

/// Computes the CRC32 of `buf[content]` and writes it big-endian at `dest`.
///
/// Fails if the 4-byte destination does not fit in `buf`, if the content
/// range is out of bounds, or if the destination overlaps the content.
pub fn write_crc32(buf: &mut [u8], dest: usize, content: Range<usize>) -> Result<()> {
    let remaining = buf.len().saturating_sub(dest);
    if remaining < CRC32_SIZE {
        return Err(Id3TsError::BufferTooSmall {
            what: "a CRC32",
            needed: CRC32_SIZE,
            remaining,
        });
    }
    if content.start > content.end || content.end > buf.len() {
        return Err(Id3TsError::BufferTooSmall {
            what: "the CRC32 content range",
            needed: content.end,
            remaining: buf.len(),
        });
    }
    if dest < content.end && content.start < dest + CRC32_SIZE {
        return Err(Id3TsError::CrcOverlap {
            dest,
            start: content.start,
            end: content.end,
        });
    }

    let crc = Crc32Mpeg2::calculate(&buf[content]);
    buf[dest..dest + CRC32_SIZE].copy_from_slice(&crc.to_be_bytes());
    Ok(())
}
