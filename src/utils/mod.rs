//! # Utility Functions and Types
//!
//! Helpers shared by the table writers.
//!
//! ## CRC Calculation
//!
//! The crc module provides the MPEG-2 CRC32 used by PSI sections, both as a
//! plain checksum and as an in-place writer over a buffer range:
//!
//! ```rust
//! use id3ts::utils::write_crc32;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut section = [0x01u8, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00];
//! write_crc32(&mut section, 4, 0..4)?;
//! assert_eq!(&section[4..], &[0x79, 0x37, 0x37, 0xCD]);
//! # Ok(())
//! # }
//! ```

/// CRC calculation implementations
pub mod crc;

pub use crc::{write_crc32, Crc32Mpeg2, CRC32_SIZE};
