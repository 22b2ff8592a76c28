use std::num::ParseIntError;
use thiserror::Error;

/// Errors produced while laying out a segment.
///
/// Configuration errors (`InvalidPid`, `PidCollision`) come from caller
/// input. Capacity and layout errors (`BufferTooSmall`, `CrcOverlap`,
/// `InvalidRange`) mean a writer was handed a region that cannot hold the
/// structure it writes; the assembler never produces them for valid options.
#[derive(Error, Debug)]
pub enum Id3TsError {
    /// Underlying I/O failure (CLI and config loading only)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A PID outside `4..=0x1FFE`
    #[error("the \"{name}\" option must be a PID in the range 4 to 8190, got {value}")]
    InvalidPid {
        /// Name of the offending option
        name: &'static str,
        /// Value that was rejected
        value: u16,
    },

    /// Two streams were assigned the same PID
    #[error("\"{first}\" and \"{second}\" both use PID {pid:#06x}")]
    PidCollision {
        /// First option sharing the PID
        first: &'static str,
        /// Second option sharing the PID
        second: &'static str,
        /// The shared PID
        pid: u16,
    },

    /// Destination buffer cannot hold a fixed-size structure
    #[error("buffer remaining ({remaining} bytes) is less than the {needed} bytes required for {what}")]
    BufferTooSmall {
        /// Structure being written
        what: &'static str,
        /// Bytes the structure needs
        needed: usize,
        /// Bytes left in the buffer at the write offset
        remaining: usize,
    },

    /// CRC destination overlaps the range it checksums
    #[error("CRC destination at {dest} overlaps content range {start}..{end}")]
    CrcOverlap {
        /// Offset of the 4-byte CRC field
        dest: usize,
        /// Start of the checksummed range
        start: usize,
        /// End of the checksummed range
        end: usize,
    },

    /// Requested ID3 range ends before it starts
    #[error("range {start}..{end} is reversed for the {len} byte ID3 tag")]
    InvalidRange {
        /// Range start
        start: usize,
        /// Range end
        end: usize,
        /// Tag length
        len: usize,
    },

    /// PES header stuffing does not fit the 8-bit PES_header_data_length field
    #[error("PES header data length {0} exceeds 255 bytes")]
    PesHeaderDataTooLong(usize),

    /// ID3 frame length does not fit a 28-bit sync-safe integer
    #[error("ID3 frame of {0} bytes exceeds the sync-safe size limit")]
    TagTooLarge(usize),

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),

    /// Malformed TOML configuration file
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed integer in configuration or arguments
    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Id3TsError>;
