//! # MPEG Transport Stream (TS) writing
//!
//! Positional writers for the pieces of a single-program transport stream:
//!
//! - TS packet headers, with an adaptation field for short payloads
//! - Program Specific Information (PAT and PMT sections)
//! - PES headers carrying a presentation timestamp
//!
//! Every writer takes a caller-owned buffer and an offset, and never
//! allocates the packet itself.
//!
//! ## Example Usage
//!
//! ```rust
//! use id3ts::format::ts::{write_pat, write_pmt, ProgramMap, TS_PACKET_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut out = vec![0u8; TS_PACKET_SIZE * 2];
//! let program = ProgramMap::new(0x100).with_id3_pid(0x103);
//!
//! write_pat(&mut out, 0, program.pmt_pid)?;
//! write_pmt(&mut out, TS_PACKET_SIZE, &program)?;
//! assert_eq!(out[TS_PACKET_SIZE], 0x47);
//! # Ok(())
//! # }
//! ```

/// PES header writing
pub mod pes;

/// PAT and PMT sections
pub mod psi;

/// Core TS types and constants
pub mod types;

// Re-export commonly used types and constants
pub use pes::{PESHeader, PES_HEADER_SIZE, PTS_SIZE};
pub use psi::{write_pat, write_pmt, Descriptor, ElementaryStreamInfo, ProgramMap};
pub use types::{
    validate_pid,
    TSHeader,
    MAX_TS_PAYLOAD,
    PID_MAX,
    PID_MIN,
    STREAM_ID_PRIVATE_1,
    STREAM_TYPE_AAC,
    STREAM_TYPE_H264,
    STREAM_TYPE_METADATA,
    TS_PACKET_SIZE,
};
