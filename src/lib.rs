#![doc(html_root_url = "https://docs.rs/id3ts/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # id3ts - timed ID3 metadata in MPEG-TS
//!
//! `id3ts` serializes a single ID3v2.4 tag into a small, self-contained
//! MPEG-2 Transport Stream segment that HLS players can splice into a live
//! stream as timed metadata.
//!
//! A segment consists of:
//!
//! - a PAT announcing program 1
//! - a PMT listing the ID3 stream (plus optional H.264 video and AAC audio
//!   streams) with the metadata descriptors required for ID3 in TS
//! - one PES packet, stamped with a PTS, carrying a `TXXX` frame whose
//!   value is the caller's data
//!
//! ## Quick Start
//!
//! ```rust
//! use id3ts::{assemble_segment, SegmentOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SegmentOptions::new("This is a short example here bud")
//!     .with_pmt_pid(0x101)
//!     .with_id3_pid(0x180)
//!     .with_id3_pts(1234567890);
//!
//! let segment = assemble_segment(&options)?;
//! assert_eq!(segment.len(), 564);
//! assert_eq!(segment.len() % 188, 0);
//! # Ok(())
//! # }
//! ```
//!
//! An async wrapper is available for callers already on a Tokio runtime:
//!
//! ```rust
//! use id3ts::{generate_segment, SegmentOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let segment = generate_segment(SegmentOptions::new(r#"{"ad":"start"}"#)).await?;
//! assert_eq!(segment[0], 0x47);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `segment`: the assembler and the length calculator
//! - `format`: positional writers for TS headers, PSI sections, PES
//!   headers and the chunked ID3 encoder
//! - `utils`: CRC-32/MPEG-2
//! - `config`: layered defaults, TOML file and environment settings
//! - `error`: the crate error type and `Result` alias

/// Layered configuration
pub mod config;

/// Error types and utilities
pub mod error;

/// Media format writers (TS, PSI, PES, ID3)
pub mod format;

/// Segment assembly and sizing
pub mod segment;

/// Common utilities and helper functions
pub mod utils;

pub use config::Config;
pub use error::{Id3TsError, Result};
pub use segment::sizes::output_buffer_length;
pub use segment::{assemble_segment, generate_segment, SegmentOptions};
