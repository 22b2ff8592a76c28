//! Container formats: the MPEG transport stream and the ID3 tag it carries.

/// ID3v2.4 `TXXX` tag encoding
pub mod id3;

/// MPEG-TS packet, PSI and PES writers
pub mod ts;

pub use self::id3::{write_id3_range, Id3TxxxTag};
pub use self::ts::{PESHeader, ProgramMap, TSHeader};
