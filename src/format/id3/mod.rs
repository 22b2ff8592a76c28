//! # ID3v2.4 timed metadata
//!
//! A tag holding a single `TXXX` (user-defined text) frame, encoded
//! positionally: the tag is never materialised as its own buffer. Instead
//! [`Id3TxxxTag::write_range`] writes any sub-range `[start, end)` of the
//! *virtual* tag bytes straight into a destination slice, which is what lets
//! the segment assembler interleave TS headers inside one continuous tag.
//!
//! Virtual layout for a payload of `L` bytes and a description of `D` bytes:
//!
//! | Offset | Length | Field |
//! |--------|--------|-------|
//! | 0 | 3 | `"ID3"` |
//! | 3 | 2 | version 4.0 |
//! | 5 | 1 | tag flags |
//! | 6 | 4 | tag size (sync-safe) |
//! | 10 | 4 | `"TXXX"` |
//! | 14 | 4 | frame size (sync-safe) |
//! | 18 | 2 | frame flags |
//! | 20 | 1 | text encoding (UTF-8) |
//! | 21 | D | description |
//! | 21+D | 1 | description terminator |
//! | 22+D | L | payload |
//! | 22+D+L | 1 | payload terminator |

use std::ops::Range;

use crate::error::{Id3TsError, Result};
use crate::segment::sizes::{id3_frame_length, id3_tag_length, ID3_FRAME_HEADER, ID3_TAG_HEADER};

const ID3_MAGIC: &[u8] = b"ID3";
const ID3_VERSION: &[u8] = &[0x04, 0x00];
const ID3_TAG_FLAGS: &[u8] = &[0x00];
const TXXX_FRAME_ID: &[u8] = b"TXXX";
const TXXX_FRAME_FLAGS: &[u8] = &[0xe0, 0x00];
const TEXT_ENCODING_UTF8: &[u8] = &[0x03];
const NULL_TERMINATOR: &[u8] = &[0x00];

const TAG_SIZE_OFFSET: usize = 6;
const FRAME_SIZE_OFFSET: usize = ID3_TAG_HEADER + 4;
const DESCRIPTION_OFFSET: usize = ID3_TAG_HEADER + ID3_FRAME_HEADER + 1;

/// Largest value a sync-safe integer can carry (28 bits)
pub const SYNC_SAFE_MAX: u32 = 0x0fff_ffff;

/// Encodes `value` as four 7-bit groups, most significant first.
///
/// Bits above 28 are dropped; callers check against [`SYNC_SAFE_MAX`].
pub fn encode_sync_safe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7f) as u8,
        ((value >> 14) & 0x7f) as u8,
        ((value >> 7) & 0x7f) as u8,
        (value & 0x7f) as u8,
    ]
}

/// Inverse of [`encode_sync_safe`]. The high bit of each byte is ignored.
pub fn decode_sync_safe(bytes: [u8; 4]) -> u32 {
    ((bytes[0] as u32 & 0x7f) << 21)
        | ((bytes[1] as u32 & 0x7f) << 14)
        | ((bytes[2] as u32 & 0x7f) << 7)
        | (bytes[3] as u32 & 0x7f)
}

/// A byte run at a fixed virtual offset inside the tag.
struct Field<'a> {
    offset: usize,
    bytes: FieldBytes<'a>,
}

enum FieldBytes<'a> {
    Borrowed(&'a [u8]),
    SyncSafe([u8; 4]),
}

impl<'a> Field<'a> {
    fn borrowed(offset: usize, bytes: &'a [u8]) -> Self {
        Self {
            offset,
            bytes: FieldBytes::Borrowed(bytes),
        }
    }

    fn as_slice(&self) -> &[u8] {
        match &self.bytes {
            FieldBytes::Borrowed(bytes) => bytes,
            FieldBytes::SyncSafe(bytes) => bytes,
        }
    }
}

/// An ID3v2.4 tag containing one `TXXX` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3TxxxTag<'a> {
    description: &'a [u8],
    payload: &'a [u8],
}

impl<'a> Id3TxxxTag<'a> {
    /// Tag with an empty description carrying `payload` verbatim.
    ///
    /// Fails if the frame would not fit a sync-safe size field.
    pub fn new(payload: &'a [u8]) -> Result<Self> {
        Self::with_description(&[], payload)
    }

    /// Tag whose `TXXX` frame carries `description` before the payload.
    pub fn with_description(description: &'a [u8], payload: &'a [u8]) -> Result<Self> {
        let frame_length = id3_frame_length(payload.len(), description.len());
        if frame_length > SYNC_SAFE_MAX as usize {
            return Err(Id3TsError::TagTooLarge(frame_length));
        }
        Ok(Self {
            description,
            payload,
        })
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn description(&self) -> &'a [u8] {
        self.description
    }

    /// Total virtual length of the tag, header included.
    pub fn len(&self) -> usize {
        id3_tag_length(self.payload.len(), self.description.len())
    }

    /// Value of the tag header size field: everything after the tag header.
    pub fn tag_size(&self) -> u32 {
        id3_frame_length(self.payload.len(), self.description.len()) as u32
    }

    /// Value of the frame header size field: everything after the frame header.
    pub fn frame_size(&self) -> u32 {
        self.tag_size() - ID3_FRAME_HEADER as u32
    }

    fn fields(&self) -> [Field<'a>; 12] {
        let description_end = DESCRIPTION_OFFSET + self.description.len();
        let payload_start = description_end + 1;
        [
            Field::borrowed(0, ID3_MAGIC),
            Field::borrowed(3, ID3_VERSION),
            Field::borrowed(5, ID3_TAG_FLAGS),
            Field {
                offset: TAG_SIZE_OFFSET,
                bytes: FieldBytes::SyncSafe(encode_sync_safe(self.tag_size())),
            },
            Field::borrowed(ID3_TAG_HEADER, TXXX_FRAME_ID),
            Field {
                offset: FRAME_SIZE_OFFSET,
                bytes: FieldBytes::SyncSafe(encode_sync_safe(self.frame_size())),
            },
            Field::borrowed(FRAME_SIZE_OFFSET + 4, TXXX_FRAME_FLAGS),
            Field::borrowed(DESCRIPTION_OFFSET - 1, TEXT_ENCODING_UTF8),
            Field::borrowed(DESCRIPTION_OFFSET, self.description),
            Field::borrowed(description_end, NULL_TERMINATOR),
            Field::borrowed(payload_start, self.payload),
            Field::borrowed(payload_start + self.payload.len(), NULL_TERMINATOR),
        ]
    }

    /// Writes virtual tag bytes `range` into `buf` starting at `dest`, so
    /// that `buf[dest + i]` receives tag byte `range.start + i`.
    ///
    /// Only the part of `range` that lies inside the tag is written; a range
    /// running past the end of the tag is clamped. Bytes outside `range` are
    /// left untouched, so repeated calls with disjoint ranges in any order
    /// build the same bytes as one call over `0..self.len()`.
    pub fn write_range(&self, buf: &mut [u8], dest: usize, range: Range<usize>) -> Result<()> {
        let len = self.len();
        if range.start > range.end {
            return Err(Id3TsError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let range = range.start.min(len)..range.end.min(len);
        let remaining = buf.len().saturating_sub(dest);
        if remaining < range.len() {
            return Err(Id3TsError::BufferTooSmall {
                what: "the ID3 range",
                needed: range.len(),
                remaining,
            });
        }

        self.write_fields(buf, dest, range);
        Ok(())
    }

    fn write_fields(&self, buf: &mut [u8], dest: usize, range: Range<usize>) {
        for field in self.fields() {
            let bytes = field.as_slice();
            let start = range.start.max(field.offset);
            let end = range.end.min(field.offset + bytes.len());
            if start >= end {
                continue;
            }
            let to = dest + (start - range.start);
            buf[to..to + (end - start)]
                .copy_from_slice(&bytes[start - field.offset..end - field.offset]);
        }
    }

    /// Serialises the whole tag into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let len = self.len();
        let mut tag = vec![0u8; len];
        self.write_fields(&mut tag, 0, 0..len);
        tag
    }
}

/// Writes virtual bytes `start..end` of a `TXXX` tag carrying `payload`
/// into `buf` at `dest`.
pub fn write_id3_range(
    buf: &mut [u8],
    dest: usize,
    start: usize,
    end: usize,
    payload: &[u8],
) -> Result<()> {
    Id3TxxxTag::new(payload)?.write_range(buf, dest, start..end)
}
