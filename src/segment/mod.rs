//! # Segment assembly
//!
//! Builds a complete, self-contained transport stream segment: a PAT, a PMT
//! and as many TS packets as it takes to carry one PES packet wrapping one
//! ID3 `TXXX` tag.
//!
//! The PES packet is laid out as a virtual byte stream of whole 184-byte
//! slots:
//!
//! ```text
//! | PES header + PTS | 0xff stuffing | ID3 tag |
//! ```
//!
//! Slot `i` becomes the payload of TS packet `i`, so stuffing and tag bytes
//! are free to straddle packet boundaries.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use log::{debug, trace};

use crate::error::Result;
use crate::format::id3::Id3TxxxTag;
use crate::format::ts::{
    write_pat, write_pmt, PESHeader, ProgramMap, TSHeader, MAX_TS_PAYLOAD, STREAM_ID_PRIVATE_1,
    TS_PACKET_SIZE,
};

pub mod sizes;

use sizes::{
    output_buffer_length, pes_packet_count, pes_packet_length, pes_stuffing_length, PAT_SIZE,
    PMT_SIZE,
};

/// PMT PID used when none is configured
pub const DEFAULT_PMT_PID: u16 = 0x100;
/// ID3 PID used when none is configured
pub const DEFAULT_ID3_PID: u16 = 0x103;
/// PTS used when none is configured
pub const DEFAULT_ID3_PTS: u64 = 282_743;

/// Everything needed to build one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOptions {
    /// PID of the PMT announced by the PAT
    pub pmt_pid: u16,
    /// PID of the packets carrying the ID3 tag
    pub id3_pid: u16,
    /// Optional H.264 stream listed in the PMT
    pub video_pid: Option<u16>,
    /// Optional AAC stream listed in the PMT
    pub audio_pid: Option<u16>,
    /// Presentation timestamp of the tag, 90kHz ticks (33 bits)
    pub id3_pts: u64,
    /// `TXXX` description, empty by default
    pub description: Vec<u8>,
    /// `TXXX` value, copied verbatim
    pub data: Vec<u8>,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            pmt_pid: DEFAULT_PMT_PID,
            id3_pid: DEFAULT_ID3_PID,
            video_pid: None,
            audio_pid: None,
            id3_pts: DEFAULT_ID3_PTS,
            description: Vec::new(),
            data: Vec::new(),
        }
    }
}

impl SegmentOptions {
    /// Options with default PIDs and PTS carrying `data`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_pmt_pid(mut self, pid: u16) -> Self {
        self.pmt_pid = pid;
        self
    }

    pub fn with_id3_pid(mut self, pid: u16) -> Self {
        self.id3_pid = pid;
        self
    }

    pub fn with_video_pid(mut self, pid: Option<u16>) -> Self {
        self.video_pid = pid;
        self
    }

    pub fn with_audio_pid(mut self, pid: Option<u16>) -> Self {
        self.audio_pid = pid;
        self
    }

    pub fn with_id3_pts(mut self, pts: u64) -> Self {
        self.id3_pts = pts;
        self
    }

    pub fn with_description(mut self, description: impl Into<Vec<u8>>) -> Self {
        self.description = description.into();
        self
    }

    /// The program described by these options.
    pub fn program_map(&self) -> ProgramMap {
        ProgramMap::new(self.pmt_pid)
            .with_id3_pid(self.id3_pid)
            .with_video_pid(self.video_pid)
            .with_audio_pid(self.audio_pid)
    }

    /// Checks PID ranges and collisions without building anything.
    pub fn validate(&self) -> Result<()> {
        self.program_map().validate()
    }

    /// Size in bytes of the segment these options produce.
    pub fn output_len(&self) -> usize {
        output_buffer_length(self.data.len(), self.description.len())
    }
}

fn intersect(a: &Range<usize>, b: Range<usize>) -> Option<Range<usize>> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start < end).then_some(start..end)
}

/// Builds a segment from `options`.
///
/// On error nothing is returned; no partially written segment escapes.
pub fn assemble_segment(options: &SegmentOptions) -> Result<Bytes> {
    let program = options.program_map();
    program.validate()?;
    let tag = Id3TxxxTag::with_description(&options.description, &options.data)?;

    let payload_len = options.data.len();
    let description_len = options.description.len();
    let pes_len = pes_packet_length(payload_len, description_len);
    let stuffing = pes_stuffing_length(pes_len);
    let packet_count = pes_packet_count(payload_len, description_len);
    let output_len = output_buffer_length(payload_len, description_len);
    debug!(
        "assembling segment: {} byte tag, {} stuffing bytes, {} PES packets, {} bytes total",
        tag.len(),
        stuffing,
        packet_count,
        output_len
    );

    let mut out = BytesMut::zeroed(output_len);
    write_pat(&mut out, 0, program.pmt_pid)?;
    write_pmt(&mut out, PAT_SIZE, &program)?;

    let pes_header = PESHeader::new(STREAM_ID_PRIVATE_1)
        .with_pts(options.id3_pts)
        .with_data_length(tag.len())
        .with_header_padding(stuffing);
    let stuffing_range = pes_header.len()..pes_header.len() + stuffing;
    let tag_range = stuffing_range.end..stuffing_range.end + tag.len();

    let first_packet = PAT_SIZE + PMT_SIZE;
    for i in 0..packet_count {
        let offset = first_packet + i * TS_PACKET_SIZE;
        let ts_header = TSHeader::new(options.id3_pid)
            .with_payload_unit_start(i == 0)
            .with_continuity_counter((i % 16) as u8);
        let payload_offset = offset + ts_header.write_at(&mut out, offset, MAX_TS_PAYLOAD)?;

        // Slot of the virtual PES stream carried by this packet
        let slot = i * MAX_TS_PAYLOAD..(i + 1) * MAX_TS_PAYLOAD;
        let to_buf = |pos: usize| payload_offset + (pos - slot.start);

        if i == 0 {
            pes_header.write_at(&mut out, payload_offset)?;
        }
        if let Some(range) = intersect(&slot, stuffing_range.clone()) {
            out[to_buf(range.start)..to_buf(range.end)].fill(0xff);
        }
        if let Some(range) = intersect(&slot, tag_range.clone()) {
            let dest = to_buf(range.start);
            tag.write_range(
                &mut out,
                dest,
                range.start - tag_range.start..range.end - tag_range.start,
            )?;
        }
        trace!(
            "packet {} at {}: pid {:#x}, cc {}",
            i,
            offset,
            options.id3_pid,
            i % 16
        );
    }

    Ok(out.freeze())
}

/// Asynchronous form of [`assemble_segment`].
///
/// The work is synchronous and short; the future only defers delivery of
/// the result to the caller's executor.
pub async fn generate_segment(options: SegmentOptions) -> Result<Bytes> {
    tokio::task::yield_now().await;
    assemble_segment(&options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Id3TsError;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn packet(b: &[u8], n: usize) -> &[u8] {
        &b[n * TS_PACKET_SIZE..(n + 1) * TS_PACKET_SIZE]
    }

    fn pid(p: &[u8]) -> u16 {
        (((p[1] & 0x1f) as u16) << 8) | p[2] as u16
    }

    /// Concatenates the payload of every ID3 packet.
    fn pes_stream(b: &[u8]) -> Vec<u8> {
        b[PAT_SIZE + PMT_SIZE..]
            .chunks(TS_PACKET_SIZE)
            .flat_map(|p| p[4..].to_vec())
            .collect()
    }

    #[test]
    fn test_single_packet_segment() {
        let options = SegmentOptions::new("This is a short example here bud")
            .with_pmt_pid(0x101)
            .with_id3_pid(0x180)
            .with_id3_pts(1234567890);
        let b = assemble_segment(&options).unwrap();

        assert_eq!(b.len(), 564);
        assert_eq!(options.output_len(), 564);
        assert_eq!(pid(packet(&b, 0)), 0);
        assert_eq!(pid(packet(&b, 1)), 0x101);

        let p = packet(&b, 2);
        assert_eq!(&p[..4], &[0x47, 0x41, 0x80, 0x10]);
        // 55 byte tag, 115 bytes of stuffing
        assert_eq!(&p[4..10], &[0x00, 0x00, 0x01, 0xbd, 0x00, 55 + 3 + 5 + 115]);
        assert_eq!(p[12], 5 + 115);
        assert!(p[18..133].iter().all(|b| *b == 0xff));
        assert_eq!(&p[133..136], b"ID3");
        assert_eq!(&p[155..187], b"This is a short example here bud");
        assert_eq!(p[187], 0x00);
    }

    #[test]
    fn test_stuffing_straddles_packets() {
        // 185 byte PES packet: stuffing runs from packet 0 well into packet 1
        let b = assemble_segment(&SegmentOptions::new(vec![b'x'; 148])).unwrap();
        assert_eq!(b.len(), 752);

        let pes = pes_stream(&b);
        assert_eq!(pes.len(), 368);
        assert!(pes[14..14 + 183].iter().all(|b| *b == 0xff));
        assert_eq!(&pes[197..200], b"ID3");
        assert_eq!(pes[367], 0x00);

        let second = packet(&b, 3);
        assert_eq!(&second[..4], &[0x47, 0x01, 0x03, 0x11]);
        assert!(second[4..17].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_tag_straddles_packets() {
        let b = assemble_segment(&SegmentOptions::new(vec![b'y'; 208])).unwrap();
        assert_eq!(b.len(), 752);

        let second = packet(&b, 3);
        assert_eq!(&second[..4], &[0x47, 0x01, 0x03, 0x11]);

        let pes = pes_stream(&b);
        let tag = Id3TxxxTag::new(&[b'y'; 208]).unwrap().to_vec();
        assert!(pes[14..137].iter().all(|b| *b == 0xff));
        assert_eq!(&pes[137..], &tag[..]);
    }

    #[test]
    fn test_description_is_carried() {
        let options = SegmentOptions::new("value").with_description("key");
        let b = assemble_segment(&options).unwrap();
        let pes = pes_stream(&b);
        let tag = Id3TxxxTag::with_description(b"key", b"value").unwrap().to_vec();
        assert_eq!(&pes[pes.len() - tag.len()..], &tag[..]);
    }

    #[test]
    fn test_invalid_options_produce_nothing() {
        let err = assemble_segment(&SegmentOptions::new("x").with_id3_pid(0x100)).unwrap_err();
        assert!(matches!(err, Id3TsError::PidCollision { pid: 0x100, .. }));

        let err = assemble_segment(&SegmentOptions::new("x").with_pmt_pid(2)).unwrap_err();
        assert!(matches!(err, Id3TsError::InvalidPid { name: "pmtPid", value: 2 }));

        let options = SegmentOptions::new("x").with_audio_pid(Some(0x2000));
        assert!(options.validate().is_err());
        assert!(assemble_segment(&options).is_err());
    }

    #[test]
    fn test_generate_segment_matches_sync() {
        let options = SegmentOptions::new("async")
            .with_video_pid(Some(0x200))
            .with_audio_pid(Some(0x201));
        let expected = assemble_segment(&options).unwrap();
        let actual = tokio_test::block_on(generate_segment(options)).unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_generate_segment_error() {
        let result = generate_segment(SegmentOptions::new("x").with_id3_pid(0)).await;
        assert!(result.is_err());
    }

    #[quickcheck]
    fn prop_continuity_counters_increment(len: u16) -> bool {
        let b = assemble_segment(&SegmentOptions::new(vec![0x42u8; len as usize])).unwrap();
        b[PAT_SIZE + PMT_SIZE..]
            .chunks(TS_PACKET_SIZE)
            .enumerate()
            .all(|(i, p)| {
                p[0] == 0x47
                    && pid(p) == DEFAULT_ID3_PID
                    && (p[1] & 0x40 != 0) == (i == 0)
                    && p[3] == 0x10 | (i % 16) as u8
            })
    }

    #[quickcheck]
    fn prop_tag_ends_segment(data: Vec<u8>) -> bool {
        let b = assemble_segment(&SegmentOptions::new(data.clone())).unwrap();
        let pes = pes_stream(&b);
        let tag = Id3TxxxTag::new(&data).unwrap().to_vec();
        b.len() == output_buffer_length(data.len(), 0) && pes.ends_with(&tag)
    }
}
