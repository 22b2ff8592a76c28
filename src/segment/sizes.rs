//! Byte lengths of every layer of a segment, derived from the payload length.

use crate::format::ts::pes::{PES_HEADER_SIZE, PTS_SIZE};
use crate::format::ts::types::{MAX_TS_PAYLOAD, TS_PACKET_SIZE};

/// PAT packet
pub const PAT_SIZE: usize = TS_PACKET_SIZE;
/// PMT packet
pub const PMT_SIZE: usize = TS_PACKET_SIZE;

/// Called out so the `+ 1`s below read as terminators
pub const NULL_BYTE: usize = 1;

/// ID3v2 tag header
pub const ID3_TAG_HEADER: usize = 10;
/// ID3v2 frame header (id, size, flags)
pub const ID3_FRAME_HEADER: usize = 10;
/// Text encoding byte opening a TXXX frame body
pub const ID3_FRAME_TEXT_ENCODING: usize = 1;
/// TXXX frame header with an empty description
pub const ID3_FRAME_TXXX_HEADER: usize = ID3_FRAME_HEADER + ID3_FRAME_TEXT_ENCODING + NULL_BYTE;

/// Length of the TXXX frame including its header; this is also the value
/// of the tag header's size field.
pub fn id3_frame_length(payload_len: usize, description_len: usize) -> usize {
    ID3_FRAME_HEADER + ID3_FRAME_TEXT_ENCODING + description_len + NULL_BYTE + payload_len + NULL_BYTE
}

/// Length of the whole ID3 tag.
pub fn id3_tag_length(payload_len: usize, description_len: usize) -> usize {
    ID3_TAG_HEADER + id3_frame_length(payload_len, description_len)
}

/// PES header, PTS and ID3 tag before any stuffing.
pub fn pes_packet_length(payload_len: usize, description_len: usize) -> usize {
    PES_HEADER_SIZE + PTS_SIZE + id3_tag_length(payload_len, description_len)
}

/// Stuffing that rounds a PES packet up to whole 184-byte TS payloads.
pub fn pes_stuffing_length(pes_packet_length: usize) -> usize {
    pes_packet_length.div_ceil(MAX_TS_PAYLOAD) * MAX_TS_PAYLOAD - pes_packet_length
}

/// Number of TS packets carrying the PES packet.
pub fn pes_packet_count(payload_len: usize, description_len: usize) -> usize {
    pes_packet_length(payload_len, description_len).div_ceil(MAX_TS_PAYLOAD)
}

/// Size of the finished segment: PAT, PMT and the PES-carrying packets.
pub fn output_buffer_length(payload_len: usize, description_len: usize) -> usize {
    PAT_SIZE + PMT_SIZE + pes_packet_count(payload_len, description_len) * TS_PACKET_SIZE
}
