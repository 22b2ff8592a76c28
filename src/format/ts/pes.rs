use super::types::{ensure_remaining, PTS_MASK};
use crate::error::{Id3TsError, Result};
use log::warn;

/// Fixed part of a PES header: start code, stream id, packet length,
/// two flag bytes and the header data length.
pub const PES_HEADER_SIZE: usize = 9;
/// Size of a PTS-only timestamp field
pub const PTS_SIZE: usize = 5;

const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Packetized Elementary Stream (PES) header.
///
/// Only the fields this crate emits are modelled. The header is written
/// positionally into a caller-owned buffer; the stuffing bytes announced by
/// `header_padding_length` are left for the caller to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PESHeader {
    /// Stream identifier (private_stream_1 for ID3)
    pub stream_id: u8,
    /// Data alignment indicator
    pub data_alignment: bool,
    /// Presentation Time Stamp (33 bits, 90kHz)
    pub pts: Option<u64>,
    /// Length of the elementary stream data following the header
    pub data_length: usize,
    /// Stuffing bytes counted in the header after the optional fields
    pub header_padding_length: usize,
}

impl PESHeader {
    /// Creates a new PES header with a specific stream ID.
    pub fn new(stream_id: u8) -> Self {
        Self {
            stream_id,
            data_alignment: true,
            pts: None,
            data_length: 0,
            header_padding_length: 0,
        }
    }

    /// Sets the Presentation Time Stamp in 90kHz ticks. Bits above 33 are dropped.
    pub fn with_pts(mut self, pts: u64) -> Self {
        self.pts = Some(pts & PTS_MASK);
        self
    }

    /// Sets the length of the data carried after the header.
    pub fn with_data_length(mut self, data_length: usize) -> Self {
        self.data_length = data_length;
        self
    }

    /// Sets how many stuffing bytes follow the optional header fields.
    pub fn with_header_padding(mut self, header_padding_length: usize) -> Self {
        self.header_padding_length = header_padding_length;
        self
    }

    /// Bytes written by [`PESHeader::write_at`]: 9, or 14 with a PTS.
    pub fn len(&self) -> usize {
        PES_HEADER_SIZE + self.optional_fields_len()
    }

    fn optional_fields_len(&self) -> usize {
        if self.pts.is_some() {
            PTS_SIZE
        } else {
            0
        }
    }

    /// Value of the `PES_packet_length` field: everything after the field itself.
    pub fn packet_length(&self) -> usize {
        self.data_length + 3 + self.optional_fields_len() + self.header_padding_length
    }

    /// Writes the header at `offset` and returns the number of bytes written.
    ///
    /// A packet length that does not fit 16 bits is written as 0, which
    /// ISO/IEC 13818-1 defines as "unbounded". Header stuffing that pushes
    /// `PES_header_data_length` past 255 is an error.
    pub fn write_at(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let len = self.len();
        let header_data_length = self.optional_fields_len() + self.header_padding_length;
        let header_data_length = u8::try_from(header_data_length)
            .map_err(|_| Id3TsError::PesHeaderDataTooLong(header_data_length))?;
        ensure_remaining(buf, offset, len, "a PES header")?;

        let header = &mut buf[offset..offset + len];
        header[..3].copy_from_slice(&PES_START_CODE);
        header[3] = self.stream_id;

        let packet_length = self.packet_length();
        let packet_length = match u16::try_from(packet_length) {
            Ok(length) => length,
            Err(_) => {
                warn!(
                    "PES packet length {} exceeds 16 bits, writing unbounded length",
                    packet_length
                );
                0
            }
        };
        header[4..6].copy_from_slice(&packet_length.to_be_bytes());

        // '10' marker, scrambling 00, priority 0
        header[6] = 0x80 | if self.data_alignment { 0x04 } else { 0x00 };
        header[7] = if self.pts.is_some() { 0x80 } else { 0x00 };
        header[8] = header_data_length;

        if let Some(pts) = self.pts {
            write_timestamp(&mut header[PES_HEADER_SIZE..], 0x20, pts);
        }

        Ok(len)
    }
}

/// Writes a 5-byte PTS/DTS field with marker bits set.
///
/// Layout: `pppp bbb1 | b*8 | b*7 1 | b*8 | b*7 1` where `pppp` is the
/// prefix nibble carried in `marker`.
fn write_timestamp(buf: &mut [u8], marker: u8, ts: u64) {
    let ts = ts & PTS_MASK;

    buf[0] = marker | ((ts >> 29) & 0x0e) as u8 | 0x01;
    buf[1..3].copy_from_slice(&((((ts >> 14) & 0xfffe) | 0x01) as u16).to_be_bytes());
    buf[3..5].copy_from_slice(&((((ts << 1) & 0xfffe) | 0x01) as u16).to_be_bytes());
}

/// Reads back a 5-byte timestamp written by [`PESHeader::write_at`].
#[cfg(test)]
pub(crate) fn read_timestamp(buf: &[u8]) -> u64 {
    (((buf[0] as u64) & 0x0e) << 29)
        | ((buf[1] as u64) << 22)
        | (((buf[2] as u64) & 0xfe) << 14)
        | ((buf[3] as u64) << 7)
        | ((buf[4] as u64) >> 1)
}
