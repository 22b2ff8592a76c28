use crate::error::{Id3TsError, Result};

// Stream IDs
pub const STREAM_ID_PRIVATE_1: u8 = 0xbd;

// PIDs
pub const PID_PAT: u16 = 0x0000;
pub const PID_NULL: u16 = 0x1fff;
pub const PID_MIN: u16 = 0x0004;
pub const PID_MAX: u16 = 0x1ffe;

// Table IDs
pub const TABLE_ID_PAT: u8 = 0x00;
pub const TABLE_ID_PMT: u8 = 0x02;
pub const TABLE_EXT_PAT: u16 = 1;
pub const PROGRAM_NUMBER: u16 = 1;

// Elementary Stream Types
pub const STREAM_TYPE_H264: u8 = 0x1b;
pub const STREAM_TYPE_AAC: u8 = 0x0f;
pub const STREAM_TYPE_METADATA: u8 = 0x15;

// Constants
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const MAX_TS_PAYLOAD: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;
pub const PTS_MASK: u64 = 0x1_ffff_ffff;

/// Rejects PIDs that are reserved (0..=3) or the null PID.
///
/// `name` is the option being checked and ends up in the error message.
pub fn validate_pid(name: &'static str, pid: u16) -> Result<()> {
    if (PID_MIN..=PID_MAX).contains(&pid) {
        Ok(())
    } else {
        Err(Id3TsError::InvalidPid { name, value: pid })
    }
}

pub(crate) fn ensure_remaining(
    buf: &[u8],
    offset: usize,
    needed: usize,
    what: &'static str,
) -> Result<()> {
    let remaining = buf.len().saturating_sub(offset);
    if remaining < needed {
        return Err(Id3TsError::BufferTooSmall {
            what,
            needed,
            remaining,
        });
    }
    Ok(())
}

/// 4-byte transport packet header.
///
/// Transport error, priority and scrambling bits are always written as zero.
///
/// ```
/// use id3ts::format::ts::{TSHeader, MAX_TS_PAYLOAD, TS_PACKET_SIZE};
///
/// let mut packet = [0u8; TS_PACKET_SIZE];
/// let written = TSHeader::new(0x103)
///     .with_payload_unit_start(true)
///     .with_continuity_counter(17)
///     .write_at(&mut packet, 0, MAX_TS_PAYLOAD)
///     .unwrap();
/// assert_eq!(written, 4);
/// assert_eq!(&packet[..4], &[0x47, 0x41, 0x03, 0x11]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TSHeader {
    /// Packet identifier (13 bits)
    pub pid: u16,
    /// Set on the packet that starts a PES packet or PSI section
    pub payload_unit_start: bool,
    /// Taken modulo 16 when written
    pub continuity_counter: u8,
}

impl TSHeader {
    /// Creates a header for `pid` with PUSI cleared and continuity counter 0.
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            payload_unit_start: false,
            continuity_counter: 0,
        }
    }

    /// Sets the payload unit start indicator.
    pub fn with_payload_unit_start(mut self, payload_unit_start: bool) -> Self {
        self.payload_unit_start = payload_unit_start;
        self
    }

    /// Sets the continuity counter. Only the low 4 bits are written.
    pub fn with_continuity_counter(mut self, continuity_counter: u8) -> Self {
        self.continuity_counter = continuity_counter;
        self
    }

    /// Writes the header for a packet starting at `offset` whose payload is
    /// `payload_len` bytes long.
    ///
    /// With `payload_len >= 184` the packet is payload only. Shorter payloads
    /// get an adaptation field of `183 - payload_len` bytes so the packet
    /// still spans exactly 188 bytes. Returns the number of bytes written,
    /// i.e. where the payload begins relative to `offset`.
    pub fn write_at(&self, buf: &mut [u8], offset: usize, payload_len: usize) -> Result<usize> {
        validate_pid("pid", self.pid)?;
        ensure_remaining(buf, offset, TS_PACKET_SIZE, "a TS packet")?;

        let packet = &mut buf[offset..offset + TS_PACKET_SIZE];
        packet[0] = TS_SYNC_BYTE;

        let mut b1 = ((self.pid >> 8) & 0x1f) as u8;
        if self.payload_unit_start {
            b1 |= 0x40;
        }
        packet[1] = b1;
        packet[2] = (self.pid & 0xff) as u8;

        let cc = self.continuity_counter & 0x0f;
        if payload_len >= MAX_TS_PAYLOAD {
            // afc:01 payload only
            packet[3] = 0x10 | cc;
            return Ok(TS_HEADER_SIZE);
        }

        // afc:11 adaptation field followed by payload
        packet[3] = 0x30 | cc;
        let adaptation_length = MAX_TS_PAYLOAD - 1 - payload_len;
        packet[4] = adaptation_length as u8;
        if adaptation_length > 0 {
            // no discontinuity, random access, priority or optional fields
            packet[5] = 0x00;
            packet[6..5 + adaptation_length].fill(0xff);
        }

        Ok(TS_HEADER_SIZE + 1 + adaptation_length)
    }
}
