//! PAT / PMT packet writers.
//!
//! Both tables are stamped from a 188-byte prototype (TS header, pointer
//! field, fixed section header, 0xFF stuffing) and only the variable fields
//! are patched in. Anything not overwritten stays 0xFF, so no stale buffer
//! contents can leak into the stream.

use bytes::BufMut;

use super::types::*;
use crate::error::{Id3TsError, Result};
use crate::utils::{write_crc32, CRC32_SIZE};

/// metadata_pointer_descriptor (ISO/IEC 13818-1 2.6.58)
pub const DESCRIPTOR_TAG_METADATA_POINTER: u8 = 0x25;
/// metadata_descriptor (ISO/IEC 13818-1 2.6.60)
pub const DESCRIPTOR_TAG_METADATA: u8 = 0x26;

/// "ID3 " as metadata_application_format_identifier / metadata_format_identifier
const ID3_FORMAT_IDENTIFIER: [u8; 4] = *b"ID3 ";

// Offsets inside the packet
const SECTION_START: usize = 5;
const SECTION_LENGTH_OFFSET: usize = 6;
const PAT_PMT_PID_OFFSET: usize = 15;
const PAT_CRC_OFFSET: usize = 17;
const PMT_PROGRAM_INFO_LENGTH_OFFSET: usize = 15;
const PMT_LOOP_START: usize = 17;

/// program_number .. program_info_length, i.e. what precedes the descriptor
/// loops inside section_length
const PMT_FIXED_SECTION_LENGTH: usize = 9;

const fn prototype<const N: usize>(head: [u8; N]) -> [u8; TS_PACKET_SIZE] {
    let mut packet = [0xff; TS_PACKET_SIZE];
    let mut i = 0;
    while i < N {
        packet[i] = head[i];
        i += 1;
    }
    packet
}

const PAT_PROTOTYPE: [u8; TS_PACKET_SIZE] = prototype([
    TS_SYNC_BYTE,
    // tei:0 pusi:1 tp:0 pid:0 0000 0000 0000
    0x40, 0x00,
    // tsc:00 afc:01 cc:0000
    0x10,
    // pointer_field
    0x00,
    // tid:0000 0000 ssi:1 0:0 r:11 sl:0000 0000 1101
    TABLE_ID_PAT, 0xb0, 0x0d,
    // transport_stream_id
    (TABLE_EXT_PAT >> 8) as u8, TABLE_EXT_PAT as u8,
    // r:11 vn:00000 cni:1 sn:0000 0000 lsn:0000 0000
    0xc1, 0x00, 0x00,
    // program_number
    (PROGRAM_NUMBER >> 8) as u8, PROGRAM_NUMBER as u8,
    // r:111 program_map_PID, patched
    0xe0, 0x00,
]);

const PMT_PROTOTYPE: [u8; TS_PACKET_SIZE] = prototype([
    TS_SYNC_BYTE,
    // tei:0 pusi:1 tp:0 pid, patched
    0x40, 0x00,
    // tsc:00 afc:01 cc:0000
    0x10,
    // pointer_field
    0x00,
    // tid:0000 0010 ssi:1 0:0 r:11 sl, patched
    TABLE_ID_PMT, 0xb0, 0x00,
    // program_number
    (PROGRAM_NUMBER >> 8) as u8, PROGRAM_NUMBER as u8,
    // r:11 vn:00000 cni:1 sn:0000 0000 lsn:0000 0000
    0xc1, 0x00, 0x00,
    // r:111 PCR_PID: none
    0xe0 | (PID_NULL >> 8) as u8, PID_NULL as u8,
    // r:1111 program_info_length, patched
    0xf0, 0x00,
]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub tag: u8,
    pub data: Vec<u8>,
}

impl Descriptor {
    /// Points the program at ID3 timed metadata carried in this program.
    pub fn metadata_pointer() -> Self {
        let mut data = Vec::with_capacity(15);
        // metadata_application_format: 0xFFFF, identifier follows
        data.put_u16(0xffff);
        data.put_slice(&ID3_FORMAT_IDENTIFIER);
        // metadata_format: 0xFF, identifier follows
        data.put_u8(0xff);
        data.put_slice(&ID3_FORMAT_IDENTIFIER);
        data.put_u8(0x00); // metadata_service_id
        data.put_u8(0x1f); // mlf:0 mcf:00 r:11111
        data.put_u16(PROGRAM_NUMBER);
        Self {
            tag: DESCRIPTOR_TAG_METADATA_POINTER,
            data,
        }
    }

    /// Describes an ID3 elementary stream.
    pub fn metadata() -> Self {
        let mut data = Vec::with_capacity(13);
        data.put_u16(0xffff);
        data.put_slice(&ID3_FORMAT_IDENTIFIER);
        data.put_u8(0xff);
        data.put_slice(&ID3_FORMAT_IDENTIFIER);
        data.put_u8(0x00); // metadata_service_id
        data.put_u8(0x0f); // dcf:000 dsmf:00 r:1111
        Self {
            tag: DESCRIPTOR_TAG_METADATA,
            data,
        }
    }

    pub fn len(&self) -> usize {
        2 + self.data.len()
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.tag);
        buf.put_u8(self.data.len() as u8);
        buf.put_slice(&self.data);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementaryStreamInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub descriptors: Vec<Descriptor>,
}

impl ElementaryStreamInfo {
    fn len(&self) -> usize {
        5 + descriptors_len(&self.descriptors)
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.stream_type);
        buf.put_u16(self.elementary_pid & 0x1fff | 7 << 13);
        buf.put_u16(descriptors_len(&self.descriptors) as u16 & 0x3ff | 0xf << 12);
        for desc in &self.descriptors {
            desc.write_to(buf);
        }
    }
}

fn descriptors_len(descriptors: &[Descriptor]) -> usize {
    descriptors.iter().map(Descriptor::len).sum()
}

/// PIDs of the single program this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramMap {
    pub pmt_pid: u16,
    /// ID3 timed-metadata stream; adds the metadata descriptors when present
    pub id3_pid: Option<u16>,
    /// H.264 video stream
    pub video_pid: Option<u16>,
    /// ADTS AAC audio stream
    pub audio_pid: Option<u16>,
}

impl ProgramMap {
    pub fn new(pmt_pid: u16) -> Self {
        Self {
            pmt_pid,
            id3_pid: None,
            video_pid: None,
            audio_pid: None,
        }
    }

    pub fn with_id3_pid(mut self, pid: u16) -> Self {
        self.id3_pid = Some(pid);
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

    /// Checks every PID is in range and that no two streams share one.
    pub fn validate(&self) -> Result<()> {
        let pids = self.named_pids();
        for &(name, pid) in &pids {
            validate_pid(name, pid)?;
        }
        for (i, &(first, pid)) in pids.iter().enumerate() {
            if let Some(&(second, _)) = pids[i + 1..].iter().find(|(_, other)| *other == pid) {
                return Err(Id3TsError::PidCollision { first, second, pid });
            }
        }
        Ok(())
    }

    fn named_pids(&self) -> Vec<(&'static str, u16)> {
        let mut pids = vec![("pmtPid", self.pmt_pid)];
        if let Some(pid) = self.id3_pid {
            pids.push(("id3Pid", pid));
        }
        if let Some(pid) = self.video_pid {
            pids.push(("videoPid", pid));
        }
        if let Some(pid) = self.audio_pid {
            pids.push(("audioPid", pid));
        }
        pids
    }

    fn program_descriptors(&self) -> Vec<Descriptor> {
        match self.id3_pid {
            Some(_) => vec![Descriptor::metadata_pointer()],
            None => Vec::new(),
        }
    }

    /// Stream loop in emission order: video, audio, ID3.
    pub fn elementary_stream_infos(&self) -> Vec<ElementaryStreamInfo> {
        let mut infos = Vec::with_capacity(3);
        if let Some(pid) = self.video_pid {
            infos.push(ElementaryStreamInfo {
                stream_type: STREAM_TYPE_H264,
                elementary_pid: pid,
                descriptors: Vec::new(),
            });
        }
        if let Some(pid) = self.audio_pid {
            infos.push(ElementaryStreamInfo {
                stream_type: STREAM_TYPE_AAC,
                elementary_pid: pid,
                descriptors: Vec::new(),
            });
        }
        if let Some(pid) = self.id3_pid {
            infos.push(ElementaryStreamInfo {
                stream_type: STREAM_TYPE_METADATA,
                elementary_pid: pid,
                descriptors: vec![Descriptor::metadata()],
            });
        }
        infos
    }
}

/// Writes a PAT packet announcing program 1 on `pmt_pid`.
pub fn write_pat(buf: &mut [u8], offset: usize, pmt_pid: u16) -> Result<()> {
    validate_pid("pmtPid", pmt_pid)?;
    ensure_remaining(buf, offset, TS_PACKET_SIZE, "a PAT packet")?;

    let packet = &mut buf[offset..offset + TS_PACKET_SIZE];
    packet.copy_from_slice(&PAT_PROTOTYPE);
    packet[PAT_PMT_PID_OFFSET] |= ((pmt_pid >> 8) & 0x1f) as u8;
    packet[PAT_PMT_PID_OFFSET + 1] |= (pmt_pid & 0xff) as u8;

    write_crc32(packet, PAT_CRC_OFFSET, SECTION_START..PAT_CRC_OFFSET)
}

/// Writes a PMT packet for `program` on its PMT PID.
pub fn write_pmt(buf: &mut [u8], offset: usize, program: &ProgramMap) -> Result<()> {
    program.validate()?;
    ensure_remaining(buf, offset, TS_PACKET_SIZE, "a PMT packet")?;

    let program_descriptors = program.program_descriptors();
    let streams = program.elementary_stream_infos();
    let program_info_length = descriptors_len(&program_descriptors);
    let loops_length = program_info_length + streams.iter().map(ElementaryStreamInfo::len).sum::<usize>();
    let section_length = PMT_FIXED_SECTION_LENGTH + loops_length + CRC32_SIZE;
    let crc_offset = PMT_LOOP_START + loops_length;

    let packet = &mut buf[offset..offset + TS_PACKET_SIZE];
    packet.copy_from_slice(&PMT_PROTOTYPE);
    packet[1] |= ((program.pmt_pid >> 8) & 0x1f) as u8;
    packet[2] |= (program.pmt_pid & 0xff) as u8;
    packet[SECTION_LENGTH_OFFSET] |= ((section_length >> 8) & 0x0f) as u8;
    packet[SECTION_LENGTH_OFFSET + 1] |= (section_length & 0xff) as u8;
    packet[PMT_PROGRAM_INFO_LENGTH_OFFSET] |= ((program_info_length >> 8) & 0x0f) as u8;
    packet[PMT_PROGRAM_INFO_LENGTH_OFFSET + 1] |= (program_info_length & 0xff) as u8;

    {
        let mut loops = &mut packet[PMT_LOOP_START..crc_offset];
        for desc in &program_descriptors {
            desc.write_to(&mut loops);
        }
        for info in &streams {
            info.write_to(&mut loops);
        }
    }

    write_crc32(packet, crc_offset, SECTION_START..crc_offset)
}
