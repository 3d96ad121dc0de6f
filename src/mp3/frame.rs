//! MP3 frame header parsing
//!
//! MP3 frames start with a sync word (11 bits of 1s) followed by header info.
//! Frame header structure (4 bytes):
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//!
//! A = sync (11 bits)
//! B = MPEG version (2 bits): 00=2.5, 01=reserved, 10=2, 11=1
//! C = Layer (2 bits): 00=reserved, 01=III, 10=II, 11=I
//! D = Protection bit (0 = 16-bit CRC follows the header)
//! E = Bitrate index (4 bits)
//! F = Sample rate index (2 bits)
//! G = Padding bit
//! H = Private bit
//! I = Channel mode (2 bits)
//! J..M = Mode extension, copyright, original, emphasis (ignored here)

use std::io::{self, Read, Seek, SeekFrom};

/// How far past the ID3 tag to look for the first frame before giving up.
const MAX_SYNC_SEARCH: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    /// kbps
    pub bitrate: u32,
    pub sample_rate: u32,
    pub has_crc: bool,
    pub mono: bool,
    pub frame_size: u32,
    pub samples_per_frame: u32,
}

// Bitrate lookup tables (kbps)
// Index 0 = free, 15 = bad
const BITRATES_V1_L3: [u32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0];
const BITRATES_V1_L2: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0];
const BITRATES_V1_L1: [u32; 16] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0];
const BITRATES_V2_L23: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];
const BITRATES_V2_L1: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0];

// Sample rate lookup tables (Hz)
const SAMPLE_RATES_V1: [u32; 4] = [44100, 48000, 32000, 0];
const SAMPLE_RATES_V2: [u32; 4] = [22050, 24000, 16000, 0];
const SAMPLE_RATES_V25: [u32; 4] = [11025, 12000, 8000, 0];

impl FrameHeader {
    /// Parse a 4-byte MP3 frame header. Free-format and reserved values are rejected.
    pub fn parse(header: [u8; 4]) -> Option<Self> {
        if header[0] != 0xFF || (header[1] & 0xE0) != 0xE0 {
            return None;
        }

        let version = match (header[1] >> 3) & 0x03 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => return None,
        };

        let layer = match (header[1] >> 1) & 0x03 {
            1 => Layer::Layer3,
            2 => Layer::Layer2,
            3 => Layer::Layer1,
            _ => return None,
        };

        let has_crc = header[1] & 0x01 == 0;

        let bitrate_idx = ((header[2] >> 4) & 0x0F) as usize;
        let bitrate = match (version, layer) {
            (MpegVersion::Mpeg1, Layer::Layer1) => BITRATES_V1_L1[bitrate_idx],
            (MpegVersion::Mpeg1, Layer::Layer2) => BITRATES_V1_L2[bitrate_idx],
            (MpegVersion::Mpeg1, Layer::Layer3) => BITRATES_V1_L3[bitrate_idx],
            (_, Layer::Layer1) => BITRATES_V2_L1[bitrate_idx],
            (_, _) => BITRATES_V2_L23[bitrate_idx],
        };
        if bitrate == 0 {
            return None;
        }

        let sample_rate_idx = ((header[2] >> 2) & 0x03) as usize;
        let sample_rate = match version {
            MpegVersion::Mpeg1 => SAMPLE_RATES_V1[sample_rate_idx],
            MpegVersion::Mpeg2 => SAMPLE_RATES_V2[sample_rate_idx],
            MpegVersion::Mpeg25 => SAMPLE_RATES_V25[sample_rate_idx],
        };
        if sample_rate == 0 {
            return None;
        }

        let padding = (header[2] & 0x02) != 0;
        let mono = (header[3] >> 6) & 0x03 == 3;

        let samples_per_frame = match (version, layer) {
            (_, Layer::Layer1) => 384,
            (MpegVersion::Mpeg1, _) | (_, Layer::Layer2) => 1152,
            (_, Layer::Layer3) => 576,
        };

        let frame_size = match layer {
            Layer::Layer1 => (12 * bitrate * 1000 / sample_rate + padding as u32) * 4,
            _ => samples_per_frame / 8 * bitrate * 1000 / sample_rate + padding as u32,
        };

        Some(FrameHeader {
            version,
            layer,
            bitrate,
            sample_rate,
            has_crc,
            mono,
            frame_size,
            samples_per_frame,
        })
    }

    /// Byte offset of a Xing/Info tag from the start of the frame (Layer III only).
    pub fn side_info_end(&self) -> usize {
        let side_info = match (self.version, self.mono) {
            (MpegVersion::Mpeg1, false) => 32,
            (MpegVersion::Mpeg1, true) => 17,
            (_, false) => 17,
            (_, true) => 9,
        };
        4 + if self.has_crc { 2 } else { 0 } + side_info
    }
}

/// Size of a leading ID3v2 tag (header included), or 0 when there is none.
///
/// Leaves the reader positioned at the first byte after the tag.
pub fn skip_id3v2<R: Read + Seek>(reader: &mut R) -> io::Result<u64> {
    // "ID3" (3) + version (2) + flags (1) + syncsafe size (4) = 10 bytes
    let mut tag = [0u8; 10];
    reader.seek(SeekFrom::Start(0))?;

    let start = match reader.read_exact(&mut tag) {
        Ok(()) if &tag[..3] == b"ID3" => {
            let size = ((tag[6] as u64 & 0x7F) << 21)
                | ((tag[7] as u64 & 0x7F) << 14)
                | ((tag[8] as u64 & 0x7F) << 7)
                | (tag[9] as u64 & 0x7F);
            // Footer flag adds another 10 bytes
            let footer = if tag[5] & 0x10 != 0 { 10 } else { 0 };
            10 + size + footer
        }
        Ok(()) => 0,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
        Err(e) => return Err(e),
    };

    reader.seek(SeekFrom::Start(start))?;
    Ok(start)
}

/// Locate the first valid frame after any ID3v2 tag.
///
/// Returns the frame's byte offset and parsed header, or `None` when no frame
/// starts within the search window.
pub fn find_first_frame<R: Read + Seek>(reader: &mut R) -> io::Result<Option<(u64, FrameHeader)>> {
    let start = skip_id3v2(reader)?;
    let mut window = Vec::new();
    reader.take(MAX_SYNC_SEARCH + 3).read_to_end(&mut window)?;

    let found = window
        .windows(4)
        .enumerate()
        .find_map(|(i, bytes)| FrameHeader::parse([bytes[0], bytes[1], bytes[2], bytes[3]]).map(|h| (i, h)));

    Ok(found.map(|(i, header)| (start + i as u64, header)))
}
