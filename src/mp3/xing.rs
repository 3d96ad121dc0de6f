//! Xing/Info tag parsing
//!
//! VBR encoders write a Xing tag into the first (silent) frame. Its frame and
//! byte counts give the stream's average bitrate, which the first frame's own
//! header doesn't: that frame is usually encoded at an arbitrary bitrate just
//! to make room for the tag. CBR files written by LAME carry the same
//! structure under the name "Info".
//!
//! ```text
//! Offset | Size | Field
//! -------|------|----------------------------------
//!   0    |  4   | "Xing" or "Info"
//!   4    |  4   | flags (big-endian)
//!   8    |  4   | frame count   (if flags & 0x01)
//!   +    |  4   | byte count    (if flags & 0x02)
//!   +    | 100  | seek TOC      (if flags & 0x04)
//!   +    |  4   | quality       (if flags & 0x08)
//! ```

use super::frame::{FrameHeader, Layer};

const FLAG_FRAMES: u32 = 0x01;
const FLAG_BYTES: u32 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XingHeader {
    /// "Xing" (true) or "Info" (false)
    pub is_vbr: bool,
    pub total_frames: Option<u32>,
    pub total_bytes: Option<u32>,
}

impl XingHeader {
    /// Parse the tag inside `frame`, which starts at the frame header.
    pub fn parse(frame: &[u8], header: &FrameHeader) -> Option<Self> {
        if header.layer != Layer::Layer3 {
            return None;
        }

        let pos = header.side_info_end();
        let is_vbr = match frame.get(pos..pos + 4)? {
            b"Xing" => true,
            b"Info" => false,
            _ => return None,
        };

        let flags = read_u32(frame, pos + 4)?;
        let mut offset = pos + 8;

        let total_frames = if flags & FLAG_FRAMES != 0 {
            let value = read_u32(frame, offset);
            offset += 4;
            value
        } else {
            None
        };

        let total_bytes = if flags & FLAG_BYTES != 0 {
            read_u32(frame, offset)
        } else {
            None
        };

        Some(XingHeader {
            is_vbr,
            total_frames,
            total_bytes,
        })
    }

    /// Average bitrate in kbps implied by the frame and byte counts.
    ///
    /// `bytes * 8 / duration`, with duration = `frames * samples_per_frame / sample_rate`,
    /// truncated to whole kbps.
    pub fn average_bitrate(&self, header: &FrameHeader) -> Option<u32> {
        let frames = self.total_frames.filter(|&f| f > 0)? as u64;
        let bytes = self.total_bytes.filter(|&b| b > 0)? as u64;

        let numerator = bytes * 8 * header.sample_rate as u64;
        let denominator = frames * header.samples_per_frame as u64 * 1000;
        Some((numerator / denominator) as u32)
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
