//! MP3 bitrate metadata
//!
//! The declared bitrate comes from the stream itself, not from tags:
//!
//! 1. Skip any ID3v2 tag and find the first valid frame header.
//! 2. If that frame carries a Xing tag with frame and byte counts, the
//!    declared bitrate is the stream average (VBR).
//! 3. Otherwise it is the first frame's bitrate (CBR, or a LAME "Info" tag).

pub mod frame;
pub mod xing;

use crate::error::MetadataError;
use frame::find_first_frame;
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use xing::XingHeader;

/// Reads the declared bitrate of a lossy file.
pub trait BitrateReader: Send + Sync {
    fn bitrate_kbps(&self, path: &Path) -> Result<u32, MetadataError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3BitrateReader;

impl BitrateReader for Mp3BitrateReader {
    fn bitrate_kbps(&self, path: &Path) -> Result<u32, MetadataError> {
        let mut reader = BufReader::new(File::open(path)?);
        let kbps = read_bitrate(&mut reader)?;
        debug!("{}: declared bitrate {} kbps", path.display(), kbps);
        Ok(kbps)
    }
}

/// Declared bitrate (kbps) of an MP3 stream.
pub fn read_bitrate<R: Read + Seek>(reader: &mut R) -> Result<u32, MetadataError> {
    let (offset, header) = find_first_frame(reader)?.ok_or(MetadataError::MissingMetadata)?;

    let mut frame = Vec::with_capacity(header.frame_size as usize);
    reader.seek(SeekFrom::Start(offset))?;
    reader.take(header.frame_size as u64).read_to_end(&mut frame)?;

    let average = XingHeader::parse(&frame, &header)
        .filter(|tag| tag.is_vbr)
        .and_then(|tag| tag.average_bitrate(&header));

    match average {
        Some(kbps) => {
            debug!("Xing tag average bitrate {} kbps", kbps);
            Ok(kbps)
        }
        None => Ok(header.bitrate),
    }
}
