use std::io::{self, Read, Write};

use tracing::{debug, warn};

use super::DecodeError;

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the header [`WaveHeader::write_to`] emits.
pub const CANONICAL_HEADER_LEN: u32 = 44;

/// Chunks that may sit between `fmt ` and `data` without carrying samples.
const ANCILLARY_CHUNKS: [&[u8; 4]; 6] = [b"LIST", b"fact", b"JUNK", b"PAD ", b"bext", b"cue "];

/// Parsed RIFF/WAVE header, field for field as laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveHeader {
    pub riff: [u8; 4],
    /// File length minus the 8 bytes of the RIFF preamble.
    pub overall_size: u32,
    pub wave: [u8; 4],
    pub fmt_chunk_marker: [u8; 4],
    pub fmt_length: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_chunk_header: [u8; 4],
    pub data_size: u32,
    /// Effective sample format; differs from `format_tag` only for
    /// `WAVE_FORMAT_EXTENSIBLE` files, where it comes from the sub-format GUID.
    pub sample_format: u16,
}

impl WaveHeader {
    /// Builds a canonical integer PCM header, deriving `byte_rate` and
    /// `block_align` from the channel count, rate and bit depth. Layouts
    /// whose derived fields do not fit their on-disk widths are rejected.
    pub fn pcm(
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
        data_size: u32,
    ) -> Result<Self, DecodeError> {
        let block_align = channels.checked_mul(bits_per_sample / 8).ok_or_else(|| {
            DecodeError::UnsupportedFormat(format!(
                "{channels} channels of {bits_per_sample}-bit samples exceed the block align field"
            ))
        })?;
        let byte_rate = sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| {
                DecodeError::UnsupportedFormat(format!(
                    "{sample_rate} Hz with {block_align}-byte frames exceeds the byte rate field"
                ))
            })?;
        Ok(Self {
            riff: *b"RIFF",
            overall_size: data_size.saturating_add(CANONICAL_HEADER_LEN - 8),
            wave: *b"WAVE",
            fmt_chunk_marker: *b"fmt ",
            fmt_length: 16,
            format_tag: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            data_chunk_header: *b"data",
            data_size,
            sample_format: WAVE_FORMAT_PCM,
        })
    }

    /// Reads the header and leaves `reader` positioned on the first sample byte.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let riff = read_tag(reader)?;
        expect_tag(&riff, b"RIFF")?;
        let overall_size = read_u32(reader)?;
        let wave = read_tag(reader)?;
        expect_tag(&wave, b"WAVE")?;

        let fmt_chunk_marker = read_tag(reader)?;
        expect_tag(&fmt_chunk_marker, b"fmt ")?;
        let fmt_length = read_u32(reader)?;
        if fmt_length < 16 {
            return Err(DecodeError::BadHeader(format!(
                "fmt chunk is {fmt_length} bytes, expected at least 16"
            )));
        }

        let format_tag = read_u16(reader)?;
        let channels = read_u16(reader)?;
        let sample_rate = read_u32(reader)?;
        let byte_rate = read_u32(reader)?;
        let block_align = read_u16(reader)?;
        let bits_per_sample = read_u16(reader)?;

        let mut sample_format = format_tag;
        let extension_len = u64::from(fmt_length - 16) + u64::from(fmt_length & 1);
        if extension_len > 0 {
            // cbSize, valid bits, channel mask, then the sub-format GUID whose
            // first two bytes are the format code.
            let mut extension = [0_u8; 10];
            let inspected = extension_len.min(extension.len() as u64) as usize;
            read_bytes(reader, &mut extension[..inspected])?;
            skip(reader, extension_len - inspected as u64)?;
            if format_tag == WAVE_FORMAT_EXTENSIBLE && inspected == extension.len() {
                sample_format = u16::from_le_bytes([extension[8], extension[9]]);
            }
        }

        let (data_chunk_header, data_size) = loop {
            let tag = read_tag(reader)?;
            let size = read_u32(reader)?;
            if &tag == b"data" {
                break (tag, size);
            }
            if !ANCILLARY_CHUNKS.contains(&&tag) {
                return Err(DecodeError::BadHeader(format!(
                    "expected `data` chunk, found `{}`",
                    String::from_utf8_lossy(&tag)
                )));
            }
            debug!(chunk = %String::from_utf8_lossy(&tag), size, "skipping ancillary chunk");
            skip(reader, u64::from(size) + u64::from(size & 1))?;
        };

        Ok(Self {
            riff,
            overall_size,
            wave,
            fmt_chunk_marker,
            fmt_length,
            format_tag,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            data_chunk_header,
            data_size,
            sample_format,
        })
    }

    /// Rejects content the decoder cannot convert to floats.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.channels == 0 {
            return Err(DecodeError::UnsupportedFormat("zero channels".into()));
        }
        if !matches!(self.bits_per_sample, 8 | 16 | 32) {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{}-bit samples",
                self.bits_per_sample
            )));
        }
        if self.sample_format != WAVE_FORMAT_PCM {
            return Err(DecodeError::UnsupportedFormat(format!(
                "format tag {:#06x}",
                self.sample_format
            )));
        }
        if self.sample_rate == 0 {
            return Err(DecodeError::UnsupportedFormat("zero sample rate".into()));
        }
        if self.frame_bytes() > usize::from(u16::MAX) {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{}-byte frames exceed the block align field",
                self.frame_bytes()
            )));
        }
        if usize::from(self.block_align) != self.frame_bytes() {
            warn!(
                block_align = self.block_align,
                derived = self.frame_bytes(),
                "block align disagrees with channel layout, using derived value"
            );
        }
        Ok(())
    }

    /// Bytes occupied by one multi-channel sample frame.
    pub fn frame_bytes(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }

    /// Whole frames described by `data_size`. Bytes that do not complete a
    /// frame are not counted.
    pub fn frame_count(&self) -> u64 {
        match self.frame_bytes() {
            0 => 0,
            bytes => u64::from(self.data_size) / bytes as u64,
        }
    }

    /// Writes the canonical 44-byte layout. Extension bytes and ancillary
    /// chunks of a parsed header are not reproduced.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.riff)?;
        writer.write_all(&self.overall_size.to_le_bytes())?;
        writer.write_all(&self.wave)?;
        writer.write_all(&self.fmt_chunk_marker)?;
        writer.write_all(&16_u32.to_le_bytes())?;
        writer.write_all(&self.format_tag.to_le_bytes())?;
        writer.write_all(&self.channels.to_le_bytes())?;
        writer.write_all(&self.sample_rate.to_le_bytes())?;
        writer.write_all(&self.byte_rate.to_le_bytes())?;
        writer.write_all(&self.block_align.to_le_bytes())?;
        writer.write_all(&self.bits_per_sample.to_le_bytes())?;
        writer.write_all(&self.data_chunk_header)?;
        writer.write_all(&self.data_size.to_le_bytes())
    }
}

fn expect_tag(found: &[u8; 4], expected: &[u8; 4]) -> Result<(), DecodeError> {
    if found == expected {
        Ok(())
    } else {
        Err(DecodeError::BadHeader(format!(
            "expected `{}` marker, found `{}`",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(found)
        )))
    }
}

fn read_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::BadHeader("header is truncated".into()),
        _ => DecodeError::IoFailure(err),
    })
}

fn read_tag<R: Read>(reader: &mut R) -> Result<[u8; 4], DecodeError> {
    let mut tag = [0_u8; 4];
    read_bytes(reader, &mut tag)?;
    Ok(tag)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, DecodeError> {
    Ok(u32::from_le_bytes(read_tag(reader)?))
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16, DecodeError> {
    let mut buf = [0_u8; 2];
    read_bytes(reader, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn skip<R: Read>(reader: &mut R, len: u64) -> Result<(), DecodeError> {
    let skipped = io::copy(&mut reader.take(len), &mut io::sink())?;
    if skipped < len {
        return Err(DecodeError::BadHeader("header is truncated".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn canonical_bytes(header: &WaveHeader) -> Vec<u8> {
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn derives_rate_fields_for_pcm() {
        let header = WaveHeader::pcm(2, 44_100, 16, 400).unwrap();

        assert_eq!(header.block_align, 4);
        assert_eq!(header.byte_rate, 176_400);
        assert_eq!(header.overall_size, 436);
        assert_eq!(header.frame_count(), 100);
    }

    #[test]
    fn canonical_layout_is_44_bytes_and_parses_back() {
        let header = WaveHeader::pcm(1, 8_000, 8, 10).unwrap();
        let bytes = canonical_bytes(&header);

        assert_eq!(bytes.len(), CANONICAL_HEADER_LEN as usize);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]), 10);

        let parsed = WaveHeader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_mismatched_markers() {
        let mut bytes = canonical_bytes(&WaveHeader::pcm(1, 8_000, 16, 0).unwrap());
        bytes[8..12].copy_from_slice(b"AVI ");

        let err = WaveHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader(_)));
    }

    #[test]
    fn truncated_header_is_a_bad_header() {
        let bytes = canonical_bytes(&WaveHeader::pcm(1, 8_000, 16, 0).unwrap());
        let err = WaveHeader::read_from(&mut Cursor::new(&bytes[..20])).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader(_)));
    }

    #[test]
    fn skips_extension_bytes_and_list_chunks() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&18_u32.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&8_000_u32.to_le_bytes());
        bytes.extend_from_slice(&16_000_u32.to_le_bytes());
        bytes.extend_from_slice(&2_u16.to_le_bytes());
        bytes.extend_from_slice(&16_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3_u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 0]);
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&6_u32.to_le_bytes());
        bytes.extend_from_slice(&[0xAA; 6]);

        let mut cursor = Cursor::new(bytes);
        let header = WaveHeader::read_from(&mut cursor).unwrap();
        header.validate().unwrap();

        assert_eq!(header.fmt_length, 18);
        assert_eq!(header.data_size, 6);
        assert_eq!(header.frame_count(), 3);
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![0xAA; 6]);
    }

    #[test]
    fn unknown_chunk_before_data_is_rejected() {
        let mut bytes = canonical_bytes(&WaveHeader::pcm(1, 8_000, 16, 0).unwrap());
        bytes[36..40].copy_from_slice(b"smpl");

        let err = WaveHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader(_)));
    }

    #[test]
    fn validation_rejects_unsupported_content() {
        let mut header = WaveHeader::pcm(1, 8_000, 24, 0).unwrap();
        assert!(matches!(header.validate(), Err(DecodeError::UnsupportedFormat(_))));

        header.bits_per_sample = 16;
        header.channels = 0;
        assert!(matches!(header.validate(), Err(DecodeError::UnsupportedFormat(_))));

        header.channels = 1;
        header.sample_format = 3;
        assert!(matches!(header.validate(), Err(DecodeError::UnsupportedFormat(_))));
    }

    #[test]
    fn derived_fields_that_overflow_are_rejected() {
        let err = WaveHeader::pcm(40_000, 8_000, 16, 0).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));

        let err = WaveHeader::pcm(2, 1_000_000_000, 32, 0).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));

        let header = WaveHeader::pcm(u16::MAX / 4, 8_000, 32, 0).unwrap();
        assert_eq!(header.block_align, u16::MAX / 4 * 4);
    }

    #[test]
    fn validation_rejects_frames_wider_than_block_align() {
        let mut header = WaveHeader::pcm(1, 8_000, 16, 0).unwrap();
        header.channels = 40_000;
        assert!(matches!(header.validate(), Err(DecodeError::UnsupportedFormat(_))));

        header.channels = 32_767;
        header.validate().unwrap();
    }
}
