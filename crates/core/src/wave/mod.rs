//! WAV decoding into normalised `f32` samples.
//!
//! A [`Wave`] is created by [`Wave::open`], which validates the RIFF header
//! and leaves the file positioned on the first sample frame. Frames are then
//! pulled sequentially with [`Wave::read`], or all at once with
//! [`Wave::decode_all`] into an owned interleaved buffer that
//! [`Wave::resample`] and [`Wave::write`] operate on. [`Wave::close`]
//! consumes the value, so a closed wave cannot be read again.

mod header;
pub mod resample;
mod writer;

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

pub use header::{WaveHeader, CANONICAL_HEADER_LEN, WAVE_FORMAT_EXTENSIBLE, WAVE_FORMAT_PCM};
pub use writer::{encode_pcm, write_wav, write_wav_to};

/// Failures raised while opening or reading a WAV file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to access WAV file: {0}")]
    IoFailure(#[from] io::Error),
    #[error("bad WAV header: {0}")]
    BadHeader(String),
    #[error("unsupported WAV format: {0}")]
    UnsupportedFormat(String),
    /// The data chunk ended part-way through a sample frame.
    #[error("truncated sample frame: {bytes} of {frame_bytes} bytes present")]
    TruncatedFrame { bytes: usize, frame_bytes: usize },
}

/// Outcome of a [`Wave::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Every requested frame was decoded.
    Success,
    /// Fewer frames than requested were left; the stream is exhausted.
    Eof,
    /// The read hit malformed or unreadable data. `WaveRead::error` says why.
    Error,
}

/// Samples decoded by a single [`Wave::read`] call.
#[derive(Debug)]
#[must_use = "the read status must be checked"]
pub struct WaveRead {
    /// Interleaved samples in `[-1, 1]`, `frames * channels` long.
    pub samples: Vec<f32>,
    pub frames: usize,
    pub status: ReadStatus,
    pub error: Option<DecodeError>,
}

/// An open WAV file plus any samples decoded into memory.
#[derive(Debug)]
pub struct Wave {
    path: PathBuf,
    header: WaveHeader,
    reader: BufReader<File>,
    /// File offset of the first sample byte.
    data_offset: u64,
    /// Frames present in the on-disk data chunk.
    data_frames: u64,
    frames_read: u64,
    /// `samples` holds the whole data chunk, possibly resampled.
    decoded: bool,
    num_samples: u64,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Wave {
    /// Opens `path` and validates its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let header = WaveHeader::read_from(&mut reader)?;
        header.validate()?;
        let data_offset = reader.stream_position()?;

        let data_frames = header.frame_count();
        let trailing = u64::from(header.data_size) - data_frames * header.frame_bytes() as u64;
        if trailing > 0 {
            warn!(
                path = %path.display(),
                trailing,
                "data chunk ends with a partial frame, ignoring trailing bytes"
            );
        }
        debug!(
            path = %path.display(),
            channels = header.channels,
            sample_rate = header.sample_rate,
            bits = header.bits_per_sample,
            frames = data_frames,
            "opened wave file"
        );

        Ok(Self {
            path,
            sample_rate: header.sample_rate,
            header,
            reader,
            data_offset,
            data_frames,
            frames_read: 0,
            decoded: false,
            num_samples: data_frames,
            samples: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The header as parsed from disk.
    pub fn header(&self) -> &WaveHeader {
        &self.header
    }

    pub fn channels(&self) -> usize {
        usize::from(self.header.channels)
    }

    /// Current sample rate; changes after [`Wave::resample`].
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.header.bits_per_sample
    }

    /// Number of multi-channel sample frames at the current sample rate.
    pub fn num_samples(&self) -> u64 {
        self.num_samples
    }

    pub fn duration_seconds(&self) -> f64 {
        self.num_samples as f64 / f64::from(self.sample_rate)
    }

    /// Frames still unread in the file.
    pub fn frames_remaining(&self) -> u64 {
        self.data_frames.saturating_sub(self.frames_read)
    }

    /// Interleaved samples decoded into memory so far.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Moves the in-memory buffer out, leaving it empty. A later
    /// [`Wave::decode_all`] does not decode the file again.
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    /// Reads up to `count` frames from the current file position.
    pub fn read(&mut self, count: usize) -> WaveRead {
        let frame_bytes = self.header.frame_bytes();
        let wanted = (count as u64).min(self.frames_remaining()) as usize;
        let mut raw = vec![0_u8; wanted * frame_bytes];
        let (filled, io_error) = fill(&mut self.reader, &mut raw);

        let frames = filled / frame_bytes;
        let leftover = filled % frame_bytes;
        let mut samples = Vec::with_capacity(frames * self.channels());
        let clamped = decode_pcm(
            &raw[..frames * frame_bytes],
            self.header.bits_per_sample,
            &mut samples,
        );
        if clamped > 0 {
            warn!(clamped, "sample values outside [-1, 1] were clamped");
        }
        self.frames_read += frames as u64;

        let error = match io_error {
            Some(err) => Some(DecodeError::IoFailure(err)),
            None if leftover > 0 => Some(DecodeError::TruncatedFrame {
                bytes: leftover,
                frame_bytes,
            }),
            None => None,
        };
        let status = if error.is_some() {
            warn!(frames, requested = count, "wave read failed part-way");
            ReadStatus::Error
        } else if frames < count {
            ReadStatus::Eof
        } else {
            ReadStatus::Success
        };

        WaveRead {
            samples,
            frames,
            status,
            error,
        }
    }

    /// Decodes the whole data chunk into the in-memory buffer, including
    /// frames already streamed by [`Wave::read`]. Once decoded, the buffer is
    /// returned as is, so a resampled buffer is never overwritten.
    pub fn decode_all(&mut self) -> Result<&[f32], DecodeError> {
        const CHUNK_FRAMES: usize = 16_384;

        if self.decoded {
            return Ok(&self.samples);
        }
        if self.frames_read > 0 {
            debug!(
                frames_read = self.frames_read,
                "rewinding to the start of the data chunk"
            );
            self.reader.seek(SeekFrom::Start(self.data_offset))?;
            self.frames_read = 0;
        }
        self.samples.clear();

        loop {
            let chunk = self.read(CHUNK_FRAMES);
            self.samples.extend_from_slice(&chunk.samples);
            match chunk.status {
                ReadStatus::Success => continue,
                ReadStatus::Eof => break,
                ReadStatus::Error => {
                    return Err(chunk
                        .error
                        .unwrap_or_else(|| DecodeError::BadHeader("unreadable data".into())))
                }
            }
        }
        self.num_samples = (self.samples.len() / self.channels()) as u64;
        self.decoded = true;
        Ok(&self.samples)
    }

    /// Resamples the whole stream to `target_rate` by linear interpolation,
    /// decoding it first if needed.
    pub fn resample(&mut self, target_rate: u32) -> Result<(), DecodeError> {
        if target_rate == 0 {
            return Err(DecodeError::UnsupportedFormat("zero target sample rate".into()));
        }
        self.decode_all()?;
        if target_rate == self.sample_rate {
            return Ok(());
        }

        self.samples =
            resample::linear(&self.samples, self.channels(), self.sample_rate, target_rate);
        debug!(
            from = self.sample_rate,
            to = target_rate,
            frames = self.samples.len() / self.channels(),
            "resampled wave"
        );
        self.sample_rate = target_rate;
        self.num_samples = (self.samples.len() / self.channels()) as u64;
        Ok(())
    }

    /// Writes the in-memory buffer as PCM at the source bit depth and the
    /// current sample rate.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DecodeError> {
        write_wav(
            path,
            self.header.channels,
            self.sample_rate,
            self.header.bits_per_sample,
            &self.samples,
        )
    }

    /// Releases the file handle and sample storage.
    pub fn close(self) {
        debug!(path = %self.path.display(), "closed wave file");
    }
}

/// Largest positive value for each supported bit depth; decoding divides by it.
pub(crate) fn full_scale(bits_per_sample: u16) -> f64 {
    match bits_per_sample {
        8 => f64::from(i8::MAX),
        16 => f64::from(i16::MAX),
        _ => f64::from(i32::MAX),
    }
}

/// Converts little-endian PCM bytes to floats, returning how many values had
/// to be clamped into `[-1, 1]`.
fn decode_pcm(bytes: &[u8], bits_per_sample: u16, out: &mut Vec<f32>) -> usize {
    let scale = full_scale(bits_per_sample);
    let mut clamped = 0;
    let mut push = |value: i32| {
        let sample = f64::from(value) / scale;
        if !(-1.0..=1.0).contains(&sample) {
            clamped += 1;
        }
        out.push(sample.clamp(-1.0, 1.0) as f32);
    };

    match bits_per_sample {
        // 8-bit WAV is unsigned; 128 is silence.
        8 => bytes.iter().for_each(|&b| push(i32::from(b) - 128)),
        16 => bytes
            .chunks_exact(2)
            .for_each(|b| push(i32::from(i16::from_le_bytes([b[0], b[1]])))),
        _ => bytes
            .chunks_exact(4)
            .for_each(|b| push(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))),
    }
    clamped
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> (usize, Option<io::Error>) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return (filled, Some(err)),
        }
    }
    (filled, None)
}
