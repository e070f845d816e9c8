//! WAV file reading and writing.

use core::time::Duration;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use sonance_core::Engine;

use crate::pcm::PcmFormat;
use crate::{Error, Result};

/// WAV file format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample: 32 writes float, 8, 16 or 24 integer PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Full-scale integer value for a bit depth hound can store.
fn int_scale(bits_per_sample: u16) -> Result<f64> {
    if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(Error::UnsupportedBitDepth(bits_per_sample));
    }
    Ok(f64::from((1u32 << (bits_per_sample - 1)) - 1))
}

/// Read a WAV file as interleaved `f64` samples in `[-1, 1]` along with the
/// spec.
///
/// Feed the result to [`Freeze::from_samples`](sonance_core::Freeze::from_samples)
/// to play a file back through a graph.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());

    let samples = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = int_scale(spec.bits_per_sample)?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok((samples, spec))
}

/// Write interleaved samples to a WAV file, clamping to `[-1, 1]`.
///
/// # Example
/// ```ignore
/// let samples = vec![0.0; 44100]; // 1 second of silence
/// write_wav("output.wav", &samples, WavSpec::default())?;
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f64], spec: WavSpec) -> Result<()> {
    let max_val = int_scale(spec.bits_per_sample)?;
    let hound_spec = hound::WavSpec::from(spec);
    let mut writer = WavWriter::create(path, hound_spec)?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample.clamp(-1.0, 1.0) as f32)?;
        }
    } else {
        for &sample in samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * max_val) as i32)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Render `duration` of an engine's root to a WAV file. Returns the number of
/// frames written.
///
/// The root must be mono or stereo.
pub fn render_wav<P: AsRef<Path>>(
    engine: &mut Engine,
    path: P,
    duration: Duration,
    format: PcmFormat,
) -> Result<usize> {
    let channels = engine.channels();
    if !(1..=2).contains(&channels) {
        return Err(Error::UnsupportedChannels(channels));
    }
    let frames = engine.graph().config().frames(duration);
    let samples = engine.render(frames)?;
    let spec = WavSpec {
        channels: channels as u16,
        sample_rate: engine.graph().sample_rate().round() as u32,
        bits_per_sample: format.bits_per_sample(),
    };
    write_wav(path.as_ref(), &samples, spec)?;
    tracing::info!(
        path = %path.as_ref().display(),
        frames,
        channels,
        "rendered WAV"
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_roundtrip_f32() {
        let samples: Vec<f64> = (0..1000u16).map(|i| (f64::from(i) / 1000.0).sin()).collect();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded.len(), samples.len());
        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 1e-6, "expected {a}, got {b}");
        }
    }

    #[test]
    fn test_roundtrip_i16() {
        let samples: Vec<f64> = (0..1000u16)
            .map(|i| (f64::from(i) / 1000.0).sin() * 0.9)
            .collect();
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec.channels, 2);
        assert_eq!(loaded.len(), samples.len());
        // 16-bit has less precision
        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 0.001, "expected {a}, got {b}");
        }
    }

    #[test]
    fn test_write_clamps_out_of_range() {
        let spec = WavSpec::default();
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &[2.0, -2.0], spec).unwrap();
        let (loaded, _) = read_wav(file.path()).unwrap();
        assert_eq!(loaded, vec![1.0, -1.0]);
    }

    #[test]
    fn test_unsupported_bit_depth_rejected() {
        let file = NamedTempFile::new().unwrap();
        for bits in [0u16, 12, 40] {
            let spec = WavSpec {
                bits_per_sample: bits,
                ..WavSpec::default()
            };
            let result = write_wav(file.path(), &[0.5], spec);
            assert!(
                matches!(result, Err(Error::UnsupportedBitDepth(b)) if b == bits),
                "expected UnsupportedBitDepth({bits}), got {result:?}"
            );
        }
    }

    #[test]
    fn test_roundtrip_i24() {
        let spec = WavSpec {
            bits_per_sample: 24,
            ..WavSpec::default()
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &[0.25, -0.5], spec).unwrap();
        let (loaded, _) = read_wav(file.path()).unwrap();
        assert!((loaded[0] - 0.25).abs() < 1e-6, "expected 0.25, got {}", loaded[0]);
        assert!((loaded[1] + 0.5).abs() < 1e-6, "expected -0.5, got {}", loaded[1]);
    }
}
