use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::features::Waveform;
use crate::error::{Result, SpeakerIdError};

fn invalid(message: String) -> SpeakerIdError {
    SpeakerIdError::InvalidInput(message)
}

/// Decodes an audio file into mono samples at the file's native rate.
///
/// Decoding stops with `InvalidInput` as soon as the audio runs past
/// `max_duration_secs`. The sample rate is not checked here; the framer
/// rejects rates that do not match the analysis configuration.
pub fn decode_audio(path: &Path, max_duration_secs: f64) -> Result<Waveform> {
    if !path.is_file() {
        return Err(invalid(format!("file not found: {}", path.display())));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| invalid(format!("failed to open {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| invalid(format!("unsupported audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| invalid("no audio tracks found".into()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| invalid("unknown sample rate".into()))?;
    let max_samples = (max_duration_secs * sample_rate as f64) as usize;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| invalid(format!("unsupported codec: {}", e)))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(invalid(format!("failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping corrupt packet: {}", msg);
                continue;
            }
            Err(e) => return Err(invalid(format!("failed to decode audio: {}", e))),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        let channels = spec.channels.count().max(1);

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        // Downmix to mono
        if channels == 1 {
            all_samples.extend_from_slice(samples);
        } else {
            for frame_samples in samples.chunks(channels) {
                let mono: f32 = frame_samples.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        }

        if all_samples.len() > max_samples {
            return Err(invalid(format!(
                "{} runs past the {:.1}s limit",
                path.display(),
                max_duration_secs
            )));
        }
    }

    if all_samples.is_empty() {
        return Err(invalid(format!("no samples decoded from {}", path.display())));
    }

    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.2}s",
        all_samples.len(),
        sample_rate,
        all_samples.len() as f32 / sample_rate as f32
    );

    Ok(Waveform::new(all_samples, sample_rate))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes a 16-bit PCM WAV fixture and returns its path.
    pub(crate) fn write_wav(
        dir: &TempDir,
        name: &str,
        channels: u16,
        sample_rate: u32,
        samples: &[f32],
    ) -> PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn decodes_mono_wav() {
        let dir = TempDir::new().unwrap();
        let samples: Vec<f32> = (0..2_000).map(|i| (i as f32 / 50.0).sin() * 0.5).collect();
        let path = write_wav(&dir, "mono.wav", 1, 44_100, &samples);

        let wave = decode_audio(&path, 600.0).unwrap();
        assert_eq!(wave.sample_rate, 44_100);
        assert_eq!(wave.samples.len(), samples.len());
        for (a, b) in samples.iter().zip(&wave.samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn downmixes_stereo() {
        let dir = TempDir::new().unwrap();
        let interleaved: Vec<f32> = (0..1_000).flat_map(|_| [0.5, -0.25]).collect();
        let path = write_wav(&dir, "stereo.wav", 2, 48_000, &interleaved);

        let wave = decode_audio(&path, 600.0).unwrap();
        assert_eq!(wave.sample_rate, 48_000);
        assert_eq!(wave.samples.len(), 1_000);
        assert!(wave.samples.iter().all(|s| (s - 0.125).abs() < 1e-3));
    }

    #[test]
    fn stops_decoding_past_the_duration_limit() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "long.wav", 1, 8_000, &vec![0.1; 24_000]);

        let err = decode_audio(&path, 0.5).unwrap_err();
        assert!(matches!(err, SpeakerIdError::InvalidInput(ref m) if m.contains("0.5s limit")));
        assert!(decode_audio(&path, 3.0).is_ok());
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = decode_audio(Path::new("/nonexistent/voice.wav"), 600.0).unwrap_err();
        assert!(matches!(err, SpeakerIdError::InvalidInput(ref m) if m.contains("not found")));
    }

    #[test]
    fn garbage_file_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        assert!(matches!(
            decode_audio(&path, 600.0),
            Err(SpeakerIdError::InvalidInput(_))
        ));
    }
}
