use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::signal::AudioSignal;

/// Decode an audio file into per-channel PCM. Channels are kept separate.
pub fn decode_audio(path: &Path) -> Result<AudioSignal> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let declared_channels = track.codec_params.channels.map(|c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut decoded_channels: Option<usize> = None;
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::debug!("Skipping undecodable packet: {}", err);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        decoded_channels.get_or_insert(spec.channels.count());
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    let channels = resolve_channels(decoded_channels, declared_channels);
    let signal = AudioSignal::from_interleaved(&interleaved, channels, sample_rate);

    log::info!(
        "Decoded audio: {} samples x {} channel(s), {}Hz, {:.1}s",
        signal.first_channel().len(),
        signal.channel_count(),
        sample_rate,
        signal.duration()
    );

    Ok(signal)
}

/// Channel count of the decoded buffers wins over the container's declared
/// layout, which may be missing.
fn resolve_channels(decoded: Option<usize>, declared: Option<usize>) -> usize {
    decoded.or(declared).unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo_wav(path: &Path, frames: &[(i16, i16)], sample_rate: u32) {
        let data_len = (frames.len() * 4) as u32;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 4).to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for (left, right) in frames {
            bytes.extend_from_slice(&left.to_le_bytes());
            bytes.extend_from_slice(&right.to_le_bytes());
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn decoded_layout_wins_over_declared() {
        assert_eq!(resolve_channels(Some(2), None), 2);
        assert_eq!(resolve_channels(Some(2), Some(1)), 2);
        assert_eq!(resolve_channels(None, Some(6)), 6);
        assert_eq!(resolve_channels(None, None), 1);
    }

    #[test]
    fn stereo_wav_keeps_channels_apart() {
        let path = std::env::temp_dir()
            .join(format!("peakscan-decode-{}.wav", std::process::id()));
        let frames: Vec<(i16, i16)> = (0..2048).map(|_| (0, 16_384)).collect();
        write_stereo_wav(&path, &frames, 44_100);

        let result = decode_audio(&path);
        std::fs::remove_file(&path).unwrap();
        let signal = result.unwrap();

        assert_eq!(signal.channel_count(), 2);
        assert_eq!(signal.sample_rate, 44_100);
        assert_eq!(signal.first_channel().len(), 2048);
        assert!(signal.first_channel().iter().all(|&s| s == 0.0));
        assert!(signal.channels[1].iter().all(|&s| (s - 0.5).abs() < 1e-3));
    }
}
