use serde::Serialize;

use super::bands::{extract_peaks, Mode};
use super::signal::AudioSignal;
use super::threshold::{filter_peaks, FilteredPeak};
use super::transform::FrameTransformer;
use crate::config::AnalysisConfig;

/// Per-file result written by the CLI.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub source: String,
    pub mode: Mode,
    pub sample_rate: u32,
    pub frames: usize,
    pub peaks: Vec<FilteredPeak>,
}

/// Dominant per-band peaks of the first channel, filtered against block-local
/// means and the absolute floor. Ordered by frame, then band.
pub fn analyse(signal: &AudioSignal, mode: Mode, config: &AnalysisConfig) -> Vec<FilteredPeak> {
    let samples = signal.first_channel();
    let table = config.band_table(mode);

    let transformer = FrameTransformer::new(config.chunk_size);
    log::info!(
        "Transforming {} frames of {} samples...",
        transformer.frame_count(samples.len()),
        transformer.chunk_size()
    );
    let spectra = transformer.spectra(samples);

    log::info!("Extracting {:?} band peaks ({} bands)...", mode, table.len());
    let candidates = extract_peaks(&spectra, table);

    let peaks = filter_peaks(&candidates, config.filter_window_size, config.abs_min_amp);
    log::info!(
        "Kept {} of {} candidates",
        peaks.len(),
        candidates.len() * table.len()
    );
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::bands::band_of;

    const RATE: u32 = 44_100;

    fn tone(bin: f64, amplitude: f32, frames: usize) -> Vec<f32> {
        (0..frames * 1024)
            .map(|n| {
                amplitude * (2.0 * std::f64::consts::PI * bin * n as f64 / 1024.0).sin() as f32
            })
            .collect()
    }

    #[test]
    fn silence_yields_nothing() {
        let signal = AudioSignal::mono(vec![0.0; 1024 * 50], RATE);
        assert!(analyse(&signal, Mode::Audible, &AnalysisConfig::default()).is_empty());
        assert!(analyse(&signal, Mode::Ultrasound, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn shorter_than_one_chunk_yields_nothing() {
        let signal = AudioSignal::mono(tone(100.0, 4.0, 1)[..1000].to_vec(), RATE);
        assert!(analyse(&signal, Mode::Audible, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn single_tone_found_in_every_frame() {
        let config = AnalysisConfig::default();
        let signal = AudioSignal::mono(tone(100.0, 4.0, 12), RATE);
        let peaks = analyse(&signal, Mode::Audible, &config);

        assert_eq!(peaks.len(), 12);
        for (frame, peak) in peaks.iter().enumerate() {
            assert_eq!(peak.frame, frame);
            assert!((99..=101).contains(&peak.bin));
            assert_eq!(band_of(peak.bin, &config.audible_range), Some(5));
            assert!(peak.amplitude >= 8);
        }
    }

    #[test]
    fn only_first_channel_is_analysed() {
        let mut interleaved = Vec::new();
        for s in tone(100.0, 20.0, 45) {
            interleaved.push(0.0);
            interleaved.push(s);
        }
        let signal = AudioSignal::from_interleaved(&interleaved, 2, RATE);
        assert!(analyse(&signal, Mode::Audible, &AnalysisConfig::default()).is_empty());

        let swapped = AudioSignal {
            channels: vec![signal.channels[1].clone(), signal.channels[0].clone()],
            sample_rate: RATE,
        };
        assert!(!analyse(&swapped, Mode::Audible, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn ultrasound_mode_uses_its_own_bands() {
        let config = AnalysisConfig::default();
        let signal = AudioSignal::mono(tone(466.0, 4.0, 3), RATE);

        // the Hann main lobe spills half the energy into 465, which sits in
        // the neighbouring band
        let peaks = analyse(&signal, Mode::Ultrasound, &config);
        let bins: Vec<(usize, usize)> = peaks.iter().map(|p| (p.frame, p.bin)).collect();
        assert_eq!(bins, vec![(0, 465), (0, 466), (1, 465), (1, 466), (2, 465), (2, 466)]);
        assert_eq!(band_of(465, &config.ultrasound_range), Some(1));
        assert_eq!(band_of(466, &config.ultrasound_range), Some(2));

        // 466 falls in the wide top band of the audible table
        let audible = analyse(&signal, Mode::Audible, &config);
        assert_eq!(audible.len(), 3);
        assert!(audible.iter().all(|p| p.bin == 466));
        assert_eq!(analyse(&signal, Mode::from_name("sonar"), &config), audible);
    }

    #[test]
    fn respects_threshold_and_frame_count() {
        let config = AnalysisConfig::default();
        // two tones with uneven energy plus a tail block of 5 frames
        let a = tone(30.0, 6.0, 45);
        let b = tone(200.0, 2.5, 45);
        let samples: Vec<f32> = a.iter().zip(&b).map(|(x, y)| x + y).collect();
        let len = samples.len();
        let signal = AudioSignal::mono(samples, RATE);

        let peaks = analyse(&signal, Mode::Audible, &config);
        assert!(!peaks.is_empty());
        assert!(peaks.iter().all(|p| p.frame < len / 1024));
        assert!(peaks.iter().all(|p| p.amplitude >= 8));
        for peak in &peaks {
            assert!(band_of(peak.bin, &config.audible_range).is_some());
        }
        assert!(peaks.windows(2).all(|w| w[0].frame < w[1].frame
            || (w[0].frame == w[1].frame && w[0].bin < w[1].bin)));
    }

    #[test]
    fn deterministic() {
        let config = AnalysisConfig::default();
        let signal = AudioSignal::mono(tone(57.0, 3.0, 41), RATE);
        let first = analyse(&signal, Mode::Audible, &config);
        let second = analyse(&signal, Mode::Audible, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn custom_chunk_and_bands() {
        let config = AnalysisConfig {
            chunk_size: 256,
            audible_range: vec![5, 20, 128],
            filter_window_size: 4,
            ..Default::default()
        };
        // bin 12 of a 256-point frame
        let samples: Vec<f32> = (0..256 * 6)
            .map(|n| 8.0 * (2.0 * std::f64::consts::PI * 12.0 * n as f64 / 256.0).sin() as f32)
            .collect();
        let peaks = analyse(&AudioSignal::mono(samples, RATE), Mode::Audible, &config);
        assert_eq!(peaks.len(), 6);
        assert!(peaks.iter().all(|p| p.bin == 12));
    }
}
