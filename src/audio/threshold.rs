use serde::Serialize;

use super::bands::PeakCandidate;

/// Peak that survived the adaptive threshold. Serialises as
/// `[frame, bin, amplitude]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "[u64; 3]")]
pub struct FilteredPeak {
    pub frame: usize,
    pub bin: usize,
    pub amplitude: u64,
}

impl From<FilteredPeak> for [u64; 3] {
    fn from(peak: FilteredPeak) -> Self {
        [peak.frame as u64, peak.bin as u64, peak.amplitude]
    }
}

/// Mean candidate magnitude over one block of consecutive frames.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockStat {
    pub first_frame: usize,
    pub frame_count: usize,
    pub mean_magnitude: f64,
}

/// Full blocks are normalised by `window * num_bands`; the tail block by the
/// number of candidates it actually holds. An empty tail has no statistic.
pub fn block_stats(
    candidates: &[Vec<PeakCandidate>],
    window: usize,
    num_bands: usize,
) -> Vec<BlockStat> {
    if window == 0 {
        return Vec::new();
    }
    let full_blocks = candidates.len() / window;
    let mut stats = Vec::with_capacity(full_blocks + 1);

    for (index, block) in candidates.chunks(window).enumerate() {
        let total: f64 = block.iter().flatten().map(|c| c.magnitude).sum();
        let divisor = if index < full_blocks {
            (window * num_bands) as f64
        } else {
            block.iter().map(Vec::len).sum::<usize>() as f64
        };
        let mean_magnitude = if divisor > 0.0 {
            total / divisor
        } else {
            f64::INFINITY
        };
        stats.push(BlockStat {
            first_frame: index * window,
            frame_count: block.len(),
            mean_magnitude,
        });
    }

    stats
}

/// Keep candidates at or above both their block mean and `floor`, in
/// (frame, band) order.
pub fn filter_peaks(
    candidates: &[Vec<PeakCandidate>],
    window: usize,
    floor: f64,
) -> Vec<FilteredPeak> {
    if window == 0 {
        return Vec::new();
    }
    let num_bands = candidates.first().map_or(0, Vec::len);
    let stats = block_stats(candidates, window, num_bands);

    for stat in &stats {
        log::debug!(
            "Block at frame {} ({} frames): mean magnitude {:.3}",
            stat.first_frame,
            stat.frame_count,
            stat.mean_magnitude
        );
    }

    let mut peaks = Vec::new();
    for (frame, frame_candidates) in candidates.iter().enumerate() {
        let mean = stats[frame / window].mean_magnitude;
        for candidate in frame_candidates {
            if candidate.magnitude >= mean && candidate.magnitude >= floor {
                peaks.push(FilteredPeak {
                    frame: candidate.frame,
                    bin: candidate.bin,
                    amplitude: candidate.magnitude as u64,
                });
            }
        }
    }
    peaks
}
