use rayon::prelude::*;
use serde::Serialize;

use super::transform::Spectrum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Audible,
    Ultrasound,
}

impl Mode {
    /// `"ultrasound"` selects the ultrasound table; anything else is audible.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ultrasound" => Mode::Ultrasound,
            _ => Mode::Audible,
        }
    }
}

/// Strongest bin of one band in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PeakCandidate {
    pub frame: usize,
    pub bin: usize,
    pub magnitude: f64,
}

/// Band containing `bin`: band 0 is exactly `table[0]`, band k covers
/// `(table[k-1], table[k]]`, and anything past the last boundary falls into
/// the last band. Bins below `table[0]` belong to no band.
pub fn band_of(bin: usize, table: &[usize]) -> Option<usize> {
    let first = *table.first()?;
    if bin < first {
        return None;
    }
    Some(
        table
            .iter()
            .position(|&boundary| bin <= boundary)
            .unwrap_or(table.len() - 1),
    )
}

/// Single-pass scan over one frame. The band index only ever advances.
struct BandScan<'a> {
    table: &'a [usize],
    band: usize,
    best: Vec<PeakCandidate>,
}

impl<'a> BandScan<'a> {
    fn new(frame: usize, table: &'a [usize]) -> Self {
        Self {
            table,
            band: 0,
            best: vec![
                PeakCandidate {
                    frame,
                    ..Default::default()
                };
                table.len()
            ],
        }
    }

    fn feed(&mut self, bin: usize, magnitude: f64) {
        if bin > self.table[self.band] && self.band + 1 < self.table.len() {
            self.band += 1;
        }
        let best = &mut self.best[self.band];
        // strict: equal magnitudes keep the earlier bin
        if magnitude > best.magnitude {
            best.bin = bin;
            best.magnitude = magnitude;
        }
    }

    fn finish(self) -> Vec<PeakCandidate> {
        self.best
    }
}

/// One candidate per band, in band order. Bin 0 and bins at or above
/// Nyquist are never examined.
pub fn scan_frame(frame: usize, spectrum: &Spectrum, table: &[usize]) -> Vec<PeakCandidate> {
    let Some(&first) = table.first() else {
        return Vec::new();
    };
    let mut scan = BandScan::new(frame, table);
    for bin in first.max(1)..spectrum.len() / 2 {
        scan.feed(bin, spectrum.magnitude(bin));
    }
    scan.finish()
}

pub fn extract_peaks(spectra: &[Spectrum], table: &[usize]) -> Vec<Vec<PeakCandidate>> {
    spectra
        .par_iter()
        .enumerate()
        .map(|(frame, spectrum)| scan_frame(frame, spectrum, table))
        .collect()
}
