use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::window::{apply_window, hann_window};

/// Orthonormal spectrum of one windowed frame.
#[derive(Clone, Debug)]
pub struct Spectrum {
    pub bins: Vec<Complex<f64>>,
}

impl Spectrum {
    pub fn magnitude(&self, bin: usize) -> f64 {
        self.bins[bin].norm()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }
}

/// Splits a signal into non-overlapping chunks and transforms each one.
/// The FFT plan is built once and shared across rayon workers.
pub struct FrameTransformer {
    chunk_size: usize,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    scale: f64,
}

impl FrameTransformer {
    pub fn new(chunk_size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(chunk_size);
        Self {
            chunk_size,
            fft,
            window: hann_window(chunk_size),
            scale: 1.0 / (chunk_size as f64).sqrt(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of whole chunks in `len` samples; the remainder is dropped.
    pub fn frame_count(&self, len: usize) -> usize {
        if self.chunk_size == 0 {
            return 0;
        }
        len / self.chunk_size
    }

    pub fn spectrum(&self, frame: &[f32]) -> Spectrum {
        let mut buffer: Vec<Complex<f64>> = frame
            .iter()
            .map(|&s| Complex::new(s as f64, 0.0))
            .collect();
        apply_window(&mut buffer, &self.window);
        self.fft.process(&mut buffer);
        for c in buffer.iter_mut() {
            *c *= self.scale;
        }
        Spectrum { bins: buffer }
    }

    /// Spectra for every whole chunk, in frame order.
    pub fn spectra(&self, samples: &[f32]) -> Vec<Spectrum> {
        if self.frame_count(samples.len()) == 0 {
            return Vec::new();
        }
        samples
            .par_chunks_exact(self.chunk_size)
            .map(|frame| self.spectrum(frame))
            .collect()
    }
}
