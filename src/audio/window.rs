use rustfft::num_complex::Complex;

/// Symmetric Hann coefficients, `0.5 * (1 - cos(2*pi*i / (size - 1)))`.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        })
        .collect()
}

pub fn apply_window(frame: &mut [Complex<f64>], window: &[f64]) {
    for (sample, &w) in frame.iter_mut().zip(window) {
        *sample *= w;
    }
}
