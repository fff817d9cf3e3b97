/// Decoded PCM, one buffer per channel.
#[derive(Clone, Debug, Default)]
pub struct AudioSignal {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl AudioSignal {
    #[cfg(test)]
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Split frame-major interleaved samples into per-channel buffers.
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &s) in channels.iter_mut().zip(frame) {
                channel.push(s);
            }
        }
        Self {
            channels,
            sample_rate,
        }
    }

    /// The channel the analysis runs on. Later channels are ignored, not mixed.
    pub fn first_channel(&self) -> &[f32] {
        self.channels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.first_channel().len() as f32 / self.sample_rate as f32
    }
}
