//! Fixed-size sample windowing
//!
//! Audio arrives in arbitrary-sized chunks; the classifier wants exactly one
//! second at a time. Leftover samples carry over to the next window.

use crate::WINDOW_SAMPLES;

#[derive(Debug, Clone)]
pub struct SampleWindow {
    buffer: Vec<f32>,
    window_len: usize,
}

impl SampleWindow {
    /// A zero length is bumped to one
    pub fn new(window_len: usize) -> Self {
        let window_len = window_len.max(1);
        Self {
            buffer: Vec::with_capacity(window_len * 2),
            window_len,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Samples waiting for the next full window
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append samples and drain every complete window
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.buffer.extend_from_slice(samples);

        let full = self.buffer.len() / self.window_len;
        if full == 0 {
            return Vec::new();
        }

        let consumed = full * self.window_len;
        let windows = self.buffer[..consumed]
            .chunks_exact(self.window_len)
            .map(<[f32]>::to_vec)
            .collect();
        self.buffer.drain(..consumed);
        windows
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(WINDOW_SAMPLES)
    }
}
