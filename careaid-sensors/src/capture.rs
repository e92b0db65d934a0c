//! Sample capture boundary
//!
//! Real microphone capture lives outside this workspace. A capture is
//! started when its source loads and stopped on shutdown.

/// Something that yields raw mono samples on demand
pub trait SampleCapture: Send + Sync {
    fn start(&mut self) {}

    /// Samples captured since the previous read
    fn read(&mut self) -> Vec<f32>;

    fn stop(&mut self) {}

    fn is_active(&self) -> bool;
}

/// Capture that produces silence, one read per window.
/// Pairs with classifiers that ignore the audio, such as replay.
#[derive(Debug, Clone)]
pub struct SilentCapture {
    samples_per_read: usize,
    active: bool,
}

impl SilentCapture {
    pub fn new(samples_per_read: usize) -> Self {
        Self {
            samples_per_read,
            active: false,
        }
    }
}

impl SampleCapture for SilentCapture {
    fn start(&mut self) {
        self.active = true;
    }

    fn read(&mut self) -> Vec<f32> {
        if self.active {
            vec![0.0; self.samples_per_read]
        } else {
            Vec::new()
        }
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
