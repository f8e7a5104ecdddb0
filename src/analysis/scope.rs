use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

/// Audio samples folded into one scope frame
pub const SAMPLES_PER_FRAME: usize = 128;

/// Ring buffer capacity in frames (~10 s at 48 kHz)
const RING_BUFFER_SIZE: usize = 4096;

/// One column of the waveform scope
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct ScopeFrame {
    /// Peak input level (0.0-1.0)
    pub wave: f32,
    /// Peak gain reduction (0.0-1.0)
    pub suppress: f32,
    /// Peak exciter activity (0.0-1.0)
    pub excite: f32,
}

impl ScopeFrame {
    fn absorb(&mut self, wave: f32, suppress: f32, excite: f32) {
        self.wave = self.wave.max(wave);
        self.suppress = self.suppress.max(suppress);
        self.excite = self.excite.max(excite);
    }
}

/// Create a connected scope producer/consumer pair
pub fn channel() -> (ScopeProducer, ScopeConsumer) {
    let (producer, consumer) = HeapRb::<ScopeFrame>::new(RING_BUFFER_SIZE).split();
    (
        ScopeProducer {
            producer,
            pending: ScopeFrame::default(),
            counted: 0,
            dropped: 0,
        },
        ScopeConsumer { consumer },
    )
}

/// Audio-thread half. Peak-holds samples into frames and pushes them without blocking.
pub struct ScopeProducer {
    producer: HeapProd<ScopeFrame>,
    pending: ScopeFrame,
    counted: usize,
    dropped: u64,
}

impl ScopeProducer {
    #[inline]
    pub fn push_sample(&mut self, wave: f32, suppress: f32, excite: f32) {
        self.pending.absorb(wave.abs(), suppress, excite);
        self.counted += 1;

        if self.counted == SAMPLES_PER_FRAME {
            // Drop frames if the editor is not draining (closed or stalled)
            if self.producer.try_push(self.pending).is_err() {
                self.dropped += 1;
            }
            self.pending = ScopeFrame::default();
            self.counted = 0;
        }
    }

    /// Frames lost to a full queue since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discard the partially accumulated frame
    pub fn clear_pending(&mut self) {
        self.pending = ScopeFrame::default();
        self.counted = 0;
    }
}

/// Editor half
pub struct ScopeConsumer {
    consumer: HeapCons<ScopeFrame>,
}

impl ScopeConsumer {
    /// Pop up to `frames.len()` frames, oldest first. Returns the count popped.
    pub fn pop(&mut self, frames: &mut [ScopeFrame]) -> usize {
        self.consumer.pop_slice(frames)
    }

    #[allow(dead_code)]
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Drop everything queued. Returns the number of frames discarded.
    pub fn discard(&mut self) -> usize {
        self.consumer.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_peak_held() {
        let (mut producer, mut consumer) = channel();

        for i in 0..SAMPLES_PER_FRAME {
            let wave = if i == 10 { -0.8 } else { 0.1 };
            let suppress = if i == 20 { 0.6 } else { 0.0 };
            producer.push_sample(wave, suppress, 0.0);
        }

        let mut frames = [ScopeFrame::default(); 4];
        assert_eq!(consumer.pop(&mut frames), 1);
        assert!((frames[0].wave - 0.8).abs() < 1e-6);
        assert!((frames[0].suppress - 0.6).abs() < 1e-6);
        assert_eq!(frames[0].excite, 0.0);
    }

    #[test]
    fn test_partial_frame_is_not_pushed() {
        let (mut producer, consumer) = channel();
        for _ in 0..SAMPLES_PER_FRAME - 1 {
            producer.push_sample(0.5, 0.0, 0.0);
        }
        assert_eq!(consumer.available(), 0);

        producer.clear_pending();
        producer.push_sample(0.5, 0.0, 0.0);
        assert_eq!(consumer.available(), 0);
    }

    #[test]
    fn test_full_queue_drops_frames() {
        let (mut producer, consumer) = channel();
        let frames = RING_BUFFER_SIZE + 3;
        for _ in 0..frames * SAMPLES_PER_FRAME {
            producer.push_sample(0.5, 0.0, 0.0);
        }
        assert_eq!(consumer.available(), RING_BUFFER_SIZE);
        assert_eq!(producer.dropped(), 3);
    }

    #[test]
    fn test_discard_empties_backlog() {
        let (mut producer, mut consumer) = channel();
        for _ in 0..20 * SAMPLES_PER_FRAME {
            producer.push_sample(0.3, 0.0, 0.0);
        }
        assert_eq!(consumer.discard(), 20);
        assert_eq!(consumer.available(), 0);

        // New frames after the discard still arrive
        for _ in 0..SAMPLES_PER_FRAME {
            producer.push_sample(0.9, 0.0, 0.0);
        }
        let mut frames = [ScopeFrame::default(); 4];
        assert_eq!(consumer.pop(&mut frames), 1);
        assert!((frames[0].wave - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_pop_is_chunked() {
        let (mut producer, mut consumer) = channel();
        for _ in 0..10 * SAMPLES_PER_FRAME {
            producer.push_sample(0.2, 0.0, 0.0);
        }

        let mut chunk = [ScopeFrame::default(); 4];
        assert_eq!(consumer.pop(&mut chunk), 4);
        assert_eq!(consumer.pop(&mut chunk), 4);
        assert_eq!(consumer.pop(&mut chunk), 2);
        assert_eq!(consumer.pop(&mut chunk), 0);
    }
}
