/// Peak envelope follower with separate attack and release times
pub struct EnvelopeFollower {
    attack_ms: f32,
    release_ms: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    envelope: f32,
}

impl EnvelopeFollower {
    pub fn new(sample_rate: f32) -> Self {
        let mut follower = Self {
            attack_ms: 2.0,
            release_ms: 80.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            envelope: 0.0,
        };
        follower.update_coefficients();
        follower
    }

    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32) {
        if (self.attack_ms - attack_ms).abs() > 1e-3 || (self.release_ms - release_ms).abs() > 1e-3
        {
            self.attack_ms = attack_ms;
            self.release_ms = release_ms;
            self.update_coefficients();
        }
    }

    pub fn set_sample_rate(&mut self, rate: f32) {
        if (rate - self.sample_rate).abs() > 0.1 {
            self.sample_rate = rate;
            self.update_coefficients();
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    #[allow(dead_code)]
    pub fn value(&self) -> f32 {
        self.envelope
    }

    #[inline]
    pub fn process(&mut self, level: f32) -> f32 {
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = level + coeff * (self.envelope - level);
        self.envelope
    }

    fn update_coefficients(&mut self) {
        self.attack_coeff = time_to_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_to_coeff(self.release_ms, self.sample_rate);
    }
}

/// One-pole coefficient for a time constant in milliseconds
fn time_to_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms.max(0.01) * 0.001 * sample_rate;
    (-1.0 / samples).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_reaches_level() {
        let mut env = EnvelopeFollower::new(48000.0);
        env.set_times(1.0, 100.0);

        // 10 time constants
        for _ in 0..480 {
            env.process(1.0);
        }
        assert!(env.value() > 0.99);
    }

    #[test]
    fn test_release_is_slower_than_attack() {
        let mut env = EnvelopeFollower::new(48000.0);
        env.set_times(1.0, 100.0);
        for _ in 0..4800 {
            env.process(1.0);
        }

        // One attack time constant of silence barely moves the envelope
        for _ in 0..48 {
            env.process(0.0);
        }
        assert!(env.value() > 0.95);

        // One release time constant brings it to ~1/e
        for _ in 0..(4800 - 48) {
            env.process(0.0);
        }
        assert!((env.value() - (-1.0f32).exp()).abs() < 0.02);
    }
}
