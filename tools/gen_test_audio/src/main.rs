use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 44100;

fn main() {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let output_path = "test_sibilance.wav";
    let mut writer = WavWriter::create(output_path, spec).expect("Failed to create WAV file");

    // Voiced syllables with an "s"-like burst between them
    // (pitch Hz, start s, length s)
    let vowels = [
        (140.0, 0.0, 0.45),
        (155.0, 0.7, 0.45),
        (130.0, 1.4, 0.5),
        (165.0, 2.2, 0.4),
        (145.0, 2.9, 0.6),
    ];
    // (centre Hz, start s, length s): sibilance moving across the tracker range
    let esses = [
        (5500.0, 0.45, 0.22),
        (7000.0, 1.15, 0.22),
        (8500.0, 1.9, 0.28),
        (6500.0, 2.6, 0.25),
        (9500.0, 3.5, 0.3),
    ];

    let duration_secs = 4.0;
    let total_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    let mut output = vec![0.0f32; total_samples];

    for (pitch, start, length) in vowels {
        mix_into(&mut output, start, &vowel(pitch, length), 0.5);
    }
    for (centre, start, length) in esses {
        mix_into(&mut output, start, &sibilant(centre, length), 0.6);
    }

    // Normalize
    let max_val = output.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
    if max_val > 0.0 {
        for sample in &mut output {
            *sample = *sample / max_val * 0.9;
        }
    }

    for sample in output {
        let amplitude = (sample * i16::MAX as f32) as i16;
        writer.write_sample(amplitude).expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
    println!("Generated: {}", output_path);
    println!("Duration: {}s, Sample rate: {}Hz, Mono", duration_secs, SAMPLE_RATE);
}

fn mix_into(output: &mut [f32], start_secs: f32, samples: &[f32], level: f32) {
    let start = (start_secs * SAMPLE_RATE as f32) as usize;
    for (i, &sample) in samples.iter().enumerate() {
        if let Some(out) = output.get_mut(start + i) {
            *out += sample * level;
        }
    }
}

/// Harmonic stack with a falling spectral tilt and a raised-cosine envelope
fn vowel(pitch: f32, length_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * length_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let voiced: f32 = (1..=12)
                .map(|h| (2.0 * PI * pitch * h as f32 * t).sin() / h as f32)
                .sum();
            voiced * envelope(i, num_samples)
        })
        .collect()
}

/// Noise through a resonant band-pass centred on `centre`
fn sibilant(centre: f32, length_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * length_secs) as usize;

    // Chamberlin state-variable filter
    let f = 2.0 * (PI * centre / SAMPLE_RATE as f32).sin();
    let damping = 0.5;
    let (mut low, mut band) = (0.0f32, 0.0f32);

    (0..num_samples)
        .map(|i| {
            let noise = (simple_hash(i as u32 ^ centre as u32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let high = noise - low - damping * band;
            band += f * high;
            low += f * band;
            band * envelope(i, num_samples)
        })
        .collect()
}

/// 10 ms fade in and out
fn envelope(i: usize, len: usize) -> f32 {
    let fade = (0.01 * SAMPLE_RATE as f32) as usize;
    let edge = i.min(len.saturating_sub(i + 1));
    if edge >= fade {
        1.0
    } else {
        0.5 - 0.5 * (PI * edge as f32 / fade as f32).cos()
    }
}

/// Simple deterministic hash for reproducible "random" noise
fn simple_hash(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x45d9f3b);
    x ^= x >> 16;
    x = x.wrapping_mul(0x45d9f3b);
    x ^= x >> 16;
    x
}
