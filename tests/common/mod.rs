//! Shared fixtures for integration tests: deterministic signals written as
//! 16-bit WAV files with hound.

#![allow(dead_code)]

use rustfft::{num_complex::Complex, FftPlanner};
use std::path::{Path, PathBuf};

pub const SAMPLE_RATE: u32 = 44100;

/// Uniform white noise in [-0.5, 0.5) from a xorshift generator.
pub fn white_noise(len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

/// White noise with every component above `cutoff_hz` removed.
pub fn lowpassed_noise(len: usize, cutoff_hz: f64, seed: u64) -> Vec<f64> {
    let mut buffer: Vec<Complex<f64>> = white_noise(len, seed)
        .into_iter()
        .map(|s| Complex::new(s, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(len).process(&mut buffer);

    let cutoff_bin = (cutoff_hz * len as f64 / SAMPLE_RATE as f64) as usize;
    for (k, c) in buffer.iter_mut().enumerate() {
        if k.min(len - k) > cutoff_bin {
            *c = Complex::new(0.0, 0.0);
        }
    }

    planner.plan_fft_inverse(len).process(&mut buffer);
    buffer.iter().map(|c| c.re / len as f64).collect()
}

/// Write interleaved samples in [-1, 1] as a 16-bit PCM WAV.
pub fn write_wav(path: &Path, channels: u16, interleaved: &[f64]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in interleaved {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

pub fn mono_wav(dir: &Path, name: &str, samples: &[f64]) -> PathBuf {
    let path = dir.join(name);
    write_wav(&path, 1, samples);
    path
}

/// Interleave two equal-length channels.
pub fn interleave(left: &[f64], right: &[f64]) -> Vec<f64> {
    left.iter().zip(right).flat_map(|(&l, &r)| [l, r]).collect()
}
