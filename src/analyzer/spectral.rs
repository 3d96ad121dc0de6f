//! Spectral profiling of decoded audio
//!
//! Turns one channel of samples into a magnitude spectrogram and reduces it to
//! a single number: the highest frequency that carries *sustained* energy.
//!
//! # How the Rolloff Estimate Works
//!
//! Lossy encoders throw away everything above a lowpass frequency. Decoding
//! the result back to WAV or FLAC doesn't bring that content back, so the
//! upper edge of the energy stays where the encoder put it:
//!
//! ```text
//! Source            | Energy reaches up to
//! ------------------|---------------------
//! 64 kbps MP3       | ~10-11 kHz
//! 128 kbps MP3      | ~15-16 kHz
//! 320 kbps MP3      | ~18-20 kHz
//! Real 44.1k audio  | ~22 kHz (Nyquist)
//! ```
//!
//! The estimate is self-normalizing. Magnitudes go to log scale and every
//! cell is compared against the mean log magnitude of the *whole* recording,
//! so loud and quiet files are treated alike:
//!
//! 1. Slide a tapered window over the signal and FFT each segment.
//! 2. Clamp zeros up to the smallest positive magnitude so `log10` stays finite.
//! 3. `avg = mean(log10(mag))` over all bins and frames.
//! 4. A bin qualifies when it is above `avg` in more than `frames / 8` frames.
//! 5. The rolloff is the center frequency of the highest qualifying bin.
//!
//! Transients and silent passages don't move the estimate much: a bin only
//! needs to be active for one eighth of the recording.

use crate::error::AnalysisError;
use log::{debug, warn};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// Window length (seconds) used by the command line tool unless told otherwise.
pub const DEFAULT_WINDOW_SECS: f64 = 0.05;

/// Segment size used when the caller asks for the library default window.
pub const DEFAULT_WINDOW_SAMPLES: usize = 256;

/// Fraction of a segment shared with the next one.
pub const DEFAULT_OVERLAP: f64 = 0.5;

/// A bin must be above average in more than `frames / SUSTAIN_DIVISOR` frames.
pub const DEFAULT_SUSTAIN_DIVISOR: f64 = 8.0;

/// Length of each analysis segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowLength {
    /// `round(seconds * sample_rate)` samples.
    Seconds(f64),
    /// [`DEFAULT_WINDOW_SAMPLES`] samples regardless of sample rate.
    Default,
}

impl Default for WindowLength {
    fn default() -> Self {
        WindowLength::Seconds(DEFAULT_WINDOW_SECS)
    }
}

impl WindowLength {
    /// Segment size in samples at the given sample rate (never zero).
    pub fn samples(&self, sample_rate: u32) -> Result<usize, AnalysisError> {
        match *self {
            WindowLength::Default => Ok(DEFAULT_WINDOW_SAMPLES),
            WindowLength::Seconds(secs) => {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(AnalysisError::InvalidWindow(format!(
                        "window length must be a positive number of seconds, got {}",
                        secs
                    )));
                }
                let samples = (secs * sample_rate as f64).round() as usize;
                Ok(samples.max(1))
            }
        }
    }
}

/// Smoothing taper applied to every segment before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Taper {
    Hann,
    /// Flat top with cosine edges; `alpha` is the tapered fraction (0 = rectangular, 1 = Hann).
    Tukey { alpha: f64 },
}

impl Default for Taper {
    fn default() -> Self {
        Taper::Hann
    }
}

impl Taper {
    /// Periodic (DFT-even) coefficients for a segment of `size` samples.
    pub fn coefficients(&self, size: usize) -> Vec<f64> {
        match *self {
            Taper::Hann => hanning_window(size),
            Taper::Tukey { alpha } => tukey_window(size, alpha),
        }
    }
}

/// Periodic Hann window. A single-sample window is just `[1.0]`.
fn hanning_window(size: usize) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / size as f64).cos()))
        .collect()
}

/// Periodic Tukey window: the symmetric window of `size + 1` points minus the last one.
fn tukey_window(size: usize, alpha: f64) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }
    if alpha <= 0.0 {
        return vec![1.0; size];
    }
    if alpha >= 1.0 {
        return hanning_window(size);
    }

    let span = size as f64; // (size + 1) - 1
    (0..size)
        .map(|i| {
            let x = i as f64 / span;
            if x < alpha / 2.0 {
                0.5 * (1.0 + (std::f64::consts::PI * (2.0 * x / alpha - 1.0)).cos())
            } else if x <= 1.0 - alpha / 2.0 {
                1.0
            } else {
                0.5 * (1.0 + (std::f64::consts::PI * (2.0 * x / alpha - 2.0 / alpha + 1.0)).cos())
            }
        })
        .collect()
}

/// How segments are cut and tapered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramParams {
    pub window: WindowLength,
    pub taper: Taper,
    /// Fraction of each segment shared with the next, in `[0, 1)`.
    pub overlap: f64,
}

impl Default for SpectrogramParams {
    fn default() -> Self {
        Self {
            window: WindowLength::default(),
            taper: Taper::default(),
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Magnitude spectrogram: one row per frequency bin, one column per time frame.
///
/// Every magnitude is finite and non-negative. Bin frequencies are ascending
/// and evenly spaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frequencies: Vec<f64>,
    /// Row-major: `magnitudes[bin * num_frames + frame]`
    magnitudes: Vec<f64>,
    num_frames: usize,
}

impl Spectrogram {
    /// Build a spectrogram from explicit rows.
    ///
    /// Returns `None` when the shape is inconsistent (row count differs from
    /// the frequency count, ragged rows, zero frames) or when any magnitude is
    /// negative or not finite.
    pub fn from_rows(frequencies: Vec<f64>, rows: Vec<Vec<f64>>) -> Option<Self> {
        if frequencies.is_empty() || rows.len() != frequencies.len() {
            return None;
        }
        let num_frames = rows[0].len();
        if num_frames == 0 || rows.iter().any(|r| r.len() != num_frames) {
            return None;
        }
        let magnitudes: Vec<f64> = rows.into_iter().flatten().collect();
        if magnitudes.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return None;
        }
        Some(Self {
            frequencies,
            magnitudes,
            num_frames,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Bin center frequencies in Hz, ascending.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Magnitudes of one bin across all frames.
    pub fn row(&self, bin: usize) -> &[f64] {
        let start = bin * self.num_frames;
        &self.magnitudes[start..start + self.num_frames]
    }

    pub fn magnitude(&self, bin: usize, frame: usize) -> f64 {
        self.magnitudes[bin * self.num_frames + frame]
    }

    /// Spacing between adjacent bins in Hz (0 for a single-bin spectrogram).
    pub fn bin_width(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Raise every magnitude below the smallest positive magnitude up to it.
    ///
    /// Returns the floor that was applied. Fails with
    /// [`AnalysisError::NoPositiveEnergy`] when every value is zero.
    pub fn clamp_to_smallest_positive(&mut self) -> Result<f64, AnalysisError> {
        let floor = self
            .magnitudes
            .iter()
            .copied()
            .filter(|&m| m > 0.0)
            .fold(f64::INFINITY, f64::min);

        if !floor.is_finite() {
            return Err(AnalysisError::NoPositiveEnergy);
        }

        for m in &mut self.magnitudes {
            if *m < floor {
                *m = floor;
            }
        }
        Ok(floor)
    }
}

/// Compute a one-sided magnitude spectrogram with "spectrum" scaling.
///
/// Each segment has its mean removed, is tapered, and transformed. The
/// magnitude of bin `k` is `|X_k| / sum(window)`, so a sinusoid of amplitude
/// `A` sitting on a bin shows up as roughly `A / 2`.
pub fn compute_spectrogram(
    samples: &[f64],
    sample_rate: u32,
    params: &SpectrogramParams,
) -> Result<Spectrogram, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }
    if sample_rate == 0 {
        return Err(AnalysisError::ZeroSampleRate);
    }
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(AnalysisError::NonFiniteSamples);
    }
    if !(0.0..1.0).contains(&params.overlap) {
        return Err(AnalysisError::InvalidWindow(format!(
            "overlap must be in [0, 1), got {}",
            params.overlap
        )));
    }
    if let Taper::Tukey { alpha } = params.taper {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AnalysisError::InvalidWindow(format!(
                "tukey alpha must be in [0, 1], got {}",
                alpha
            )));
        }
    }

    let mut nperseg = params.window.samples(sample_rate)?;
    if nperseg > samples.len() {
        warn!(
            "window of {} samples is longer than the signal, using {} instead",
            nperseg,
            samples.len()
        );
        nperseg = samples.len();
    }

    let noverlap = ((nperseg as f64 * params.overlap).floor() as usize).min(nperseg - 1);
    let hop_size = nperseg - noverlap;
    let num_frames = (samples.len() - noverlap) / hop_size;
    let num_bins = nperseg / 2 + 1;

    let window = params.taper.coefficients(nperseg);
    let scale = 1.0 / window.iter().sum::<f64>();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];
    let mut magnitudes = vec![0.0f64; num_bins * num_frames];

    for frame in 0..num_frames {
        let start = frame * hop_size;
        let segment = &samples[start..start + nperseg];
        let mean = segment.iter().sum::<f64>() / nperseg as f64;

        for ((slot, &s), &w) in buffer.iter_mut().zip(segment).zip(window.iter()) {
            *slot = Complex::new((s - mean) * w, 0.0);
        }

        fft.process(&mut buffer);

        for (bin, c) in buffer.iter().take(num_bins).enumerate() {
            magnitudes[bin * num_frames + frame] = c.norm() * scale;
        }
    }

    let bin_resolution = sample_rate as f64 / nperseg as f64;
    let frequencies = (0..num_bins).map(|k| k as f64 * bin_resolution).collect();

    debug!(
        "spectrogram: nperseg={} noverlap={} frames={} bins={} resolution={:.2}Hz",
        nperseg, noverlap, num_frames, num_bins, bin_resolution
    );

    Ok(Spectrogram {
        frequencies,
        magnitudes,
        num_frames,
    })
}

/// Which qualifying bin becomes the rolloff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSelection {
    /// The highest qualifying bin anywhere in the spectrum.
    Highest,
    /// The top of the run of qualifying bins that starts at the lowest one.
    /// Isolated qualifying bins above a gap are ignored.
    HighestContiguous,
}

impl Default for BinSelection {
    fn default() -> Self {
        BinSelection::Highest
    }
}

/// What to report when no bin passes the sustained-energy test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoQualifyingBinPolicy {
    /// Fail with [`AnalysisError::NoQualifyingBin`].
    Error,
    /// Report the lowest bin's frequency.
    LowestBin,
}

impl Default for NoQualifyingBinPolicy {
    fn default() -> Self {
        NoQualifyingBinPolicy::Error
    }
}

/// Tunables of the sustained-energy criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloffParams {
    /// A bin qualifies when it is above average in more than `frames / sustain_divisor` frames.
    pub sustain_divisor: f64,
    pub selection: BinSelection,
    pub no_qualifying_bin: NoQualifyingBinPolicy,
}

impl Default for RolloffParams {
    fn default() -> Self {
        Self {
            sustain_divisor: DEFAULT_SUSTAIN_DIVISOR,
            selection: BinSelection::default(),
            no_qualifying_bin: NoQualifyingBinPolicy::default(),
        }
    }
}

/// Estimated upper edge of sustained energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RolloffEstimate {
    /// Center frequency of the selected bin in Hz.
    pub frequency_hz: f64,
    pub bin: usize,
    pub bin_width_hz: f64,
    /// Number of time frames the estimate was drawn from.
    pub frames: usize,
}

/// Reduce a spectrogram to its rolloff frequency.
///
/// The spectrogram is clamped in place (see
/// [`Spectrogram::clamp_to_smallest_positive`]) before any logarithm is taken.
pub fn estimate_rolloff(
    spectrogram: &mut Spectrogram,
    params: &RolloffParams,
) -> Result<RolloffEstimate, AnalysisError> {
    if params.sustain_divisor.is_nan() || params.sustain_divisor <= 0.0 {
        return Err(AnalysisError::InvalidWindow(format!(
            "sustain divisor must be positive, got {}",
            params.sustain_divisor
        )));
    }

    spectrogram.clamp_to_smallest_positive()?;

    let num_frames = spectrogram.num_frames();
    let log_mag: Vec<f64> = spectrogram.magnitudes.iter().map(|m| m.log10()).collect();
    let avg_log = log_mag.iter().sum::<f64>() / log_mag.len() as f64;

    let min_count = num_frames as f64 / params.sustain_divisor;
    let qualifies: Vec<bool> = log_mag
        .chunks(num_frames)
        .map(|row| row.iter().filter(|&&v| v > avg_log).count() as f64 > min_count)
        .collect();

    let bin = match params.selection {
        BinSelection::Highest => qualifies.iter().rposition(|&q| q),
        BinSelection::HighestContiguous => qualifies.iter().position(|&q| q).map(|first| {
            let run = qualifies[first..].iter().take_while(|&&q| q).count();
            first + run - 1
        }),
    };

    let bin = match (bin, params.no_qualifying_bin) {
        (Some(bin), _) => bin,
        (None, NoQualifyingBinPolicy::LowestBin) => {
            warn!("no bin carries sustained energy, reporting the lowest bin");
            0
        }
        (None, NoQualifyingBinPolicy::Error) => return Err(AnalysisError::NoQualifyingBin),
    };

    let estimate = RolloffEstimate {
        frequency_hz: spectrogram.frequencies()[bin],
        bin,
        bin_width_hz: spectrogram.bin_width(),
        frames: num_frames,
    };

    debug!(
        "rolloff: avg_log={:.3} min_count={:.2} bin={} freq={:.0}Hz",
        avg_log, min_count, bin, estimate.frequency_hz
    );

    Ok(estimate)
}

/// The complete profiler: spectrogram construction plus rolloff estimation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralProfiler {
    #[serde(default)]
    pub spectrogram: SpectrogramParams,
    #[serde(default)]
    pub rolloff: RolloffParams,
}

impl SpectralProfiler {
    pub fn new(spectrogram: SpectrogramParams, rolloff: RolloffParams) -> Self {
        Self {
            spectrogram,
            rolloff,
        }
    }

    /// Estimate the rolloff of one channel of samples.
    pub fn profile(&self, samples: &[f64], sample_rate: u32) -> Result<RolloffEstimate, AnalysisError> {
        let mut spectrogram = compute_spectrogram(samples, sample_rate, &self.spectrogram)?;
        estimate_rolloff(&mut spectrogram, &self.rolloff)
    }
}
