//! Analysis tap producing per-frame sample snapshots.
//!
//! The audio thread pushes decoded PCM into a [`SampleSource`] through a
//! shared [`AnalysisHandle`]; the render loop pulls one [`SampleSnapshot`]
//! per accepted tick. Frequency bytes follow the classic analyser contract:
//! windowed FFT magnitudes, exponentially smoothed, mapped from a fixed
//! decibel range onto 0..=255. Time-domain bytes are raw amplitudes centered
//! at 128.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};

// ============================================================================
// Analysis tuning constants
// ============================================================================

/// FFT length for the frequency snapshot.
pub const FFT_SIZE: usize = 256;

/// Frequency bins exposed per snapshot (`FFT_SIZE / 2`).
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Exponential smoothing factor blended over successive magnitude frames.
/// Higher values favor the previous frame and calm the display.
pub const SMOOTHING: f32 = 0.8;

/// Smoothed magnitudes at or below this level map to byte 0.
pub const MIN_DB: f32 = -100.0;

/// Smoothed magnitudes at or above this level map to byte 255.
pub const MAX_DB: f32 = -30.0;

/// Amplitude byte representing silence in the time-domain snapshot.
pub const AMPLITUDE_MIDPOINT: u8 = 128;

// ============================================================================
// Snapshot
// ============================================================================

/// One consistent read of current samples, valid only for the tick that
/// requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSnapshot {
    /// Frequency-domain magnitudes, one byte per bin, length [`BIN_COUNT`].
    pub frequency: Vec<u8>,
    /// Time-domain amplitudes centered at [`AMPLITUDE_MIDPOINT`], length
    /// [`FFT_SIZE`].
    pub time_domain: Vec<u8>,
}

impl SampleSnapshot {
    /// Snapshot of pure silence.
    pub fn silent() -> Self {
        SampleSnapshot {
            frequency: vec![0; BIN_COUNT],
            time_domain: vec![AMPLITUDE_MIDPOINT; FFT_SIZE],
        }
    }
}

// ============================================================================
// Sample source
// ============================================================================

/// Rolling analysis window over the most recent [`FFT_SIZE`] mono samples.
pub struct SampleSource {
    window: VecDeque<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
    fft_input: Vec<f32>,
    fft_scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    smoothed: Vec<f32>,
    coefficients: Vec<f32>,
}

impl SampleSource {
    /// Create an empty source. Snapshots report silence until samples arrive.
    pub fn new() -> Self {
        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(FFT_SIZE);
        let fft_input = fft.make_input_vec();
        let fft_scratch = fft.make_scratch_vec();
        let spectrum = fft.make_output_vec();
        let coefficients = (0..FFT_SIZE).map(|i| blackman_value(i, FFT_SIZE)).collect();

        SampleSource {
            window: VecDeque::with_capacity(FFT_SIZE),
            fft,
            fft_input,
            fft_scratch,
            spectrum,
            smoothed: vec![0.0; BIN_COUNT],
            coefficients,
        }
    }

    /// Feed interleaved PCM. Frames are downmixed to mono; only the most
    /// recent [`FFT_SIZE`] samples are retained.
    pub fn push_samples(&mut self, interleaved: &[f32], channels: u16) {
        let channels = channels.max(1) as usize;
        for frame in interleaved.chunks_exact(channels) {
            let mono = frame.iter().sum::<f32>() / channels as f32;
            self.window.push_back(mono);
        }
        while self.window.len() > FFT_SIZE {
            self.window.pop_front();
        }
    }

    /// Produce one snapshot of the current window.
    pub fn snapshot(&mut self) -> SampleSnapshot {
        let have = self.window.len();
        let pad = FFT_SIZE - have;

        // Window the samples, right-aligned so the newest audio sits at the
        // end of the buffer. Missing leading samples count as silence.
        self.fft_input[..pad].fill(0.0);
        for (i, sample) in self.window.iter().enumerate() {
            self.fft_input[pad + i] = sample * self.coefficients[pad + i];
        }

        // Buffer lengths come from the plan itself, so this cannot fail.
        let _ = self
            .fft
            .process_with_scratch(&mut self.fft_input, &mut self.spectrum, &mut self.fft_scratch);

        let db_span = MAX_DB - MIN_DB;
        let mut frequency = Vec::with_capacity(BIN_COUNT);
        for (bin, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.spectrum[bin].norm() / FFT_SIZE as f32;
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;

            let db = 20.0 * smoothed.log10();
            let byte = (255.0 / db_span * (db - MIN_DB)).clamp(0.0, 255.0);
            frequency.push(byte as u8);
        }

        let mut time_domain = vec![AMPLITUDE_MIDPOINT; FFT_SIZE];
        for (i, sample) in self.window.iter().enumerate() {
            let byte = (128.0 * (1.0 + sample)).clamp(0.0, 255.0);
            time_domain[pad + i] = byte as u8;
        }

        SampleSnapshot { frequency, time_domain }
    }
}

impl Default for SampleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleSource")
            .field("window_len", &self.window.len())
            .field("fft_size", &FFT_SIZE)
            .finish()
    }
}

/// Blackman window coefficient for one sample position.
fn blackman_value(index: usize, len: usize) -> f32 {
    let phase = 2.0 * std::f32::consts::PI * index as f32 / len as f32;
    0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
}

// ============================================================================
// Shared handle
// ============================================================================

/// Cloneable, thread-safe handle to the engine's analysis tap.
///
/// The audio thread pushes samples through one clone while the render loop
/// snapshots through another; the lock is held only for the copy.
#[derive(Clone)]
pub struct AnalysisHandle {
    inner: Arc<Mutex<SampleSource>>,
}

impl AnalysisHandle {
    /// Wrap a fresh [`SampleSource`].
    pub fn new() -> Self {
        AnalysisHandle {
            inner: Arc::new(Mutex::new(SampleSource::new())),
        }
    }

    /// Feed interleaved PCM into the shared window.
    pub fn push_samples(&self, interleaved: &[f32], channels: u16) {
        self.inner.lock().push_samples(interleaved, channels);
    }

    /// Produce one snapshot of the shared window.
    pub fn snapshot(&self) -> SampleSnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for AnalysisHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnalysisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisHandle")
            .field("window_len", &self.inner.lock().window.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * bin as f32 * i as f32 / FFT_SIZE as f32;
                amplitude * phase.sin()
            })
            .collect()
    }

    #[test]
    fn silence_produces_floor_bytes() {
        let mut source = SampleSource::new();
        let snapshot = source.snapshot();

        assert_eq!(snapshot.frequency.len(), BIN_COUNT);
        assert_eq!(snapshot.time_domain.len(), FFT_SIZE);
        assert!(snapshot.frequency.iter().all(|&b| b == 0));
        assert!(snapshot.time_domain.iter().all(|&b| b == AMPLITUDE_MIDPOINT));
    }

    #[test]
    fn sine_concentrates_energy_at_its_bin() {
        let mut source = SampleSource::new();
        source.push_samples(&sine(16, 1.0), 1);
        let snapshot = source.snapshot();

        let peak_bin = snapshot
            .frequency
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        // Window spread puts the peak within one bin of the tone.
        assert!(
            (15..=17).contains(&peak_bin),
            "expected peak near bin 16, found {peak_bin}"
        );
        assert!(snapshot.frequency[peak_bin] > 200);
        // A far-away bin stays near the noise floor.
        assert!(snapshot.frequency[100] < 40);
    }

    #[test]
    fn smoothing_decays_instead_of_dropping_to_zero() {
        let mut source = SampleSource::new();
        source.push_samples(&sine(16, 0.5), 1);
        let loud = source.snapshot().frequency[16].max(1);

        source.push_samples(&vec![0.0; FFT_SIZE], 1);
        let faded = source.snapshot().frequency[16];

        assert!(faded < loud, "magnitude must decay after signal loss");
        assert!(faded > 0, "smoothing must not collapse to zero in one frame");
    }

    #[test]
    fn time_domain_bytes_are_centered() {
        let mut source = SampleSource::new();
        source.push_samples(&vec![0.5; FFT_SIZE], 1);
        let snapshot = source.snapshot();

        assert!(snapshot.time_domain.iter().all(|&b| b == 192));

        source.push_samples(&vec![-1.0; FFT_SIZE], 1);
        let snapshot = source.snapshot();
        assert!(snapshot.time_domain.iter().all(|&b| b == 0));
    }

    #[test]
    fn stereo_frames_are_downmixed() {
        let mut source = SampleSource::new();
        let interleaved: Vec<f32> = (0..FFT_SIZE).flat_map(|_| [1.0, 0.0]).collect();
        source.push_samples(&interleaved, 2);
        let snapshot = source.snapshot();

        // (1.0 + 0.0) / 2 = 0.5 per frame -> byte 192.
        assert!(snapshot.time_domain.iter().all(|&b| b == 192));
    }

    #[test]
    fn window_keeps_only_newest_samples() {
        let mut source = SampleSource::new();
        source.push_samples(&vec![-1.0; FFT_SIZE], 1);
        source.push_samples(&vec![0.5; FFT_SIZE], 1);
        let snapshot = source.snapshot();

        assert!(snapshot.time_domain.iter().all(|&b| b == 192));
    }

    #[test]
    fn handle_clones_share_one_window() {
        let handle = AnalysisHandle::new();
        let writer = handle.clone();
        writer.push_samples(&vec![0.5; FFT_SIZE], 1);

        let snapshot = handle.snapshot();
        assert!(snapshot.time_domain.iter().all(|&b| b == 192));
    }

    #[test]
    fn silent_snapshot_matches_fresh_source() {
        let mut source = SampleSource::new();
        assert_eq!(source.snapshot(), SampleSnapshot::silent());
    }
}
