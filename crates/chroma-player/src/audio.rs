//! Audio decoding and output through rodio.
//!
//! [`RodioBackend`] is the native [`MediaBackend`]: it decodes one audio file,
//! feeds the system output device through a [`Sink`], and forwards every
//! decoded sample into the engine's analysis tap on the way out. The output
//! stream and sink are created lazily on the first analysis request so no
//! device is claimed before the user actually asks for playback.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chroma_core::{AnalysisHandle, BackendOpener, ChromaError, MediaBackend, Result, SourceEvent};
use rodio::source::{SamplesConverter, SkipDuration};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

/// Samples accumulated before the tap takes the analysis lock (reduces lock
/// contention on the audio thread).
const BATCH_SAMPLES: usize = 4096;

/// Minimum position movement, in seconds, before a new position event is
/// reported.
const POSITION_STEP: f64 = 0.1;

/// Decode chain appended to the sink: file decoder, converted to `f32`,
/// fast-forwarded to the seek offset.
type DecodedSource = SkipDuration<SamplesConverter<Decoder<BufReader<File>>, f32>>;

/// Playback progress shared between the audio thread and event polling.
///
/// The tap counts samples as they leave the decoder, so the reported
/// position tracks decode progress. The sink buffers only a few milliseconds
/// ahead of the device, keeping the drift well under a frame of the UI.
struct TapProgress {
    /// Seconds already skipped when the chain was built.
    start_offset: f64,
    sample_rate: u32,
    channels: u16,
    samples: AtomicU64,
    finished: AtomicBool,
}

impl TapProgress {
    fn new(start_offset: f64, sample_rate: u32, channels: u16) -> Self {
        TapProgress {
            start_offset,
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            samples: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    fn position_seconds(&self) -> f64 {
        let frames = self.samples.load(Ordering::Relaxed) / u64::from(self.channels);
        self.start_offset + frames as f64 / f64::from(self.sample_rate)
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Pass-through source that copies decoded samples into the analysis tap.
struct TapSource {
    inner: DecodedSource,
    analysis: AnalysisHandle,
    progress: Arc<TapProgress>,
    batch: Vec<f32>,
    channels: u16,
}

impl TapSource {
    fn new(
        inner: DecodedSource,
        analysis: AnalysisHandle,
        progress: Arc<TapProgress>,
        channels: u16,
    ) -> Self {
        TapSource {
            inner,
            analysis,
            progress,
            batch: Vec::with_capacity(BATCH_SAMPLES),
            channels,
        }
    }

    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        self.analysis.push_samples(&self.batch, self.channels);
        self.progress
            .samples
            .fetch_add(self.batch.len() as u64, Ordering::Relaxed);
        self.batch.clear();
    }
}

impl Iterator for TapSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self.inner.next() {
            Some(sample) => {
                self.batch.push(sample);
                if self.batch.len() >= BATCH_SAMPLES {
                    self.flush();
                }
                Some(sample)
            }
            None => {
                self.flush();
                self.progress.finished.store(true, Ordering::Relaxed);
                None
            }
        }
    }
}

impl Source for TapSource {
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Output stream, sink, and the progress view of the chain they play.
struct AudioGraph {
    // Held for its lifetime; dropping it silences the sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
    progress: Arc<TapProgress>,
}

/// File-backed media backend decoding through rodio.
pub struct RodioBackend {
    path: String,
    analysis: AnalysisHandle,
    graph: Option<AudioGraph>,
    pending: Vec<SourceEvent>,
    /// Position to start from when the graph is first built.
    start_at: f64,
    last_position: f64,
    volume: f32,
    playing: bool,
    ended_reported: bool,
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend")
            .field("path", &self.path)
            .field("start_at", &self.start_at)
            .field("last_position", &self.last_position)
            .field("volume", &self.volume)
            .field("playing", &self.playing)
            .field("ended_reported", &self.ended_reported)
            .finish_non_exhaustive()
    }
}

impl RodioBackend {
    /// Probe `path` and queue its metadata event.
    ///
    /// The file is opened and its header decoded immediately so a broken
    /// path fails the load rather than the first play. No audio device is
    /// touched here.
    pub fn open(path: &str) -> Result<Self> {
        let decoder = open_decoder(path)?;
        let duration = decoder
            .total_duration()
            .map(|d| d.as_secs_f64())
            .filter(|d| d.is_finite() && *d > 0.0);
        log::info!(
            "opened {path}: {} Hz, {} channel(s), duration {:?}",
            decoder.sample_rate(),
            decoder.channels(),
            duration
        );

        Ok(RodioBackend {
            path: path.to_string(),
            analysis: AnalysisHandle::new(),
            graph: None,
            pending: vec![SourceEvent::MetadataLoaded { duration }],
            start_at: 0.0,
            last_position: 0.0,
            volume: 1.0,
            playing: false,
            ended_reported: false,
        })
    }

    /// Factory for [`chroma_core::PlaybackEngine`].
    pub fn opener() -> BackendOpener {
        Box::new(|path| {
            let backend = RodioBackend::open(path)?;
            Ok(Box::new(backend) as Box<dyn MediaBackend>)
        })
    }

    /// Build the output stream and sink if they do not exist yet.
    fn ensure_graph(&mut self) -> Result<()> {
        if self.graph.is_some() {
            return Ok(());
        }
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            ChromaError::SourceUnavailable {
                reason: format!("audio output unavailable: {e}"),
            }
        })?;
        let sink = new_sink(&handle)?;
        let (source, progress) = self.open_tap(self.start_at)?;
        sink.set_volume(self.volume);
        sink.append(source);
        // Built ahead of the play request; stays silent until play().
        sink.pause();
        self.graph = Some(AudioGraph {
            _stream: stream,
            handle,
            sink,
            progress,
        });
        self.last_position = self.start_at;
        self.ended_reported = false;
        log::debug!("audio graph built at {:.2}s", self.start_at);
        Ok(())
    }

    /// Fresh decode chain for the current file, fast-forwarded to `offset`.
    fn open_tap(&self, offset: f64) -> Result<(TapSource, Arc<TapProgress>)> {
        let decoder = open_decoder(&self.path)?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let offset = offset.max(0.0);
        // skip_duration decodes and discards up to the offset; for formats
        // without an index this is what a seek costs anyway.
        let chain = decoder
            .convert_samples::<f32>()
            .skip_duration(Duration::from_secs_f64(offset));
        let progress = Arc::new(TapProgress::new(offset, sample_rate, channels));
        let source = TapSource::new(
            chain,
            self.analysis.clone(),
            Arc::clone(&progress),
            channels.max(1),
        );
        Ok((source, progress))
    }

    /// Replace the playing chain with one positioned at `offset`.
    ///
    /// The old sink keeps playing until the replacement is ready, so a
    /// failed rebuild leaves audible playback untouched.
    fn rebuild_source(&mut self, offset: f64) -> Result<()> {
        let (source, progress) = self.open_tap(offset)?;
        let Some(graph) = self.graph.as_mut() else {
            return Ok(());
        };
        let sink = new_sink(&graph.handle)?;
        sink.set_volume(self.volume);
        sink.append(source);
        if !self.playing {
            sink.pause();
        }
        graph.sink = sink;
        graph.progress = progress;
        self.last_position = offset;
        self.ended_reported = false;
        Ok(())
    }

    /// Whether the current chain has decoded to its end and played out.
    fn drained(&self) -> bool {
        self.graph
            .as_ref()
            .is_some_and(|g| g.progress.is_finished() && g.sink.empty())
    }
}

impl MediaBackend for RodioBackend {
    fn play(&mut self) -> Result<()> {
        if self.graph.is_none() {
            log::debug!("play refused: no audio graph");
            return Err(ChromaError::PlaybackRejected);
        }
        if self.drained() {
            // Replaying a finished track starts over from the top.
            self.rebuild_source(0.0).map_err(|err| {
                log::warn!("replay rebuild failed: {err}");
                ChromaError::PlaybackRejected
            })?;
        }
        self.playing = true;
        if let Some(graph) = self.graph.as_ref() {
            graph.sink.play();
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
        if let Some(graph) = self.graph.as_ref() {
            graph.sink.pause();
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        self.start_at = seconds.max(0.0);
        if self.graph.is_none() {
            return;
        }
        if let Err(err) = self.rebuild_source(self.start_at) {
            log::warn!("seek to {:.2}s failed: {err}", self.start_at);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(graph) = self.graph.as_ref() {
            graph.sink.set_volume(volume);
        }
    }

    fn ensure_analysis(&mut self) -> Result<AnalysisHandle> {
        self.ensure_graph()?;
        Ok(self.analysis.clone())
    }

    fn resume(&mut self) -> Result<()> {
        // The native output stream has no suspended state to wake from.
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SourceEvent> {
        let mut events = std::mem::take(&mut self.pending);
        let Some(graph) = self.graph.as_ref() else {
            return events;
        };

        let position = graph.progress.position_seconds();
        if (position - self.last_position).abs() >= POSITION_STEP {
            self.last_position = position;
            events.push(SourceEvent::PositionChanged { seconds: position });
        }
        if !self.ended_reported && self.drained() {
            self.ended_reported = true;
            // A finished element parks itself paused until the next play.
            self.playing = false;
            events.push(SourceEvent::Ended);
        }
        events
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.pause();
    }
}

fn open_decoder(path: &str) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path).map_err(|e| ChromaError::SourceUnavailable {
        reason: format!("{path}: {e}"),
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| ChromaError::SourceUnavailable {
        reason: format!("{path}: {e}"),
    })
}

fn new_sink(handle: &OutputStreamHandle) -> Result<Sink> {
    Sink::try_new(handle).map_err(|e| ChromaError::SourceUnavailable {
        reason: format!("audio output unavailable: {e}"),
    })
}
