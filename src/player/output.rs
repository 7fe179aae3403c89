//! The audio output seam: `rodio` in production, scripted fakes in tests.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use thiserror::Error;

use crate::library::Track;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no audio output device: {0}")]
    Device(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
}

/// One loaded piece of audio. Created paused; the engine decides when to
/// start it.
pub trait AudioSink {
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    /// True once the sink has drained past the end of the track.
    fn is_finished(&self) -> bool;
}

/// Loads tracks into sinks. The engine owns exactly one output for its
/// lifetime; it is constructed on the engine thread.
pub trait AudioOutput {
    /// Decode `track` and prepare a paused sink positioned at `start_at`.
    fn load(&self, track: &Track, start_at: Duration) -> Result<Box<dyn AudioSink>, LoadError>;
}

/// rodio-backed output on the default device.
pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    pub fn open() -> Result<Self, LoadError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| LoadError::Device(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped; keep the
        // process output quiet.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl AudioOutput for RodioOutput {
    fn load(&self, track: &Track, start_at: Duration) -> Result<Box<dyn AudioSink>, LoadError> {
        let file = File::open(&track.audio_path).map_err(|source| LoadError::Open {
            path: track.audio_path.clone(),
            source,
        })?;

        let source = Decoder::new(BufReader::new(file))
            .map_err(|source| LoadError::Decode {
                path: track.audio_path.clone(),
                source,
            })?
            // `skip_duration` is the seeking primitive; `Duration::ZERO`
            // is fine for a start-from-the-top load.
            .skip_duration(start_at);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();
        Ok(Box::new(RodioSink(sink)))
    }
}

struct RodioSink(Sink);

impl AudioSink for RodioSink {
    fn play(&self) {
        self.0.play();
    }

    fn pause(&self) {
        self.0.pause();
    }

    fn stop(&self) {
        self.0.stop();
    }

    fn is_finished(&self) -> bool {
        self.0.empty()
    }
}
