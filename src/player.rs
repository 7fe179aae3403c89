//! Playback engine: a single-writer state machine on a dedicated thread.
//!
//! Transport operations arrive over a command channel and are applied in
//! order; the engine publishes its state through a shared handle and keeps
//! the now-playing record in sync inside every transition.

mod engine;
mod output;
mod thread;
mod types;

pub use engine::Player;
pub use output::{AudioOutput, AudioSink, LoadError, RodioOutput};
pub use types::{PlaybackHandle, PlaybackInfo, PlaybackStatus, PlayerCmd, PlayerEvent};
