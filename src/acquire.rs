//! Acquisition pipeline: resolve a link to track metadata, fetch the audio
//! and cover assets, and commit them into the track store.
//!
//! A job runs in strict phases (metadata, cover, audio, commit). Only the
//! commit touches the visible store, so any earlier failure leaves the
//! library exactly as it was.

mod extract;
mod fetch;
mod pipeline;
mod types;

pub use extract::extract_source_id;
pub use fetch::{FetchError, HttpTransport, Transport};
pub use pipeline::{Acquirer, run_job};
pub use types::{AcquireError, Progress, TrackInfo};

#[cfg(test)]
mod tests;
