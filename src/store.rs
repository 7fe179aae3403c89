//! Track store contract: one folder per track under the `Songs` root.
//!
//! This module owns the naming rules (title sanitization, recognized
//! extensions), store root resolution, per-job staging directories and the
//! commit step that makes a downloaded track visible to the scanner.

mod commit;
mod paths;

pub use commit::*;
pub use paths::*;
