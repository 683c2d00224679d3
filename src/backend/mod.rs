//! Render backends.
//!
//! [`RecordingBackend`] keeps everything in memory and is what the tests and
//! headless tools drive. The wgpu backend draws for real and is only built
//! with the `gpu` feature.

pub mod recording;
#[cfg(feature = "gpu")]
pub mod gpu;

pub use recording::{DrawCall, RecordingBackend, StateChange};
#[cfg(feature = "gpu")]
pub use gpu::WgpuBackend;
