//! Audio Engine Module
//!
//! Numeric building blocks shared by every transform:
//! - Waveform buffer and level helpers
//! - Seedable randomness and parameter ranges
//! - Spectral primitives (STFT, FFT filtering, convolution, resampling)
//! - Shape/channel reconciliation
//! - WAV file I/O

pub mod buffer;
pub mod io;
pub mod reshape;
pub mod rng;
pub mod spectral;

pub use buffer::{calculate_peak, calculate_rms, db_to_linear, linear_to_db, Waveform};
pub use io::{export_wav, import_wav, LoadedAudio};
pub use rng::{AugmentRng, ParamRange, Seed};
pub use spectral::{Spectrogram, Stft};
