use thiserror::Error;

/// Failures on the editor side of the display boundary
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),

    #[error("display buffer holds {actual} points, expected {expected}")]
    DisplayLength { expected: usize, actual: usize },
}
