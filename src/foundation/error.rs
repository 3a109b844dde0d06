/// Convenience result type used across rgbmatrix.
pub type MatrixResult<T> = Result<T, MatrixError>;

/// Top-level error taxonomy used by matrix, canvas and playback APIs.
#[derive(thiserror::Error, Debug)]
pub enum MatrixError {
    /// Invalid caller-provided input (buffer sizes, frame lists, configuration).
    #[error("validation error: {0}")]
    Validation(String),

    /// A backend could not be created or allocated.
    #[error("construction error: {0}")]
    Construction(String),

    /// A remote call failed before a response was received. Never retried internally.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote server executed the call and reported a failure.
    #[error("remote error: {0}")]
    Remote(String),

    /// Malformed frame-source input.
    #[error("decode error: {0}")]
    Decode(String),

    /// Playback session infrastructure failure (poisoned lock, panicked worker).
    #[error("playback error: {0}")]
    Playback(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatrixError {
    /// Build a [`MatrixError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MatrixError::Construction`] value.
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// Build a [`MatrixError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`MatrixError::Remote`] value.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Build a [`MatrixError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MatrixError::Playback`] value.
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
