/// Convenience result type used across trackburn.
pub type TrackburnResult<T> = Result<T, TrackburnError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TrackburnError {
    /// No coordinate sequence could be extracted from the raw track input.
    #[error("malformed track: {0}")]
    MalformedTrack(String),

    /// A specific overlay layer has no usable samples to render from.
    #[error("no track data: {0}")]
    NoTrackData(String),

    /// The external probe tool failed or returned unusable output.
    #[error("probe failed: {0}")]
    ProbeFailed(String),

    /// The encoder subprocess failed to start, crashed, or exited non-zero.
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    /// The job was stopped by an explicit cancel request.
    #[error("job cancelled")]
    Cancelled,

    /// Invalid user-provided job, option, or argument data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackburnError {
    /// Build a [`TrackburnError::MalformedTrack`] value.
    pub fn malformed_track(msg: impl Into<String>) -> Self {
        Self::MalformedTrack(msg.into())
    }

    /// Build a [`TrackburnError::NoTrackData`] value.
    pub fn no_track_data(msg: impl Into<String>) -> Self {
        Self::NoTrackData(msg.into())
    }

    /// Build a [`TrackburnError::ProbeFailed`] value.
    pub fn probe_failed(msg: impl Into<String>) -> Self {
        Self::ProbeFailed(msg.into())
    }

    /// Build a [`TrackburnError::EncodeFailed`] value.
    pub fn encode_failed(msg: impl Into<String>) -> Self {
        Self::EncodeFailed(msg.into())
    }

    /// Build a [`TrackburnError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
