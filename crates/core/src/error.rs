/// Result alias that carries the custom [`PlaybackError`] type.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Common error type for the core crate.
///
/// The interpolation and sampling variants describe programming-contract
/// violations. Paths reachable from user input clamp or return early instead
/// of producing them.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The requested interpolation method needs more keyframes than the plan has.
    #[error("plan has too few keyframes for the requested interpolation method")]
    EmptyPlan,
    /// Sampling was requested with fewer than one sample.
    #[error("sample count must be at least 1, got {0}")]
    InvalidSampleCount(usize),
    /// The interpolator was evaluated outside of its time domain.
    #[error("query time {time} is outside of [{start}, {end}]")]
    OutOfRangeQuery { time: f64, start: f64, end: f64 },
    /// The pose interpolator was used before one had been built.
    #[error("pose interpolator has not been built")]
    NotReady,
    /// The plan handed to the engine violates the keyframe invariants.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// A textual option (combo box label, CLI flag) could not be parsed.
    #[error("unknown {kind} `{value}`")]
    UnknownOption { kind: &'static str, value: String },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl PlaybackError {
    pub(crate) fn invalid_plan<T: Into<String>>(reason: T) -> Self {
        Self::InvalidPlan(reason.into())
    }

    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownOption {
            kind,
            value: value.to_string(),
        }
    }
}
