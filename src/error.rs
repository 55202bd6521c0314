use thiserror::Error;

/// Fatal run-level errors. Per-job page failures never surface here; they
/// are absorbed into `AttemptOutcome::Failure` at the attempt boundary.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("browser session error: {0}")]
    Session(#[from] thirtyfour::error::WebDriverError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
