//! Error types of the render worker.

use crate::io::LoadError;
use thiserror::Error;

/// Non-fatal error while processing a single command.
///
/// Reported to the controller as an `Error` result carrying the display
/// message; the worker keeps running and scene state is left unchanged.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Pick(#[from] PickError),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Error while resolving a pick ray.
#[derive(Debug, Error)]
pub enum PickError {
    /// fx or fy of the intrinsics is zero, the ray is undefined.
    #[error("degenerate camera ray: focal length is zero")]
    DegenerateRay,

    #[error("camera extrinsic is not invertible")]
    SingularExtrinsic,
}

/// Out-of-range argument on a mutator command.
#[derive(Debug, Error)]
#[error("invalid {argument}: {message}")]
pub struct ValidationError {
    pub argument: &'static str,
    pub message: String,
}

/// The rendering backend itself became unusable.
/// Fatal: terminates the worker loop.
#[derive(Debug, Error)]
pub enum RenderFault {
    #[error("render context was already released")]
    ContextReleased,

    #[error("framebuffer dimensions do not match its pixel data")]
    BadFramebuffer,

    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Outcome of a single command dispatch: either reportable or fatal.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    #[error("{0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    Fatal(#[from] RenderFault),
}

impl From<LoadError> for DispatchError {
    fn from(e: LoadError) -> Self {
        DispatchError::Command(CommandError::Load(e))
    }
}

impl From<PickError> for DispatchError {
    fn from(e: PickError) -> Self {
        DispatchError::Command(CommandError::Pick(e))
    }
}

impl From<ValidationError> for DispatchError {
    fn from(e: ValidationError) -> Self {
        DispatchError::Command(CommandError::Validation(e))
    }
}
