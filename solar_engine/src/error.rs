//! Error types for the Solar3D engine
//!
//! Every fallible operation returns [`Result`]. Errors are classified as
//! fatal (the renderer must shut down) or recoverable (the current frame is
//! dropped and the loop continues).

use std::fmt;

/// Result type for Solar3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Solar3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failed, bad downcast, ...)
    BackendError(String),

    /// Out of GPU or host memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, entity, ...)
    InvalidResource(String),

    /// Initialization failed (instance, device, swapchain, pipelines)
    InitializationFailed(String),

    /// Device lost, or a fence wait exceeded its timeout
    DeviceLost(String),

    /// The presentation surface no longer matches the swapchain
    SurfaceOutOfDate,

    /// A fixed-size pool (descriptors, object IDs) ran dry
    ResourceExhausted(String),
}

impl Error {
    /// Fatal errors stop the renderer; everything else drops one frame at most.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InitializationFailed(_)
                | Error::DeviceLost(_)
                | Error::ResourceExhausted(_)
                | Error::OutOfMemory
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
            Error::SurfaceOutOfDate => write!(f, "Surface out of date"),
            Error::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build an [`Error::BackendError`] carrying the same message.
///
/// An optional variant can be given before the source:
///
/// ```no_run
/// # use solar_engine::engine_err;
/// let err = engine_err!("solar3d::vulkan", "vkQueueSubmit failed: {}", -4);
/// let err = engine_err!(InvalidResource, "solar3d::scene", "unknown parent");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::solar3d::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::solar3d::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with the matching error.
#[macro_export]
macro_rules! engine_bail {
    ($variant:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($variant, $source, $($arg)*))
    };
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Same as [`engine_err!`] but logged as a WARN (recoverable conditions).
#[macro_export]
macro_rules! engine_warn_err {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::solar3d::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::solar3d::Error::BackendError(message)
    }};
}

/// Same as [`engine_bail!`] but logged as a WARN.
#[macro_export]
macro_rules! engine_bail_warn {
    ($variant:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($variant, $source, $($arg)*))
    };
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
