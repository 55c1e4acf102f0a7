/// Fences and semaphores
///
/// Fences are CPU-visible completion markers; semaphores order GPU work
/// (acquire → render → present) without CPU involvement.

use std::any::Any;
use crate::error::Result;

/// Outcome of a bounded fence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    Signaled,
    TimedOut,
}

pub trait Fence: Send + Sync {
    /// Block until the fence is signaled or `timeout_ns` elapses
    fn wait(&self, timeout_ns: u64) -> Result<FenceStatus>;

    /// Return the fence to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Non-blocking status query
    fn is_signaled(&self) -> Result<bool>;

    fn as_any(&self) -> &dyn Any;
}

pub trait Semaphore: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}
