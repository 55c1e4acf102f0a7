/// Frame module - frame slots, the orchestrator loop and deferred releases

mod retire;
mod frame_slot;
mod stats;
mod orchestrator;

pub use retire::RetireQueue;
pub use frame_slot::{FrameSlot, SlotState};
pub use stats::FrameStats;
pub use orchestrator::{FrameOrchestrator, FrameOutcome};
