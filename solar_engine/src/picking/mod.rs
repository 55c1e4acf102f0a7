/// Picking module - object-ID render and readback

mod picker;

pub use picker::{ObjectPicker, PICKING_FORMAT};
pub use crate::utils::BACKGROUND_ID;
