pub mod object_id_allocator;

pub use object_id_allocator::{ObjectIdAllocator, BACKGROUND_ID};
