/// Allocates and recycles object IDs for picking.
///
/// ID 0 means "background" in the picking target and is never handed out.
/// Freed IDs are recycled (LIFO) so IDs stay dense as entities come and go.
///
/// # Example
///
/// ```ignore
/// let mut ids = ObjectIdAllocator::new();
/// let a = ids.alloc()?;  // 1
/// let b = ids.alloc()?;  // 2
/// ids.free(a);           // 1 is now available
/// let c = ids.alloc()?;  // 1 (recycled)
/// ```

use crate::error::Result;

/// Picking value of pixels not covered by any entity
pub const BACKGROUND_ID: u32 = 0;

pub struct ObjectIdAllocator {
    free_list: Vec<u32>,
    next_id: u32,
    len: u32,
}

impl ObjectIdAllocator {
    /// Create a new empty allocator
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            next_id: BACKGROUND_ID + 1,
            len: 0,
        }
    }

    /// Allocate the next available ID
    pub fn alloc(&mut self) -> Result<u32> {
        let id = match self.free_list.pop() {
            Some(id) => id,
            None => {
                if self.next_id == u32::MAX {
                    crate::engine_bail!(ResourceExhausted, "solar3d::scene", "object IDs exhausted");
                }
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };
        self.len += 1;
        Ok(id)
    }

    /// Return an ID to the pool for reuse
    pub fn free(&mut self, id: u32) {
        debug_assert!(
            id != BACKGROUND_ID && id < self.next_id && !self.free_list.contains(&id),
            "freeing an unallocated object ID: {}",
            id
        );
        self.len -= 1;
        self.free_list.push(id);
    }

    /// Highest ID ever allocated + 1
    pub fn high_water_mark(&self) -> u32 {
        self.next_id
    }

    /// Number of IDs currently in use
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no IDs are currently in use
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ObjectIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "object_id_allocator_tests.rs"]
mod tests;
