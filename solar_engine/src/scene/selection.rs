/// Currently selected entity, driven by picking results

use crate::scene::{EntityKey, SceneRegistry};
use crate::utils::BACKGROUND_ID;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<EntityKey>,
}

impl Selection {
    pub fn selected(&self) -> Option<EntityKey> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn select(&mut self, key: EntityKey) {
        self.selected = Some(key);
    }

    /// Apply a picked object ID.
    ///
    /// Background and unknown IDs leave the selection unchanged and return None.
    pub fn apply_pick(&mut self, object_id: u32, registry: &SceneRegistry) -> Option<EntityKey> {
        if object_id == BACKGROUND_ID {
            return None;
        }
        let key = registry.lookup_id(object_id)?;
        self.selected = Some(key);
        Some(key)
    }

    /// Drop the selection if it points at a removed entity
    pub fn validate(&mut self, registry: &SceneRegistry) {
        if let Some(key) = self.selected {
            if !registry.contains(key) {
                self.selected = None;
            }
        }
    }
}
