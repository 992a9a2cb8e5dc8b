//! Scoped handles for local file previews. A handle is acquired when the
//! user selects a file and released when the file is removed or the
//! workflow is torn down, so no preview resource outlives its owner.

use std::collections::HashMap;

use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    pub id: Uuid,
    pub file_name: String,
}

#[derive(Debug, Default)]
pub struct PreviewRegistry {
    handles: HashMap<Uuid, PreviewHandle>,
}

impl PreviewRegistry {
    pub fn acquire(&mut self, file_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.handles.insert(
            id,
            PreviewHandle { id, file_name: file_name.to_string() },
        );
        tracing::debug!(%id, file_name, "acquired preview handle");
        id
    }

    pub fn release(&mut self, id: Uuid) -> bool {
        let removed = self.handles.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "released preview handle");
        }
        removed
    }

    pub fn get(&self, id: Uuid) -> Option<&PreviewHandle> {
        self.handles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn release_all(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!(count = self.handles.len(), "releasing all preview handles");
            self.handles.clear();
        }
    }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_cycle() {
        let mut registry = PreviewRegistry::default();
        let id = registry.acquire("parcel.jpg");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id).unwrap().file_name, "parcel.jpg");

        assert!(registry.release(id));
        assert!(registry.is_empty());
        // Double release is a no-op.
        assert!(!registry.release(id));
    }

    #[test]
    fn release_all_clears_everything() {
        let mut registry = PreviewRegistry::default();
        registry.acquire("a.jpg");
        registry.acquire("b.jpg");
        registry.release_all();
        assert!(registry.is_empty());
    }
}
