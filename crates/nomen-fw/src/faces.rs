//! Face table.
//!
//! Owns the registered faces as trait objects and answers attribute
//! queries for the pipelines and strategies. Ids below
//! [`FACEID_RESERVED_MAX`] are reserved and refused.

use std::collections::BTreeMap;

use nomen_core::{Face, FaceId, FaceScope, LinkType, FACEID_RESERVED_MAX, INVALID_FACEID};

use crate::error::FaceTableError;

/// Collection of registered faces.
#[derive(Default)]
pub struct FaceTable {
    faces: BTreeMap<FaceId, Box<dyn Face>>,
}

impl FaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face under its own id.
    pub fn insert(&mut self, face: Box<dyn Face>) -> Result<FaceId, FaceTableError> {
        let id = face.id();
        if id <= FACEID_RESERVED_MAX {
            return Err(FaceTableError::ReservedId(id));
        }
        if self.faces.contains_key(&id) {
            return Err(FaceTableError::DuplicateId(id));
        }
        self.faces.insert(id, face);
        Ok(id)
    }

    /// The next unused id above the reserved range.
    #[must_use]
    pub fn next_face_id(&self) -> FaceId {
        let last = self
            .faces
            .keys()
            .next_back()
            .copied()
            .unwrap_or(FACEID_RESERVED_MAX);
        FaceId(last.0.max(FACEID_RESERVED_MAX.0) + 1)
    }

    pub fn remove(&mut self, id: FaceId) -> Option<Box<dyn Face>> {
        self.faces.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: FaceId) -> bool {
        id != INVALID_FACEID && self.faces.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: FaceId) -> Option<&dyn Face> {
        self.faces.get(&id).map(|f| f.as_ref())
    }

    pub fn get_mut(&mut self, id: FaceId) -> Option<&mut Box<dyn Face>> {
        self.faces.get_mut(&id)
    }

    #[must_use]
    pub fn scope_of(&self, id: FaceId) -> Option<FaceScope> {
        self.get(id).map(|f| f.scope())
    }

    #[must_use]
    pub fn link_type_of(&self, id: FaceId) -> Option<LinkType> {
        self.get(id).map(|f| f.link_type())
    }

    /// Ids of all registered faces, in ascending order.
    pub fn ids(&self) -> Vec<FaceId> {
        self.faces.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_core::testing::MockFace;
    use nomen_core::FACEID_CONTENT_STORE;

    #[test]
    fn test_insert_and_query() {
        let mut table = FaceTable::new();
        let id = table
            .insert(Box::new(MockFace::point_to_point(FaceId(256))))
            .unwrap();
        assert_eq!(id, FaceId(256));
        assert!(table.contains(id));
        assert_eq!(table.scope_of(id), Some(FaceScope::NonLocal));
        assert_eq!(table.link_type_of(id), Some(LinkType::PointToPoint));
    }

    #[test]
    fn test_reserved_and_duplicate_ids_refused() {
        let mut table = FaceTable::new();
        assert_eq!(
            table.insert(Box::new(MockFace::point_to_point(FACEID_CONTENT_STORE))),
            Err(FaceTableError::ReservedId(FACEID_CONTENT_STORE))
        );

        table
            .insert(Box::new(MockFace::point_to_point(FaceId(256))))
            .unwrap();
        assert_eq!(
            table.insert(Box::new(MockFace::ad_hoc(FaceId(256)))),
            Err(FaceTableError::DuplicateId(FaceId(256)))
        );
    }

    #[test]
    fn test_next_face_id() {
        let mut table = FaceTable::new();
        assert_eq!(table.next_face_id(), FaceId(256));
        table
            .insert(Box::new(MockFace::point_to_point(FaceId(300))))
            .unwrap();
        assert_eq!(table.next_face_id(), FaceId(301));
    }

    #[test]
    fn test_invalid_id_never_contained() {
        let table = FaceTable::new();
        assert!(!table.contains(INVALID_FACEID));
    }
}
