//! The object arena.
//!
//! Objects are stored by id in a persistent ordered map, so iteration is
//! always in ascending id order and cloning a whole universe is O(1).

use im::OrdMap;

use crate::core::ObjectId;

use super::object::{UniverseObject, UniverseObjectType};

#[derive(Clone, Debug, Default)]
pub struct ObjectMap {
    objects: OrdMap<ObjectId, UniverseObject>,
}

impl ObjectMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` under its own id, replacing any previous entry.
    pub fn insert(&mut self, object: UniverseObject) {
        self.objects.insert(object.id, object);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<UniverseObject> {
        self.objects.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&UniverseObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut UniverseObject> {
        self.objects.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &UniverseObject> {
        self.objects.values()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Ids of objects of one kind, ascending.
    pub fn ids_of_type(&self, object_type: UniverseObjectType) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .values()
            .filter(move |obj| obj.object_type() == object_type)
            .map(|obj| obj.id)
    }

    #[must_use]
    pub fn object_type(&self, id: ObjectId) -> Option<UniverseObjectType> {
        self.get(id).map(UniverseObject::object_type)
    }

    /// Apply `f` to every object, in id order.
    pub fn update_all(&mut self, mut f: impl FnMut(&mut UniverseObject)) {
        let ids: Vec<ObjectId> = self.ids().collect();
        for id in ids {
            if let Some(object) = self.objects.get_mut(&id) {
                f(object);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::object::{Field, ObjectKind};

    fn field(id: i32) -> UniverseObject {
        let mut obj = UniverseObject::new(
            "F",
            0.0,
            0.0,
            ObjectKind::Field(Field {
                field_type: "FLD_NEBULA_1".into(),
            }),
        );
        obj.id = ObjectId(id);
        obj
    }

    #[test]
    fn test_iteration_is_id_ordered() {
        let mut map = ObjectMap::new();
        map.insert(field(5));
        map.insert(field(1));
        map.insert(field(3));

        let ids: Vec<_> = map.ids().collect();
        assert_eq!(ids, vec![ObjectId(1), ObjectId(3), ObjectId(5)]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map = ObjectMap::new();
        map.insert(field(1));
        let snapshot = map.clone();

        map.get_mut(ObjectId(1)).unwrap().name = "Changed".into();
        map.remove(ObjectId(1));

        assert_eq!(snapshot.get(ObjectId(1)).unwrap().name, "F");
        assert!(!map.contains(ObjectId(1)));
    }

    #[test]
    fn test_ids_of_type() {
        let mut map = ObjectMap::new();
        map.insert(field(2));
        assert_eq!(map.ids_of_type(UniverseObjectType::Field).count(), 1);
        assert_eq!(map.ids_of_type(UniverseObjectType::Ship).count(), 0);
    }
}
