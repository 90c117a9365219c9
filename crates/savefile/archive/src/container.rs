use std::collections::HashMap;

use obelisk_properties::{Name, ObjectRef, ParseLog, Property, PropertySlice as _, PropertyValue};

use crate::object::{GameObject, ObjectId};


/// The insertion-ordered store of every object decoded from one save, plus
/// the indices needed to answer queries without rescanning: by id (the vec
/// position itself), by GUID, and by primary name.
#[derive(Debug, Default)]
pub struct ObjectContainer {
    objects: Vec<GameObject>,
    by_guid: HashMap<[u8; 16], ObjectId>,
    by_name: HashMap<Name, Vec<ObjectId>>,
}

impl ObjectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append an object, assigning its id and updating the indices.
    pub fn push(&mut self, mut object: GameObject) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        object.id = id;

        if object.guid != [0; 16] {
            self.by_guid.insert(object.guid, id);
        }
        if let Some(primary) = object.names.first() {
            self.by_name.entry(primary.clone()).or_default().push(id);
        }

        self.objects.push(object);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id.0 as usize)
    }

    pub fn get_by_guid(&self, guid: &[u8; 16]) -> Option<&GameObject> {
        self.get(*self.by_guid.get(guid)?)
    }

    /// Objects whose primary name matches exactly (text and suffix).
    pub fn get_by_name(&self, name: &Name) -> impl Iterator<Item = &GameObject> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(*id))
    }

    /// Follow an object reference from a property value.
    ///
    /// Dangling references resolve to `None`; the caller decides whether
    /// that counts as a parse error (it does, during relationship checks).
    pub fn resolve(&self, reference: ObjectRef) -> Option<&GameObject> {
        match reference {
            ObjectRef::Null       => None,
            ObjectRef::Id(id)     => self.get(ObjectId(u32::try_from(id).ok()?)),
            ObjectRef::Guid(guid) => self.get_by_guid(&guid),
        }
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    // ================================
    //  Class-pattern queries
    // ================================

    pub fn creatures(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| o.is_creature())
    }

    /// Creatures whose status component carries a tamer string.
    pub fn tamed_creatures(&self) -> impl Iterator<Item = &GameObject> {
        self.creatures().filter(|o| self.tamer_of(o).is_some())
    }

    /// Creatures without a tamer string.
    pub fn wild_creatures(&self) -> impl Iterator<Item = &GameObject> {
        self.creatures().filter(|o| self.tamer_of(o).is_none())
    }

    pub fn structures(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| o.is_structure())
    }

    pub fn player_pawns(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| o.is_player_pawn())
    }

    pub fn items(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| o.is_item)
    }

    /// The status component linked to a creature by the relationship pass.
    pub fn status_component(&self, object: &GameObject) -> Option<&GameObject> {
        object
            .components
            .values()
            .filter_map(|id| self.get(*id))
            .find(|c| c.is_status_component())
    }

    fn tamer_of(&self, object: &GameObject) -> Option<&str> {
        self.status_component(object)?
            .properties
            .find("TamerString")?
            .as_str()
    }

    // ================================
    //  Relationship building
    // ================================

    /// Pair every component with its parent: an object `A` whose name list
    /// has more than one entry belongs to the object whose primary name is
    /// `A.names[1]`.
    ///
    /// The pass is idempotent: it resets all links before rebuilding, so
    /// running it twice yields the same graph. Components with no matching
    /// parent are logged and left parentless.
    pub fn build_relationships(&mut self, log: &mut ParseLog) {
        for object in &mut self.objects {
            object.parent = None;
            object.components.clear();
        }

        let mut links = Vec::new();
        for (position, object) in self.objects.iter().enumerate() {
            if object.names.len() < 2 {
                continue;
            }
            let parent_name = &object.names[1];
            let parent = self
                .by_name
                .get(parent_name)
                .into_iter()
                .flatten()
                .copied()
                .find(|id| id.0 as usize != position);

            match parent {
                Some(parent_id) => links.push((position, parent_id)),
                None => log.record(format!(
                    "component {} names parent {parent_name}, which is not in this save",
                    object.names[0],
                )),
            }
        }

        for (child_position, parent_id) in links {
            let child_id = self.objects[child_position].id;
            let class_name = self.objects[child_position].class_name.clone();
            self.objects[child_position].parent = Some(parent_id);
            let displaced = self.objects[parent_id.0 as usize]
                .components
                .insert(class_name, child_id);
            if displaced.is_some() {
                log.record(format!(
                    "object {} carries two components of class {}; kept the later one",
                    self.objects[parent_id.0 as usize].names[0],
                    self.objects[child_id.0 as usize].class_name,
                ));
            }
        }
    }

    /// Count object references that point outside this container. Dangling
    /// references stay in the property tree as-is; each one costs a parse
    /// error, so callers can gate on the count.
    pub fn audit_references(&self, log: &mut ParseLog) {
        for object in &self.objects {
            for property in &object.properties {
                for reference in object_refs_of(property) {
                    if self.resolve(reference).is_none() {
                        log.record(format!(
                            "object {} property {} references an object not in this save",
                            object.names[0], property.name,
                        ));
                    }
                }
            }
        }
    }
}

/// Non-null object references directly inside a property value (nested
/// struct bodies hold no references in observed saves).
fn object_refs_of(property: &Property) -> Vec<ObjectRef> {
    fn non_null(reference: &ObjectRef) -> Option<ObjectRef> {
        match reference {
            ObjectRef::Null => None,
            other => Some(*other),
        }
    }

    match &property.value {
        PropertyValue::Object(reference) => non_null(reference).into_iter().collect(),
        PropertyValue::Array { values, .. } | PropertyValue::Set { values, .. } => values
            .iter()
            .filter_map(|value| match value {
                PropertyValue::Object(reference) => non_null(reference),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use obelisk_properties::{Name, ObjectRef, ParseLog};
    use crate::object::{GameObject, ObjectId};
    use super::ObjectContainer;

    fn object(names: &[(&str, u32)]) -> GameObject {
        GameObject::new(
            [0; 16],
            names.iter().map(|(n, s)| Name::with_suffix(*n, *s)).collect(),
            Vec::new(),
            false,
            None,
            Vec::new(),
            Vec::new(),
        )
    }

    fn rex_with_status() -> ObjectContainer {
        let mut container = ObjectContainer::new();
        container.push(object(&[("Rex_Character_BP_C", 1)]));
        container.push(object(&[
            ("DinoCharacterStatusComponent_BP_C", 1),
            ("Rex_Character_BP_C", 1),
        ]));
        container
    }

    #[test]
    fn components_link_to_their_parent() {
        let mut container = rex_with_status();
        let mut log = ParseLog::new();
        container.build_relationships(&mut log);

        assert_eq!(log.error_count(), 0);
        let rex = container.get(ObjectId(0)).expect("rex exists");
        assert_eq!(
            rex.components.get("DinoCharacterStatusComponent_BP_C"),
            Some(&ObjectId(1)),
        );
        let status = container.get(ObjectId(1)).expect("status exists");
        assert_eq!(status.parent, Some(ObjectId(0)));

        let found = container.status_component(rex).expect("status is reachable");
        assert_eq!(found.id, ObjectId(1));
    }

    #[test]
    fn relationship_pass_is_idempotent() {
        let mut container = rex_with_status();
        let mut log = ParseLog::new();
        container.build_relationships(&mut log);
        container.build_relationships(&mut log);

        let rex = container.get(ObjectId(0)).expect("rex exists");
        assert_eq!(rex.components.len(), 1, "rebuilding does not duplicate links");
    }

    #[test]
    fn orphan_components_are_logged_not_fatal() {
        let mut container = ObjectContainer::new();
        container.push(object(&[("StatusComponent", 9), ("MissingParent", 3)]));
        let mut log = ParseLog::new();
        container.build_relationships(&mut log);

        assert_eq!(log.error_count(), 1);
        assert_eq!(container.get(ObjectId(0)).and_then(|o| o.parent), None);
    }

    #[test]
    fn dangling_references_are_counted_not_dropped() {
        use obelisk_properties::{Property, PropertyTag, PropertyValue, ObjectRef};

        let mut container = ObjectContainer::new();
        let mut holder = object(&[("StorageBox_C", 1)]);
        holder.properties.push(Property {
            name:  Name::new("MyInventoryComponent"),
            tag:   PropertyTag::Object,
            index: 0,
            value: PropertyValue::Object(ObjectRef::Id(99)),
        });
        holder.properties.push(Property {
            name:  Name::new("PlacedOn"),
            tag:   PropertyTag::Object,
            index: 0,
            value: PropertyValue::Object(ObjectRef::Null),
        });
        container.push(holder);

        let mut log = ParseLog::new();
        container.audit_references(&mut log);
        assert_eq!(log.error_count(), 1, "null is fine, index 99 is dangling");

        let held = container.get(ObjectId(0)).expect("object still present");
        assert_eq!(held.properties.len(), 2, "dangling references are retained");
    }

    #[test]
    fn resolve_handles_all_reference_shapes() {
        let mut container = ObjectContainer::new();
        let mut with_guid = object(&[("Actor", 1)]);
        with_guid.guid = [7; 16];
        container.push(with_guid);

        assert!(container.resolve(ObjectRef::Null).is_none());
        assert!(container.resolve(ObjectRef::Id(0)).is_some());
        assert!(container.resolve(ObjectRef::Id(40)).is_none());
        assert!(container.resolve(ObjectRef::Guid([7; 16])).is_some());
        assert!(container.resolve(ObjectRef::Guid([8; 16])).is_none());
    }
}
