use indexmap::IndexMap;

use obelisk_properties::{Name, Property};


/// Position of an object inside its container. References between objects
/// are these indices (or GUID lookups that resolve to them), never pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// A world position and orientation. The legacy wire stores f32 components,
/// the modern wire f64; both widen to f64 here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocationData {
    pub x:     f64,
    pub y:     f64,
    pub z:     f64,
    pub pitch: f64,
    pub yaw:   f64,
    pub roll:  f64,
}

/// One decoded save object: an actor, a component, or an inventory item.
///
/// Objects are frozen once decoded, with one exception: the container's
/// relationship pass fills in `parent` and `components`.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub id:   ObjectId,
    /// All zeroes in legacy saves; the object's identity in modern saves.
    pub guid: [u8; 16],
    /// The last segment of `names[0]`'s class path, without its suffix.
    pub class_name: String,
    /// Never empty. `names[0]` is this object's own name; any further
    /// entries identify it as a component of the object they name.
    pub names: Vec<Name>,
    /// Class names of components this actor declares (legacy saves only).
    pub component_names: Vec<Name>,
    pub is_item:  bool,
    pub location: Option<LocationData>,
    /// In wire order; repeated names with distinct indices are meaningful.
    pub properties: Vec<Property>,
    /// Opaque trailing bytes some classes carry after their property list.
    pub extra_data: Vec<u8>,

    // Filled in by the relationship pass, not by the byte decoders.
    pub parent:     Option<ObjectId>,
    pub components: IndexMap<String, ObjectId>,
}

impl GameObject {
    /// Construct from decoded parts; `id` is assigned when the object enters
    /// a container.
    pub fn new(
        guid:            [u8; 16],
        names:           Vec<Name>,
        component_names: Vec<Name>,
        is_item:         bool,
        location:        Option<LocationData>,
        properties:      Vec<Property>,
        extra_data:      Vec<u8>,
    ) -> Self {
        let class_name = names
            .first()
            .map(|name| name.class_segment().to_owned())
            .unwrap_or_default();
        Self {
            id: ObjectId(0),
            guid,
            class_name,
            names,
            component_names,
            is_item,
            location,
            properties,
            extra_data,
            parent: None,
            components: IndexMap::new(),
        }
    }

    pub fn is_creature(&self) -> bool {
        self.class_name.contains("_Character_")
            && !self.class_name.contains("Corpse")
            && !self.class_name.contains("DinoCharacterStatusComponent")
    }

    pub fn is_structure(&self) -> bool {
        self.class_name.contains("Structure") && !self.class_name.contains("InventoryComponent")
    }

    pub fn is_player_pawn(&self) -> bool {
        self.class_name.contains("PlayerPawnTest_")
    }

    pub fn is_status_component(&self) -> bool {
        self.class_name.starts_with("DinoCharacterStatusComponent")
            || self.class_name.starts_with("CharacterStatusComponent")
    }
}
