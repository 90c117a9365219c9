use obelisk_archive::{GameObject, LocationData, ObjectContainer};
use obelisk_properties::{Property, PropertySlice as _};


/// A placed structure: ownership, health, and decay state.
#[derive(Debug, Clone)]
pub struct Structure {
    pub class_name: String,
    /// The owning tribe's targeting team id.
    pub tribe_id:   Option<i32>,
    pub owner_name: Option<String>,
    /// The name painted on a storage box, sign, or similar.
    pub box_name: Option<String>,
    pub health:     Option<f32>,
    pub max_health: Option<f32>,
    /// In-game seconds since an ally was last in range; drives decay.
    pub decay_elapsed: Option<f64>,
    pub has_inventory:  bool,
    pub location: Option<LocationData>,
}

impl Structure {
    pub fn from_object(
        object:    &GameObject,
        container: &ObjectContainer,
        game_time: f64,
    ) -> Self {
        let props = object.properties.as_slice();

        let has_inventory = props
            .find("MyInventoryComponent")
            .and_then(Property::as_object_ref)
            .and_then(|reference| container.resolve(reference))
            .is_some();

        let decay_elapsed = props
            .find("LastInAllyRangeTimeSerialized")
            .and_then(Property::as_f64)
            .map(|last| game_time - last);

        Self {
            class_name: object.class_name.clone(),
            tribe_id: props.find("TargetingTeam").and_then(Property::as_i32),
            owner_name: props.find("OwnerName").and_then(Property::as_str).map(str::to_owned),
            box_name: props.find("BoxName").and_then(Property::as_str).map(str::to_owned),
            health: props.find("Health").and_then(Property::as_f32),
            max_health: props.find("MaxHealth").and_then(Property::as_f32),
            decay_elapsed,
            has_inventory,
            location: object.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use obelisk_archive::{GameObject, ObjectContainer};
    use obelisk_properties::{Name, Property, PropertyTag, PropertyValue};
    use super::Structure;

    fn structure_object(properties: Vec<Property>) -> GameObject {
        GameObject::new(
            [0; 16],
            vec![Name::with_suffix("StorageBox_Large_C", 4)],
            Vec::new(),
            false,
            None,
            properties,
            Vec::new(),
        )
    }

    #[test]
    fn decay_measures_from_game_time() {
        let object = structure_object(vec![
            Property {
                name:  Name::new("TargetingTeam"),
                tag:   PropertyTag::Int,
                index: 0,
                value: PropertyValue::Int(1_500_000),
            },
            Property {
                name:  Name::new("LastInAllyRangeTimeSerialized"),
                tag:   PropertyTag::Double,
                index: 0,
                value: PropertyValue::Double(9_000.0),
            },
        ]);
        let container = ObjectContainer::new();

        let structure = Structure::from_object(&object, &container, 10_000.0);
        assert_eq!(structure.tribe_id, Some(1_500_000));
        assert_eq!(structure.decay_elapsed, Some(1_000.0));
        assert!(!structure.has_inventory);
    }

    #[test]
    fn missing_decay_timer_yields_none() {
        let structure =
            Structure::from_object(&structure_object(Vec::new()), &ObjectContainer::new(), 500.0);
        assert_eq!(structure.decay_elapsed, None);
        assert_eq!(structure.health, None);
    }
}
