use obelisk_archive::{GameObject, LoadedSave};
use obelisk_properties::{Property, PropertySlice as _, PropertyValue};
use obelisk_properties::structs::StructValue;

use crate::error::ExtractError;
use crate::stats::StatPoints;


/// A survivor, projected from a `PrimalPlayerData` object — either the lone
/// object of a profile bundle or a player-state object inside a world.
#[derive(Debug, Clone)]
pub struct Player {
    pub player_id:   u64,
    pub player_name: String,
    /// The in-world character's name, when a character has been created.
    pub character_name: Option<String>,
    /// Platform account id (a `UniqueNetIdRepl` on the wire).
    pub unique_net_id: Option<String>,
    pub tribe_id:      Option<i32>,
    pub level:         i32,
    pub stat_points:   StatPoints,
    pub engram_blueprints: Vec<String>,
}

impl Player {
    pub fn from_object(object: &GameObject) -> Self {
        let props = object.properties.as_slice();

        let config = props.find_fields("MyPlayerCharacterConfig").unwrap_or(&[]);
        let persistent = props.find_fields("MyPersistentCharacterStats").unwrap_or(&[]);

        let extra_level = persistent
            .find("CharacterStatusComponent_ExtraCharacterLevel")
            .and_then(Property::as_i32)
            .unwrap_or(0);

        let engram_blueprints = props
            .find("PlayerState_EngramBlueprints")
            .and_then(Property::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| match value {
                        PropertyValue::Str(path)  => Some(path.clone()),
                        PropertyValue::Name(name) => Some(name.text.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            player_id: props.find("PlayerDataID").and_then(Property::as_i64).unwrap_or(0) as u64,
            player_name: props
                .find("PlayerName")
                .and_then(Property::as_str)
                .unwrap_or_default()
                .to_owned(),
            character_name: config
                .find("PlayerCharacterName")
                .and_then(Property::as_str)
                .map(str::to_owned),
            unique_net_id: props.find("UniqueID").and_then(net_id_value),
            tribe_id: props.find("TribeID").and_then(Property::as_i32),
            level: 1 + extra_level,
            stat_points: StatPoints::gather(
                persistent,
                "CharacterStatusComponent_NumberOfLevelUpPointsApplied",
            ),
            engram_blueprints,
        }
    }

    /// The player a profile bundle describes.
    pub fn from_profile(save: &LoadedSave) -> Result<Self, ExtractError> {
        save.container
            .iter()
            .find(|o| o.class_name.contains("PrimalPlayerData"))
            .map(Self::from_object)
            .ok_or(ExtractError::MissingObject("PrimalPlayerData"))
    }
}

fn net_id_value(property: &Property) -> Option<String> {
    match property.as_struct()? {
        StructValue::UniqueNetId(id) => Some(id.value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use obelisk_archive::GameObject;
    use obelisk_properties::{Name, Property, PropertyTag, PropertyValue};
    use crate::stats::StatIndex;
    use super::Player;

    fn player_object(properties: Vec<Property>) -> GameObject {
        GameObject::new(
            [0; 16],
            vec![Name::new("PrimalPlayerData_C")],
            Vec::new(),
            false,
            None,
            properties,
            Vec::new(),
        )
    }

    fn str_prop(name: &str, value: &str) -> Property {
        Property {
            name:  Name::new(name),
            tag:   PropertyTag::Str,
            index: 0,
            value: PropertyValue::Str(value.to_owned()),
        }
    }

    #[test]
    fn fresh_profile_defaults_to_level_one() {
        let object = player_object(vec![
            str_prop("PlayerName", "Alice"),
            Property {
                name:  Name::new("PlayerDataID"),
                tag:   PropertyTag::UInt64,
                index: 0,
                value: PropertyValue::UInt64(42),
            },
            Property {
                name:  Name::new("TribeID"),
                tag:   PropertyTag::Int,
                index: 0,
                value: PropertyValue::Int(1),
            },
        ]);

        let player = Player::from_object(&object);
        assert_eq!(player.player_name, "Alice");
        assert_eq!(player.player_id, 42);
        assert_eq!(player.tribe_id, Some(1));
        assert_eq!(player.level, 1, "no persistent stats yet");
        assert!(player.engram_blueprints.is_empty());
    }

    #[test]
    fn profile_bundle_end_to_end() {
        use obelisk_properties::writers::{put_fstring, put_i32, put_u32, InlineNames, PropertyWriter};

        let mut names = InlineNames;
        let mut writer = PropertyWriter::new(&mut names);
        writer.string("PlayerName", "Alice");
        writer.uint64("PlayerDataID", 42);
        writer.int("TribeID", 1);
        writer.array_str("PlayerState_EngramBlueprints", &[]);
        let props = writer.into_bytes();

        let mut bundle = Vec::new();
        put_i32(&mut bundle, 6); // version
        put_i32(&mut bundle, 1); // one object
        bundle.extend_from_slice(&[0; 16]);
        put_i32(&mut bundle, 1);
        put_fstring(&mut bundle, "PrimalPlayerData_C");
        put_u32(&mut bundle, 0); // is_item
        put_i32(&mut bundle, 0); // component names
        put_u32(&mut bundle, 0); // no location
        put_u32(&mut bundle, 0); // property offset
        put_u32(&mut bundle, 1); // should_be_loaded
        bundle.extend(props);

        let save = obelisk_archive::decode_embedded(&bundle).expect("profile decodes");
        let player = super::Player::from_profile(&save).expect("player object present");
        assert_eq!(player.player_name, "Alice");
        assert_eq!(player.player_id, 42);
        assert_eq!(player.level, 1);
        assert!(player.engram_blueprints.is_empty());
    }

    #[test]
    fn level_and_points_come_from_persistent_stats() {
        let persistent = obelisk_properties::structs::StructValue::Fields(vec![
            Property {
                name:  Name::new("CharacterStatusComponent_ExtraCharacterLevel"),
                tag:   PropertyTag::UInt16,
                index: 0,
                value: PropertyValue::UInt16(54),
            },
            Property {
                name:  Name::new("CharacterStatusComponent_NumberOfLevelUpPointsApplied"),
                tag:   PropertyTag::Byte,
                index: 7,
                value: PropertyValue::Byte(obelisk_properties::ByteValue::Raw(20)),
            },
        ]);
        let object = player_object(vec![
            str_prop("PlayerName", "Brin"),
            Property {
                name:  Name::new("MyPersistentCharacterStats"),
                tag:   PropertyTag::Struct,
                index: 0,
                value: PropertyValue::Struct(Box::new(persistent)),
            },
        ]);

        let player = Player::from_object(&object);
        assert_eq!(player.level, 55, "1 + 54");
        assert_eq!(player.stat_points.get(StatIndex::Weight), 20);
    }
}
