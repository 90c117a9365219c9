use obelisk_archive::{decode_embedded, GameObject};
use obelisk_properties::{ByteValue, Property, PropertySlice as _, PropertyValue};

use crate::creature::Creature;
use crate::stats::StatPoints;


/// An inventory item. Cryopods additionally carry a frozen creature, parsed
/// out of the item's custom data.
#[derive(Debug, Clone)]
pub struct Item {
    pub class_name:   String,
    pub quantity:     i64,
    pub rating:       Option<f32>,
    pub is_blueprint: bool,
    pub is_engram:    bool,
    pub crafter:      Option<String>,
    pub is_cryopod:   bool,
    pub cryopod_creature: Option<CryopodCreature>,
}

/// The creature inside a cryopod. A projection of the embedded mini-save's
/// creature object, with the same level math as a live creature.
#[derive(Debug, Clone)]
pub struct CryopodCreature {
    pub species:   String,
    pub name:      Option<String>,
    pub level:     i32,
    pub is_female: bool,
    pub wild_points: StatPoints,
}

impl Item {
    pub fn from_object(object: &GameObject) -> Self {
        let props = object.properties.as_slice();
        let is_cryopod = object.class_name.contains("Cryopod")
            || object.class_name.contains("SoulTrap");

        let cryopod_creature = if is_cryopod {
            decode_cryopod(props, &object.class_name)
        } else {
            None
        };

        Self {
            class_name: object.class_name.clone(),
            quantity: props.find("ItemQuantity").and_then(Property::as_i64).unwrap_or(1),
            rating: props.find("ItemRating").and_then(Property::as_f32),
            is_blueprint: props.find("bIsBlueprint").and_then(Property::as_bool).unwrap_or(false),
            is_engram: props.find("bIsEngram").and_then(Property::as_bool).unwrap_or(false),
            crafter: props
                .find("CrafterCharacterName")
                .and_then(Property::as_str)
                .map(str::to_owned),
            is_cryopod,
            cryopod_creature,
        }
    }
}

/// Decode a cryopod's payload, if it has one. An empty or absent payload is
/// an empty pod, never an error; an undecodable payload is logged and also
/// yields no creature.
fn decode_cryopod(props: &[Property], class_name: &str) -> Option<CryopodCreature> {
    let payload = cryopod_payload(props)?;
    if payload.is_empty() {
        return None;
    }

    let embedded = match decode_embedded(&payload) {
        Ok(save) => save,
        Err(error) => {
            log::warn!("cryopod {class_name} payload did not decode: {error}");
            return None;
        }
    };

    let container = &embedded.container;
    let object = container.creatures().next()?;
    let creature = Creature::from_object(object, container.status_component(object));
    Some(CryopodCreature {
        species:     creature.species,
        name:        creature.name,
        level:       creature.level,
        is_female:   creature.is_female,
        wild_points: creature.wild_points,
    })
}

/// The embedded save bytes of a cryopod item.
///
/// Legacy items carry them in `CustomItemDatas[…].CustomDataBytes.
/// ByteArrays[0]`; modern items embed a `CryopodPayload` struct with the
/// same `ByteArrays` shape.
fn cryopod_payload(props: &[Property]) -> Option<Vec<u8>> {
    if let Some(entries) = props.find("CustomItemDatas").and_then(Property::as_array) {
        for entry in entries {
            let Some(fields) = entry.fields() else { continue };
            let Some(data_bytes) = fields.find_fields("CustomDataBytes") else { continue };
            if let Some(payload) = first_byte_array(data_bytes) {
                return Some(payload);
            }
        }
    }

    props
        .find_fields("CryopodPayload")
        .and_then(first_byte_array)
}

/// `ByteArrays` is an array of structs, each wrapping one `Bytes` array.
fn first_byte_array(fields: &[Property]) -> Option<Vec<u8>> {
    let arrays = fields.find("ByteArrays").and_then(Property::as_array)?;
    let first = arrays.first()?.fields()?;
    let values = first.find("Bytes").and_then(Property::as_array)?;

    Some(
        values
            .iter()
            .filter_map(|value| match value {
                PropertyValue::Byte(ByteValue::Raw(byte)) => Some(*byte),
                _ => None,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use obelisk_archive::GameObject;
    use obelisk_properties::writers::{put_fstring, put_i32, put_u32, InlineNames, PropertyWriter};
    use obelisk_properties::{Name, Property, PropertyTag, PropertyValue};
    use crate::stats::StatIndex;
    use super::Item;

    fn item_object(class: &str, properties: Vec<Property>) -> GameObject {
        GameObject::new(
            [0; 16],
            vec![Name::with_suffix(class, 1)],
            Vec::new(),
            true,
            None,
            properties,
            Vec::new(),
        )
    }

    /// A minimal embedded mini-save: one creature and its status component,
    /// in the inline-name bundle layout.
    fn embedded_rex(level_minus_one: i32) -> Vec<u8> {
        let mut names = InlineNames;

        let mut writer = PropertyWriter::new(&mut names);
        writer.string("TamedName", "Frozen Chompers");
        let creature_props = writer.into_bytes();

        let mut writer = PropertyWriter::new(&mut names);
        writer.int("BaseCharacterLevel", level_minus_one);
        writer.byte_raw("NumberOfLevelUpPointsApplied", 0, 22);
        let status_props = writer.into_bytes();

        let record = |names: &[&str], offset: u32| {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&[0; 16]);
            put_i32(&mut bytes, names.len() as i32);
            for name in names {
                put_fstring(&mut bytes, name);
            }
            put_u32(&mut bytes, 0); // is_item
            put_i32(&mut bytes, 0); // component names
            put_u32(&mut bytes, 0); // no location
            put_u32(&mut bytes, offset);
            put_u32(&mut bytes, 1); // should_be_loaded
            bytes
        };

        let mut bundle = Vec::new();
        put_i32(&mut bundle, 6); // version
        put_i32(&mut bundle, 2); // objects
        bundle.extend(record(&["Rex_Character_BP_C"], 0));
        bundle.extend(record(
            &["DinoCharacterStatusComponent_BP_C", "Rex_Character_BP_C"],
            creature_props.len() as u32,
        ));
        bundle.extend(creature_props);
        bundle.extend(status_props);
        bundle
    }

    fn cryopod_with_payload(payload: &[u8]) -> GameObject {
        let mut names = InlineNames;
        let mut writer = PropertyWriter::new(&mut names);
        writer.array_of_fields("CustomItemDatas", "CustomItemData", 1, |entry, _| {
            entry.struct_fields("CustomDataBytes", "CustomItemByteArrays", |data| {
                data.array_of_fields("ByteArrays", "CustomItemByteArrays", 1, |wrap, _| {
                    wrap.byte_array("Bytes", payload);
                });
            });
        });
        let bytes = writer.into_bytes();

        // Decode the fixture bytes back into property values.
        let mut ctx = obelisk_properties::DecodeContext::new(
            obelisk_properties::SaveFormat::Ase,
            obelisk_properties::NameStrategy::Inline,
        );
        let mut reader = obelisk_properties::SliceReader::new(&bytes);
        let properties = obelisk_properties::parse::read_property_list(&mut reader, &mut ctx)
            .expect("fixture properties decode");

        item_object("PrimalItem_WeaponEmptyCryopod_C", properties)
    }

    #[test]
    fn cryopod_contents_decode_recursively() {
        let pod = cryopod_with_payload(&embedded_rex(49));
        let item = Item::from_object(&pod);

        assert!(item.is_cryopod);
        let creature = item.cryopod_creature.expect("pod holds a creature");
        assert_eq!(creature.species, "Rex");
        assert_eq!(creature.level, 50, "1 + 49");
        assert_eq!(creature.name.as_deref(), Some("Frozen Chompers"));
        assert_eq!(creature.wild_points.get(StatIndex::Health), 22);
    }

    #[test]
    fn empty_cryopod_is_no_creature_not_an_error() {
        let pod = cryopod_with_payload(&[]);
        let item = Item::from_object(&pod);
        assert!(item.is_cryopod);
        assert!(item.cryopod_creature.is_none());
    }

    #[test]
    fn plain_items_read_their_fields() {
        let item = Item::from_object(&item_object(
            "PrimalItemResource_Metal_C",
            vec![
                Property {
                    name:  Name::new("ItemQuantity"),
                    tag:   PropertyTag::Int,
                    index: 0,
                    value: PropertyValue::Int(200),
                },
                Property {
                    name:  Name::new("bIsBlueprint"),
                    tag:   PropertyTag::Bool,
                    index: 0,
                    value: PropertyValue::Bool(true),
                },
            ],
        ));

        assert!(!item.is_cryopod);
        assert_eq!(item.quantity, 200);
        assert!(item.is_blueprint);
        assert_eq!(item.rating, None);
    }

    #[test]
    fn quantity_defaults_to_one() {
        let item = Item::from_object(&item_object("PrimalItemResource_Thatch_C", Vec::new()));
        assert_eq!(item.quantity, 1);
    }
}
