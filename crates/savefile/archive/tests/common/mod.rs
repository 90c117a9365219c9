//! Fixture builders shared by the integration tests.

use obelisk_properties::writers::{put_f32, put_fstring, put_i32, put_u32};


/// One object of a legacy bundle fixture, with its property block already
/// encoded (terminator included).
pub struct BundleObject {
    pub guid:           [u8; 16],
    pub names:          Vec<String>,
    pub is_item:        bool,
    pub location:       Option<[f32; 6]>,
    pub property_bytes: Vec<u8>,
}

impl BundleObject {
    pub fn new(names: &[&str], property_bytes: Vec<u8>) -> Self {
        Self {
            guid: [0; 16],
            names: names.iter().map(|n| (*n).to_owned()).collect(),
            is_item: false,
            location: None,
            property_bytes,
        }
    }
}

/// Assemble a bundle file: version, object count, object records, then the
/// property blocks the records point into.
pub fn build_bundle(version: i32, objects: &[BundleObject]) -> Vec<u8> {
    let mut bytes = Vec::new();
    put_i32(&mut bytes, version);
    put_i32(&mut bytes, objects.len() as i32);

    let mut offset = 0_u32;
    for object in objects {
        bytes.extend_from_slice(&object.guid);
        put_i32(&mut bytes, object.names.len() as i32);
        for name in &object.names {
            put_fstring(&mut bytes, name);
        }
        put_u32(&mut bytes, u32::from(object.is_item));
        put_i32(&mut bytes, 0); // component-class names
        match &object.location {
            Some(parts) => {
                put_u32(&mut bytes, 1);
                for part in parts {
                    put_f32(&mut bytes, *part);
                }
            }
            None => put_u32(&mut bytes, 0),
        }
        put_u32(&mut bytes, offset);
        put_u32(&mut bytes, 1); // should_be_loaded
        if version >= 10 {
            put_u32(&mut bytes, 0); // extra data
        }
        offset += object.property_bytes.len() as u32;
    }

    for object in objects {
        bytes.extend_from_slice(&object.property_bytes);
    }
    bytes
}
