//! End-to-end decoding of legacy bundle files (profiles, tribes, cloud
//! inventories) assembled byte-by-byte.

mod common;

use obelisk_properties::writers::{put_fstring, InlineNames, PropertyWriter};
use obelisk_properties::{Property, PropertySlice as _};
use obelisk_archive::{load_save_bytes, FileKind, LoadOptions};
use common::{build_bundle, BundleObject};


fn inline_props(build: impl FnOnce(&mut PropertyWriter<'_, InlineNames>)) -> Vec<u8> {
    let mut names = InlineNames;
    let mut writer = PropertyWriter::new(&mut names);
    build(&mut writer);
    writer.into_bytes()
}

#[test]
fn empty_profile_decodes_with_defaults() {
    let props = inline_props(|w| {
        w.string("PlayerName", "Alice");
        w.uint64("PlayerDataID", 42);
        w.int("TribeID", 1);
        w.array_str("PlayerState_EngramBlueprints", &[]);
    });
    let bundle = build_bundle(6, &[BundleObject::new(&["PrimalPlayerData_C"], props)]);

    let save = load_save_bytes(&bundle, &LoadOptions::default()).expect("profile decodes");
    assert_eq!(save.header.kind, FileKind::Profile);
    assert_eq!(save.header.version, 6);
    assert_eq!(save.parse_error_count(), 0);
    assert_eq!(save.container.len(), 1);

    let object = &save.container.objects()[0];
    assert_eq!(object.class_name, "PrimalPlayerData_C");
    assert_eq!(object.properties.find("PlayerName").and_then(Property::as_str), Some("Alice"));
    assert_eq!(object.properties.find("PlayerDataID").and_then(Property::as_i64), Some(42));
    let engrams = object
        .properties
        .find("PlayerState_EngramBlueprints")
        .and_then(Property::as_array)
        .expect("engram array present");
    assert!(engrams.is_empty());
}

#[test]
fn tribe_bundle_is_detected_and_members_survive() {
    let props = inline_props(|w| {
        w.struct_fields("TribeData", "TribeData", |t| {
            t.string("TribeName", "The Swamp People");
            t.int("TribeID", 1_337_000);
            t.array_str("MembersPlayerName", &["Ada", "Brin", "Cyx"]);
            t.array_u32("MembersPlayerDataID", &[1, 2, 3]);
            t.array_str("TribeLog", &[
                "Day 1, 12:00:00: Tamed a Rex",
                "Day 2, 03:14:15: <RichColor Color='1,0,0,1'>Lost</>",
            ]);
        });
    });
    let bundle = build_bundle(1, &[BundleObject::new(&["PrimalTribeData_C"], props)]);

    let save = load_save_bytes(&bundle, &LoadOptions::default()).expect("tribe decodes");
    assert_eq!(save.header.kind, FileKind::Tribe);
    assert_eq!(save.parse_error_count(), 0);

    let object = &save.container.objects()[0];
    let tribe_data = object.properties.find_fields("TribeData").expect("nested tribe data");
    let members = tribe_data
        .find("MembersPlayerName")
        .and_then(Property::as_array)
        .expect("member names");
    assert_eq!(members.len(), 3);
}

#[test]
fn malformed_property_is_recovered_and_the_rest_of_the_object_survives() {
    let mut names = InlineNames;
    let mut writer = PropertyWriter::new(&mut names);
    // Declares 16 value bytes, but the string inside wants 20.
    let mut value = Vec::new();
    put_fstring(&mut value, "fifteen-chars..");
    writer.raw_property("Corrupted", "StrProperty", 16, 0, &[], &value[.. 16]);
    writer.int("TribeID", 7);
    let props = writer.into_bytes();

    let bundle = build_bundle(6, &[BundleObject::new(&["PrimalPlayerData_C"], props)]);
    let save = load_save_bytes(&bundle, &LoadOptions::default()).expect("object still yields");

    assert_eq!(save.parse_error_count(), 1, "exactly one recovered error");
    let object = &save.container.objects()[0];
    assert!(object.properties.find("Corrupted").is_none());
    assert_eq!(object.properties.find("TribeID").and_then(Property::as_i64), Some(7));
}

#[test]
fn object_cap_bounds_work() {
    let props = inline_props(|w| w.int("TribeID", 1));
    let bundle = build_bundle(
        6,
        &[
            BundleObject::new(&["PrimalPlayerData_C"], props.clone()),
            BundleObject::new(&["PrimalPlayerData_C"], props),
        ],
    );

    let opts = LoadOptions {
        max_objects: Some(1),
        ..LoadOptions::default()
    };
    let err = load_save_bytes(&bundle, &opts).expect_err("two objects exceed the cap of one");
    assert!(err.to_string().contains("cap"), "error names the cap: {err}");
}

#[test]
fn unknown_kind_without_best_effort_is_refused() {
    // Version 77 with no recognizable marker string.
    let mut bytes = 77_i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0xEE; 32]);

    assert!(load_save_bytes(&bytes, &LoadOptions::default()).is_err());
}
