use obelisk_archive::{GameObject, LocationData, ObjectContainer};
use obelisk_properties::{Property, PropertySlice as _};

use crate::stats::StatPoints;


/// A creature's recorded parents. IDs compose the same way as
/// [`Creature::dino_id`] and link to other creatures by equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ancestry {
    pub female_name: Option<String>,
    pub female_id:   Option<u64>,
    pub male_name:   Option<String>,
    pub male_id:     Option<u64>,
}

/// A creature projected out of its character object and (when linked) its
/// status component.
#[derive(Debug, Clone)]
pub struct Creature {
    pub class_name: String,
    /// The class name up to its `_Character` segment: `Rex_Character_BP_C`
    /// is a `Rex`.
    pub species: String,
    pub name:    Option<String>,
    /// The two 32-bit dino id halves composed into one stable identity.
    pub dino_id:   u64,
    pub is_female: bool,
    pub tamed:     bool,
    pub tamer:     Option<String>,
    pub imprinter: Option<String>,
    pub tribe_id:  Option<i32>,
    /// Levels gained in the wild, before the +1 every creature starts with.
    pub base_level:  i32,
    /// Levels gained after taming; only contributes to a tamed total.
    pub extra_level: i32,
    pub level:       i32,
    pub wild_points:  StatPoints,
    pub tamed_points: StatPoints,
    /// Imprinting quality, clamped into `[0, 1]`.
    pub imprint:   f32,
    pub mutations: i64,
    /// Color region indices, region 0 through 5.
    pub colors:   [u8; 6],
    pub location: Option<LocationData>,
    pub ancestry: Option<Ancestry>,
}

impl Creature {
    /// Project a creature from its character object plus the status
    /// component the relationship pass linked (if any).
    pub fn from_object(object: &GameObject, status: Option<&GameObject>) -> Self {
        let props = object.properties.as_slice();
        let status_props = status.map(|s| s.properties.as_slice()).unwrap_or(&[]);

        let tamer = status_props
            .find("TamerString")
            .and_then(Property::as_str)
            .map(str::to_owned);
        let tamed = tamer.is_some();

        let base_level = status_props
            .find("BaseCharacterLevel")
            .and_then(Property::as_i32)
            .unwrap_or(0);
        let extra_level = status_props
            .find("ExtraCharacterLevel")
            .and_then(Property::as_i32)
            .unwrap_or(0);
        let level = 1 + base_level + if tamed { extra_level } else { 0 };

        let mut colors = [0_u8; 6];
        for (region, slot) in colors.iter_mut().enumerate() {
            if let Some(value) = props
                .find_indexed("ColorSetIndices", region as u32)
                .and_then(Property::as_i64)
            {
                *slot = u8::try_from(value).unwrap_or(0);
            }
        }

        let mutations = int_from_either(props, status_props, "RandomMutationsFemale")
            + int_from_either(props, status_props, "RandomMutationsMale");

        let imprint = status_props
            .find("DinoImprintingQuality")
            .and_then(Property::as_f32)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        Self {
            class_name: object.class_name.clone(),
            species: species_of(&object.class_name),
            name: props.find("TamedName").and_then(Property::as_str).map(str::to_owned),
            dino_id: compose_dino_id(
                props.find("DinoID1").and_then(Property::as_u32).unwrap_or(0),
                props.find("DinoID2").and_then(Property::as_u32).unwrap_or(0),
            ),
            is_female: props.find("bIsFemale").and_then(Property::as_bool).unwrap_or(false),
            tamed,
            tamer,
            imprinter: props
                .find("ImprinterName")
                .and_then(Property::as_str)
                .map(str::to_owned),
            tribe_id: props.find("TargetingTeam").and_then(Property::as_i32),
            base_level,
            extra_level,
            level,
            wild_points: StatPoints::gather(status_props, "NumberOfLevelUpPointsApplied"),
            tamed_points: StatPoints::gather(status_props, "NumberOfLevelUpPointsAppliedTamed"),
            imprint,
            mutations,
            colors,
            location: object.location,
            ancestry: read_ancestry(props),
        }
    }

    /// Every creature in a container, each paired with its status component.
    pub fn all_in(container: &ObjectContainer) -> Vec<Self> {
        container
            .creatures()
            .map(|object| Self::from_object(object, container.status_component(object)))
            .collect()
    }
}

/// Find the creature a recorded ancestor id points at.
pub fn find_parent(creatures: &[Creature], ancestor_id: u64) -> Option<&Creature> {
    creatures.iter().find(|c| c.dino_id == ancestor_id)
}

pub(crate) fn compose_dino_id(id1: u32, id2: u32) -> u64 {
    u64::from(id1) << 32 | u64::from(id2)
}

fn species_of(class_name: &str) -> String {
    class_name
        .split("_Character")
        .next()
        .unwrap_or(class_name)
        .to_owned()
}

fn int_from_either(first: &[Property], second: &[Property], name: &str) -> i64 {
    first
        .find(name)
        .or_else(|| second.find(name))
        .and_then(Property::as_i64)
        .unwrap_or(0)
}

/// The last ancestry entry holds the immediate parents; earlier entries are
/// grandparents and beyond.
fn read_ancestry(props: &[Property]) -> Option<Ancestry> {
    let entries = props.find("DinoAncestors").and_then(Property::as_array)?;
    let fields = entries.last()?.fields()?;

    let parent = |name_key: &str, id1_key: &str, id2_key: &str| {
        let name = fields.find(name_key).and_then(Property::as_str).map(str::to_owned);
        let id1 = fields.find(id1_key).and_then(Property::as_u32);
        let id2 = fields.find(id2_key).and_then(Property::as_u32);
        let id = match (id1, id2) {
            (Some(id1), Some(id2)) => Some(compose_dino_id(id1, id2)),
            _ => None,
        };
        (name, id)
    };

    let (female_name, female_id) = parent("FemaleName", "FemaleDinoID1", "FemaleDinoID2");
    let (male_name, male_id) = parent("MaleName", "MaleDinoID1", "MaleDinoID2");

    Some(Ancestry {
        female_name,
        female_id,
        male_name,
        male_id,
    })
}
