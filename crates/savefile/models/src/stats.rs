use bijective_enum_map::injective_enum_map;

use obelisk_properties::{Property, PropertySlice as _};


/// How many stats every status component carries.
pub const STAT_COUNT: usize = 12;

/// The fixed stat ordering used throughout the save format. Stat arrays are
/// serialized as repeated properties whose `index` field is this ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatIndex {
    Health,
    Stamina,
    Torpidity,
    Oxygen,
    Food,
    Water,
    Temperature,
    Weight,
    Melee,
    Speed,
    Fortitude,
    Crafting,
}

injective_enum_map! {
    StatIndex, u8, usize,
    Health      <=> 0,
    Stamina     <=> 1,
    Torpidity   <=> 2,
    Oxygen      <=> 3,
    Food        <=> 4,
    Water       <=> 5,
    Temperature <=> 6,
    Weight      <=> 7,
    Melee       <=> 8,
    Speed       <=> 9,
    Fortitude   <=> 10,
    Crafting    <=> 11,
}

impl StatIndex {
    pub const ALL: [Self; STAT_COUNT] = [
        Self::Health,
        Self::Stamina,
        Self::Torpidity,
        Self::Oxygen,
        Self::Food,
        Self::Water,
        Self::Temperature,
        Self::Weight,
        Self::Melee,
        Self::Speed,
        Self::Fortitude,
        Self::Crafting,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Health      => "Health",
            Self::Stamina     => "Stamina",
            Self::Torpidity   => "Torpidity",
            Self::Oxygen      => "Oxygen",
            Self::Food        => "Food",
            Self::Water       => "Water",
            Self::Temperature => "Temperature",
            Self::Weight      => "Weight",
            Self::Melee       => "Melee",
            Self::Speed       => "Speed",
            Self::Fortitude   => "Fortitude",
            Self::Crafting    => "Crafting",
        }
    }
}

/// Level-up points per stat, in [`StatIndex`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatPoints(pub [u32; STAT_COUNT]);

impl StatPoints {
    /// Collect a stat array out of a property list: for each stat ordinal,
    /// the sum of every same-named property at that `index`.
    pub fn gather(properties: &[Property], name: &str) -> Self {
        let mut points = [0_u32; STAT_COUNT];
        for (ordinal, slot) in points.iter_mut().enumerate() {
            let sum = properties.sum_by_index(name, ordinal as u32);
            *slot = u32::try_from(sum).unwrap_or(0);
        }
        Self(points)
    }

    pub fn get(self, stat: StatIndex) -> u32 {
        self.0[usize::from(u8::from(stat))]
    }

    pub fn total(self) -> u32 {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use obelisk_properties::{ByteValue, Name, Property, PropertyTag, PropertyValue};
    use super::{StatIndex, StatPoints, STAT_COUNT};

    fn point_prop(index: u32, value: u8) -> Property {
        Property {
            name:  Name::new("NumberOfLevelUpPointsApplied"),
            tag:   PropertyTag::Byte,
            index,
            value: PropertyValue::Byte(ByteValue::Raw(value)),
        }
    }

    #[test]
    fn ordinals_round_trip() {
        assert_eq!(usize::from(u8::from(StatIndex::Health)), 0);
        assert_eq!(usize::from(u8::from(StatIndex::Crafting)), STAT_COUNT - 1);
        assert_eq!(StatIndex::try_from(8_usize), Ok(StatIndex::Melee));
        assert!(StatIndex::try_from(12_usize).is_err());
    }

    #[test]
    fn gather_places_points_by_ordinal() {
        let props = vec![point_prop(0, 40), point_prop(7, 12), point_prop(8, 33)];
        let points = StatPoints::gather(&props, "NumberOfLevelUpPointsApplied");

        assert_eq!(points.get(StatIndex::Health), 40);
        assert_eq!(points.get(StatIndex::Weight), 12);
        assert_eq!(points.get(StatIndex::Melee), 33);
        assert_eq!(points.get(StatIndex::Stamina), 0);
        assert_eq!(points.total(), 85);
    }

    #[test]
    fn gather_sums_repeated_entries() {
        let props = vec![point_prop(4, 3), point_prop(4, 5)];
        let points = StatPoints::gather(&props, "NumberOfLevelUpPointsApplied");
        assert_eq!(points.get(StatIndex::Food), 8);
    }
}
