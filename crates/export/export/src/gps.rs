/// One map's affine world-to-GPS transform: GPS = (world − origin) / scale.
///
/// `scale` is the world extent of one GPS degree, so a map spanning 800 km
/// across 100 degrees has a scale of 8 000.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSpec {
    pub name:     &'static str,
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale:    f64,
}

impl MapSpec {
    pub const fn new(name: &'static str, origin_x: f64, origin_y: f64, scale: f64) -> Self {
        Self {
            name,
            origin_x,
            origin_y,
            scale,
        }
    }

    /// World position to `(lat, lon)`. Latitude follows the y axis.
    pub fn to_gps(&self, x: f64, y: f64) -> (f64, f64) {
        ((y - self.origin_y) / self.scale, (x - self.origin_x) / self.scale)
    }

    /// Look a shipped map up by its level name, case-insensitively.
    pub fn for_map(name: &str) -> Option<&'static Self> {
        BUILTIN_MAPS
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
    }
}

/// Transforms for the shipped maps.
pub const BUILTIN_MAPS: &[MapSpec] = &[
    MapSpec::new("TheIsland",       -400_000.0, -400_000.0,  8_000.0),
    MapSpec::new("TheIsland_WP",    -400_000.0, -400_000.0,  8_000.0),
    MapSpec::new("TheCenter",       -524_000.0, -524_000.0, 10_480.0),
    MapSpec::new("ScorchedEarth_P", -400_000.0, -400_000.0,  8_000.0),
    MapSpec::new("Aberration_P",    -400_000.0, -400_000.0,  8_000.0),
    MapSpec::new("Extinction",      -400_000.0, -400_000.0,  8_000.0),
    MapSpec::new("Ragnarok",        -655_000.0, -655_000.0, 13_100.0),
    MapSpec::new("Valguero_P",      -408_000.0, -408_000.0,  8_160.0),
    MapSpec::new("CrystalIsles",    -800_000.0, -800_000.0, 16_000.0),
    MapSpec::new("Genesis",         -525_000.0, -525_000.0, 10_500.0),
    MapSpec::new("Gen2",            -737_500.0, -737_500.0, 14_750.0),
    MapSpec::new("LostIsland",      -655_000.0, -655_000.0, 13_100.0),
    MapSpec::new("Fjordur",         -675_000.0, -675_000.0, 13_500.0),
];

#[cfg(test)]
mod tests {
    use super::MapSpec;

    #[test]
    fn world_origin_maps_to_fifty_fifty() {
        let island = MapSpec::new("TheIsland", -400_000.0, -400_000.0, 800_000.0 / 100.0);
        let (lat, lon) = island.to_gps(0.0, 0.0);
        assert_eq!(lat, 50.0);
        assert_eq!(lon, 50.0);
    }

    #[test]
    fn corners_map_to_the_gps_extremes() {
        let island = MapSpec::for_map("theisland").expect("lookup ignores case");
        assert_eq!(island.to_gps(-400_000.0, -400_000.0), (0.0, 0.0));
        assert_eq!(island.to_gps(400_000.0, 400_000.0), (100.0, 100.0));
    }

    #[test]
    fn latitude_follows_y() {
        let island = MapSpec::for_map("TheIsland").expect("shipped map");
        let (lat, lon) = island.to_gps(0.0, -80_000.0);
        assert_eq!(lat, 40.0);
        assert_eq!(lon, 50.0);
    }

    #[test]
    fn unknown_maps_have_no_spec() {
        assert!(MapSpec::for_map("ModdedMap_P").is_none());
    }
}
