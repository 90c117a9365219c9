use serde_json::{json, Value};

use obelisk_archive::SaveHeader;
use obelisk_models::{Creature, Player, StatIndex, Structure, Tribe, WorldModels};

use crate::gps::MapSpec;


/// Emit the ASV-compatible export dictionary.
///
/// Pure and order-stable: entries follow model order (which follows
/// container order), so exporting the same loaded save twice produces
/// byte-identical JSON.
pub fn export_all(
    models: &WorldModels,
    header: &SaveHeader,
    map:    Option<&MapSpec>,
) -> Value {
    let tamed: Vec<Value> = models.tamed.iter().map(|c| creature_entry(c, map)).collect();
    let wild: Vec<Value> = models.wild.iter().map(|c| creature_entry(c, map)).collect();
    let players: Vec<Value> = models.players.iter().map(player_entry).collect();
    let tribes: Vec<Value> = models.tribes.iter().map(tribe_entry).collect();
    let structures: Vec<Value> =
        models.structures.iter().map(|s| structure_entry(s, map)).collect();
    let logs: Vec<Value> = models
        .tribes
        .iter()
        .flat_map(|tribe| {
            tribe.logs.iter().map(|entry| {
                json!({
                    "tribeid":  tribe.tribe_id,
                    "tribe":    tribe.tribe_name,
                    "day":      entry.day,
                    "time":     entry.time,
                    "text":     entry.clean_message,
                })
            })
        })
        .collect();

    json!({
        "ASV_Summary": {
            "version":    header.version,
            "gameTime":   header.game_time,
            "map":        map.map(|m| m.name),
            "tamed":      tamed.len(),
            "wild":       wild.len(),
            "players":    players.len(),
            "tribes":     tribes.len(),
            "structures": structures.len(),
        },
        "ASV_Tamed":      tamed,
        "ASV_Wild":       wild,
        "ASV_Players":    players,
        "ASV_Tribes":     tribes,
        "ASV_Structures": structures,
        "ASV_TribeLogs":  logs,
    })
}

fn gps_fields(location: Option<(f64, f64)>, map: Option<&MapSpec>) -> (Value, Value) {
    match (location, map) {
        (Some((x, y)), Some(spec)) => {
            let (lat, lon) = spec.to_gps(x, y);
            (json!(lat), json!(lon))
        }
        _ => (Value::Null, Value::Null),
    }
}

fn stat_map(points: obelisk_models::StatPoints) -> Value {
    let mut object = serde_json::Map::new();
    for stat in StatIndex::ALL {
        object.insert(stat.label().to_owned(), json!(points.get(stat)));
    }
    Value::Object(object)
}

fn creature_entry(creature: &Creature, map: Option<&MapSpec>) -> Value {
    let world = creature.location.map(|l| (l.x, l.y));
    let (lat, lon) = gps_fields(world, map);

    json!({
        "species":  creature.species,
        "class":    creature.class_name,
        "name":     creature.name,
        // 64-bit ids do not survive JSON number parsing in every consumer.
        "dinoId":   creature.dino_id.to_string(),
        "level":    creature.level,
        "baseLevel": creature.base_level,
        "isFemale": creature.is_female,
        "tamed":    creature.tamed,
        "tamer":    creature.tamer,
        "imprinter": creature.imprinter,
        "imprint":  creature.imprint,
        "mutations": creature.mutations,
        "tribeId":  creature.tribe_id,
        "colors":   creature.colors.to_vec(),
        "wildLevels":  stat_map(creature.wild_points),
        "tamedLevels": stat_map(creature.tamed_points),
        "x": world.map(|(x, _)| x),
        "y": world.map(|(_, y)| y),
        "z": creature.location.map(|l| l.z),
        "lat": lat,
        "lon": lon,
    })
}

fn player_entry(player: &Player) -> Value {
    json!({
        "playerId":      player.player_id.to_string(),
        "name":          player.player_name,
        "characterName": player.character_name,
        "steamId":       player.unique_net_id,
        "tribeId":       player.tribe_id,
        "level":         player.level,
        "stats":         stat_map(player.stat_points),
        "engrams":       player.engram_blueprints,
    })
}

fn tribe_entry(tribe: &Tribe) -> Value {
    json!({
        "tribeId":     tribe.tribe_id,
        "name":        tribe.tribe_name,
        "ownerId":     tribe.owner_player_id,
        "memberCount": tribe.member_count(),
        "members":     tribe.member_names,
        "memberIds":   tribe.member_ids,
        "admins":      tribe.admin_ids,
        "logCount":    tribe.logs.len(),
    })
}

fn structure_entry(structure: &Structure, map: Option<&MapSpec>) -> Value {
    let world = structure.location.map(|l| (l.x, l.y));
    let (lat, lon) = gps_fields(world, map);

    json!({
        "class":        structure.class_name,
        "tribeId":      structure.tribe_id,
        "owner":        structure.owner_name,
        "boxName":      structure.box_name,
        "health":       structure.health,
        "maxHealth":    structure.max_health,
        "decayElapsed": structure.decay_elapsed,
        "hasInventory": structure.has_inventory,
        "lat": lat,
        "lon": lon,
    })
}
