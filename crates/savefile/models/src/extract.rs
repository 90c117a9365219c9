use obelisk_archive::LoadedSave;

use crate::creature::Creature;
use crate::player::Player;
use crate::structure::Structure;
use crate::tribe::Tribe;


/// Every model extracted from one save, split the way consumers ask for
/// them. Order within each list follows container order, so extraction is
/// deterministic for a given save.
#[derive(Debug, Default)]
pub struct WorldModels {
    pub tamed:      Vec<Creature>,
    pub wild:       Vec<Creature>,
    pub players:    Vec<Player>,
    pub tribes:     Vec<Tribe>,
    pub structures: Vec<Structure>,
}

/// Project the full model set out of a loaded save.
///
/// A pure function of the save: no container back-references survive into
/// the result, and running it twice yields equal output.
pub fn extract_all(save: &LoadedSave) -> WorldModels {
    let container = &save.container;
    let mut models = WorldModels::default();

    for object in container.creatures() {
        let creature = Creature::from_object(object, container.status_component(object));
        if creature.tamed {
            models.tamed.push(creature);
        } else {
            models.wild.push(creature);
        }
    }

    models.players = container
        .iter()
        .filter(|o| o.class_name.contains("PrimalPlayerData"))
        .map(Player::from_object)
        .collect();

    models.tribes = container
        .iter()
        .filter(|o| o.class_name.contains("PrimalTribeData"))
        .filter_map(|o| match Tribe::from_object(o) {
            Ok(tribe) => Some(tribe),
            Err(error) => {
                log::warn!("skipped a tribe object that did not project: {error}");
                None
            }
        })
        .collect();

    models.structures = container
        .structures()
        .map(|o| Structure::from_object(o, container, save.header.game_time))
        .collect();

    models
}
