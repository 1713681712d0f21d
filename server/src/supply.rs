//! Per-turn supply: item grants and wild encounters.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{BattleState, Creature, Item, PlayerState};

pub const SPECIES_POOL: [&str; 5] = ["charmander", "squirtle", "bulbasaur", "pikachu", "eevee"];

/// Items every player is handed on each SUPPLY entry.
pub fn supply_items() -> [Item; 2] {
    [Item::potion(), Item::super_potion()]
}

/// Id of the wild creature offered to `player_id` on `turn`.
pub fn wild_encounter_id(turn: u32, player_id: &str) -> String {
    format!("wild_{turn}_{player_id}")
}

/// Runs the supply step for both players.
pub fn process_supply_phase<R: Rng + ?Sized>(state: &mut BattleState, rng: &mut R) {
    state.log("--- Supply Phase: wild creatures appeared! ---");

    let turn = state.turn_count;
    let mut announcements = Vec::with_capacity(2);
    for player in [&mut state.player1, &mut state.player2] {
        let wild = supply_player(player, turn, rng);
        announcements.push(format!("A wild {} appeared for {}!", wild, player.player_id));
    }

    for line in announcements {
        state.log(line);
    }
}

fn supply_player<R: Rng + ?Sized>(player: &mut PlayerState, turn: u32, rng: &mut R) -> String {
    for item in supply_items() {
        if !player.grant_item(item) {
            debug!("{} bag is full, dropping supply item", player.player_id);
        }
    }

    let species = SPECIES_POOL.choose(rng).copied().unwrap_or(SPECIES_POOL[0]);
    let wild = Creature::new(wild_encounter_id(turn, &player.player_id), species);
    let name = wild.name.clone();
    player.wild_encounter = Some(wild);
    name
}
