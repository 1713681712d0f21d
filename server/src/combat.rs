//! Combat resolution.
//!
//! Both players' queued attacks are drained in one pass at COMBAT entry, so
//! neither side can react to the other's choices. Records resolve in
//! insertion order, host queue first.

use log::debug;
use shared::{BattleState, QueuedAttack};

/// Flat damage dealt by every attack.
pub const ATTACK_DAMAGE: u32 = 10;

/// Resolves every queued attack, then empties both queues.
pub fn resolve_combat_phase(state: &mut BattleState) {
    state.log(format!("--- Turn {} Combat Resolution ---", state.turn_count));

    let mut queued = std::mem::take(&mut state.p1_actions);
    queued.append(&mut state.p2_actions);
    debug!("[{}] resolving {} attacks", state.room_id, queued.len());

    for attack in &queued {
        resolve_attack(state, attack);
    }
}

fn resolve_attack(state: &mut BattleState, attack: &QueuedAttack) {
    match strike(state, attack) {
        Some(hit) => {
            state.log(format!(
                "{} used {} on {}! (-{} HP)",
                hit.attacker, attack.skill_id, hit.target, ATTACK_DAMAGE
            ));
            if hit.fainted {
                state.log(format!("{} fainted!", hit.target));
            }
        }
        None => state.log(format!("{}'s attack missed (Invalid Target)!", attack.player_id)),
    }
}

struct Hit {
    attacker: String,
    target: String,
    fainted: bool,
}

fn strike(state: &mut BattleState, attack: &QueuedAttack) -> Option<Hit> {
    let attacker = state
        .player(&attack.player_id)?
        .roster
        .get(attack.src_index)?
        .name
        .clone();
    let target = state
        .opponent_mut(&attack.player_id)?
        .roster
        .get_mut(attack.target_index)?;

    target.hp = target.hp.saturating_sub(ATTACK_DAMAGE);
    Some(Hit {
        attacker,
        target: target.name.clone(),
        fainted: target.is_fainted(),
    })
}
