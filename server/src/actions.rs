//! Player command resolution.
//!
//! [`handle_player_action`] is the single entry point. It gates each action
//! on the current phase, validates indices against the acting player's
//! state and writes exactly one combat-log line describing what happened.
//! Refused commands leave the battle untouched apart from that line.

use crate::error::ActionError;
use crate::progression::apply_healing;
use crate::progression::execute_evolution;
use log::{debug, warn};
use shared::{Action, BattleState, EffectType, Phase, QueuedAttack, ACTIVE_SLOTS};

/// Applies `action` from `player_id` to `state`.
///
/// Successful actions and refusals are both reported in the combat log; the
/// returned error only mirrors what was logged. Unrecognised item effects
/// are silent no-ops.
pub fn handle_player_action(
    state: &mut BattleState,
    player_id: &str,
    action: &Action,
) -> Result<(), ActionError> {
    if state.player(player_id).is_none() {
        warn!("[{}] action from unknown player {}", state.room_id, player_id);
        return Err(ActionError::UnknownPlayer);
    }

    let result = if is_allowed(state.phase, action) {
        dispatch(state, player_id, action)
    } else {
        Err(ActionError::WrongPhase {
            action: action.kind(),
            phase: state.phase,
        })
    };

    match result {
        Ok(Some(line)) => {
            state.log(line);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            debug!("[{}] {} {} refused: {}", state.room_id, player_id, action.kind(), err);
            state.log(format!("{} {} failed: {}", player_id, verb(action), err));
            Err(err)
        }
    }
}

fn is_allowed(phase: Phase, action: &Action) -> bool {
    match (phase, action) {
        (Phase::Supply, Action::Catch { .. }) => true,
        (Phase::Tactics, Action::Catch { .. }) => false,
        (Phase::Tactics, _) => true,
        _ => false,
    }
}

fn verb(action: &Action) -> &'static str {
    match action {
        Action::Catch { .. } => "capture",
        Action::Swap { .. } => "swap",
        Action::Item { .. } => "item use",
        Action::Evolve { .. } => "evolution",
        Action::Attack { .. } => "attack",
    }
}

fn dispatch(
    state: &mut BattleState,
    player_id: &str,
    action: &Action,
) -> Result<Option<String>, ActionError> {
    match action {
        Action::Catch {
            keep,
            replace_index,
        } => catch(state, player_id, *keep, *replace_index),
        Action::Swap {
            src_index,
            dst_index,
        } => swap(state, player_id, *src_index, *dst_index),
        Action::Item {
            item_index,
            target_index,
        } => use_item(state, player_id, *item_index, *target_index),
        Action::Evolve { target_index } => evolve(state, player_id, *target_index),
        Action::Attack {
            src_index,
            skill_id,
            target_index,
        } => enqueue_attack(state, player_id, *src_index, skill_id, *target_index),
    }
}

fn checked_index(
    field: &'static str,
    index: Option<usize>,
    len: usize,
) -> Result<usize, ActionError> {
    let index = index.ok_or(ActionError::MissingField { field })?;
    if index >= len {
        return Err(ActionError::IndexOutOfRange { field, index, len });
    }
    Ok(index)
}

/// Id a captured creature takes once it joins `player_id`'s roster.
pub fn captured_id(player_id: &str, turn: u32, slot: usize) -> String {
    format!("{player_id}_new_{turn}_{slot}")
}

fn catch(
    state: &mut BattleState,
    player_id: &str,
    keep: bool,
    replace_index: Option<usize>,
) -> Result<Option<String>, ActionError> {
    let turn = state.turn_count;
    let player = state
        .player_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;

    if keep && player.wild_encounter.is_some() {
        let len = player.roster.len();
        let index = checked_index("replace_index", replace_index, len)?;
        if index < ACTIVE_SLOTS {
            return Err(ActionError::ProtectedSlot {
                index,
                max: len.saturating_sub(1),
            });
        }

        if let Some(mut caught) = player.wild_encounter.take() {
            caught.id = captured_id(player_id, turn, index);
            let released = std::mem::replace(&mut player.roster[index], caught);
            player.sync_slots();
            player.is_ready = true;
            return Ok(Some(format!(
                "{} caught {}, replacing {}!",
                player_id, player.roster[index].name, released.name
            )));
        }
    }

    let passed_on = player
        .wild_encounter
        .take()
        .map(|creature| creature.name)
        .unwrap_or_else(|| "nothing".to_string());
    player.is_ready = true;
    Ok(Some(format!("{player_id} passed on {passed_on}.")))
}

fn swap(
    state: &mut BattleState,
    player_id: &str,
    src_index: Option<usize>,
    dst_index: Option<usize>,
) -> Result<Option<String>, ActionError> {
    let player = state
        .player_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    let len = player.roster.len();
    let src = checked_index("src_index", src_index, len)?;
    let dst = checked_index("dst_index", dst_index, len)?;

    player.roster.swap(src, dst);
    player.sync_slots();
    Ok(Some(format!(
        "{} swapped {} with {}",
        player_id, player.roster[dst].name, player.roster[src].name
    )))
}

fn use_item(
    state: &mut BattleState,
    player_id: &str,
    item_index: Option<usize>,
    target_index: Option<usize>,
) -> Result<Option<String>, ActionError> {
    let player = state
        .player_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    let item_index = checked_index("item_index", item_index, player.items.len())?;
    let target_index = checked_index("target_index", target_index, player.roster.len())?;

    let item = &player.items[item_index];
    if item.effect_type != EffectType::Heal {
        debug!("{} used {} which has no effect yet", player_id, item.name);
        return Ok(None);
    }

    let item = player.items.remove(item_index);
    let target = &mut player.roster[target_index];
    let outcome = apply_healing(target, item.value);

    let mut line = format!(
        "{} used {} on {}: +{} HP",
        player_id, item.name, target.name, outcome.heal
    );
    if outcome.overheal > 0 {
        line.push_str(&format!(" ({} overheal banked)", outcome.overheal));
    }
    if outcome.can_evolve {
        line.push_str(&format!(". {} can evolve!", target.name));
    }
    Ok(Some(line))
}

fn evolve(
    state: &mut BattleState,
    player_id: &str,
    target_index: Option<usize>,
) -> Result<Option<String>, ActionError> {
    let player = state
        .player_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    let index = checked_index("target_index", target_index, player.roster.len())?;
    let target = &mut player.roster[index];

    if !execute_evolution(target) {
        return Err(ActionError::NotEnoughProgress {
            progress: target.evolution_progress,
            threshold: target.evolution_threshold,
        });
    }
    Ok(Some(format!("{} evolved {}!", player_id, target.name)))
}

fn enqueue_attack(
    state: &mut BattleState,
    player_id: &str,
    src_index: usize,
    skill_id: &str,
    target_index: usize,
) -> Result<Option<String>, ActionError> {
    let player = state
        .player_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    let src_index = checked_index("src_index", Some(src_index), player.roster.len())?;
    player.is_ready = true;

    let record = QueuedAttack {
        player_id: player_id.to_string(),
        src_index,
        skill_id: skill_id.to_string(),
        target_index,
    };
    state
        .actions_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?
        .push(record);

    Ok(Some(format!("{player_id} locked in attack!")))
}
