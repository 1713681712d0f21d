//! Text rendering of battle snapshots

use shared::{BattleState, Creature, PlayerState, ACTIVE_SLOTS};
use std::fmt::Write;

/// Newest combat log lines shown under each snapshot.
pub const LOG_TAIL: usize = 6;

fn creature_line(out: &mut String, creature: &Creature) {
    let marker = if creature.slot_index >= 0 && (creature.slot_index as usize) < ACTIVE_SLOTS {
        '*'
    } else {
        ' '
    };
    let _ = write!(
        out,
        "   {}[{}] {} {}/{} evo {}/{}",
        marker,
        creature.slot_index,
        creature.name,
        creature.hp,
        creature.max_hp,
        creature.evolution_progress,
        creature.evolution_threshold
    );
    if creature.overheal > 0 {
        let _ = write!(out, " (+{} banked)", creature.overheal);
    }
    if creature.is_fainted() {
        out.push_str(" fainted");
    } else if creature.can_evolve() {
        out.push_str(" READY TO EVOLVE");
    }
    out.push('\n');
}

fn roster(out: &mut String, label: &str, player: &PlayerState) {
    let ready = if player.is_ready { " (ready)" } else { "" };
    let _ = writeln!(out, " {} {}{}", label, player.player_id, ready);
    for creature in &player.roster {
        creature_line(out, creature);
    }
}

/// Renders `state` from the point of view of `viewer`.
pub fn render_state(state: &BattleState, viewer: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== Room {} | Turn {} | {} ==",
        state.room_id, state.turn_count, state.phase
    );

    let (me, them) = if state.player2.player_id == viewer {
        (&state.player2, &state.player1)
    } else {
        (&state.player1, &state.player2)
    };

    roster(&mut out, "You:", me);
    roster(&mut out, "Opponent:", them);

    if me.items.is_empty() {
        out.push_str(" Items: none\n");
    } else {
        let names: Vec<String> = me
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("[{}] {}", i, item.name))
            .collect();
        let _ = writeln!(out, " Items: {}", names.join(", "));
    }

    if let Some(wild) = &me.wild_encounter {
        let _ = writeln!(out, " Wild encounter: {} {}/{}", wild.name, wild.hp, wild.max_hp);
    }

    let queued = if me.player_id == state.player1.player_id {
        &state.p1_actions
    } else {
        &state.p2_actions
    };
    for attack in queued {
        let _ = writeln!(
            out,
            " Queued: {} from [{}] at [{}]",
            attack.skill_id, attack.src_index, attack.target_index
        );
    }

    if let Some(winner) = &state.winner {
        let outcome = if winner == viewer { "You win!" } else { "You lose." };
        let _ = writeln!(out, " Winner: {} {}", winner, outcome);
    }

    let start = state.combat_log.len().saturating_sub(LOG_TAIL);
    for line in &state.combat_log[start..] {
        let _ = writeln!(out, " > {}", line);
    }

    out
}
