//! Battle setup and the phase state machine.
//!
//! Phases cycle `SETUP -> SUPPLY -> TACTICS -> COMBAT -> SUPPLY -> ...`
//! until a combat pass leaves a player with no standing creatures, which
//! ends the battle in `FINISHED`.

use crate::combat::resolve_combat_phase;
use crate::supply::process_supply_phase;
use clap::ValueEnum;
use log::info;
use rand::Rng;
use shared::{
    BattleState, Creature, Phase, PlayerState, GUEST_PLAYER_ID, HOST_PLAYER_ID, ROSTER_SIZE,
};

/// Which players must be ready before a phase can advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReadinessPolicy {
    /// Only the host gates the phase. Handy for single-player testing.
    #[value(name = "host")]
    HostOnly,
    #[default]
    #[value(name = "all")]
    AllPlayers,
}

impl ReadinessPolicy {
    pub fn is_satisfied(self, state: &BattleState) -> bool {
        match self {
            ReadinessPolicy::HostOnly => state.player1.is_ready,
            ReadinessPolicy::AllPlayers => state.player1.is_ready && state.player2.is_ready,
        }
    }
}

/// Creates the battle for `room_id` with both starting rosters.
pub fn initialize_battle(room_id: &str) -> BattleState {
    let player1 = starting_player(HOST_PLAYER_ID, "pikachu");
    let player2 = starting_player(GUEST_PLAYER_ID, "bulbasaur");
    BattleState::new(room_id, player1, player2)
}

fn starting_player(player_id: &str, species: &str) -> PlayerState {
    let mut player = PlayerState::new(player_id);
    player.roster = (0..ROSTER_SIZE)
        .map(|i| Creature::new(format!("{player_id}_poke_{i}"), species))
        .collect();
    player.sync_slots();
    player
}

/// Marks `player_id` ready. Returns false for players not in this battle.
pub fn mark_ready(state: &mut BattleState, player_id: &str) -> bool {
    match state.player_mut(player_id) {
        Some(player) => {
            player.is_ready = true;
            true
        }
        None => false,
    }
}

/// Advances one phase if `policy` is satisfied, running the entry step of
/// the new phase. Returns the phase entered, or `None` when nothing changed.
pub fn try_advance_phase<R: Rng + ?Sized>(
    state: &mut BattleState,
    policy: ReadinessPolicy,
    rng: &mut R,
) -> Option<Phase> {
    if state.phase == Phase::Finished || !policy.is_satisfied(state) {
        return None;
    }

    let from = state.phase;
    match from {
        Phase::Setup => {
            state.phase = Phase::Supply;
            process_supply_phase(state, rng);
        }
        Phase::Supply => {
            state.phase = Phase::Tactics;
            state.p1_actions.clear();
            state.p2_actions.clear();
        }
        Phase::Tactics => {
            state.phase = Phase::Combat;
            resolve_combat_phase(state);
            check_victory(state);
        }
        Phase::Combat => {
            state.turn_count += 1;
            state.phase = Phase::Supply;
            process_supply_phase(state, rng);
        }
        Phase::Finished => return None,
    }

    state.player1.is_ready = false;
    state.player2.is_ready = false;

    info!(
        "[{}] phase {} -> {} (turn {})",
        state.room_id, from, state.phase, state.turn_count
    );
    Some(state.phase)
}

/// Ends the battle when a player has no standing creatures left.
/// Returns whether the battle is over.
pub fn check_victory(state: &mut BattleState) -> bool {
    let host_down = state.player1.is_defeated();
    let guest_down = state.player2.is_defeated();

    let line = match (host_down, guest_down) {
        (false, false) => return false,
        (true, true) => {
            state.winner = None;
            "Both sides fell at once. The battle is a draw!".to_string()
        }
        (true, false) => victory_line(state, false),
        (false, true) => victory_line(state, true),
    };

    state.phase = Phase::Finished;
    state.log(line);
    true
}

fn victory_line(state: &mut BattleState, host_won: bool) -> String {
    let (winner, loser) = if host_won {
        (&state.player1, &state.player2)
    } else {
        (&state.player2, &state.player1)
    };
    let line = format!(
        "{} wins! All of {}'s creatures fainted.",
        winner.player_id, loser.player_id
    );
    state.winner = Some(winner.player_id.clone());
    line
}
