//! Entity model and wire protocol shared by the battle server and its clients.
//!
//! Every type here is plain data: the server owns the rules that mutate it,
//! and clients only ever see it as the payload of a `STATE_UPDATE`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const HOST_PLAYER_ID: &str = "p1_host";
pub const GUEST_PLAYER_ID: &str = "p2_guest";

pub const ROSTER_SIZE: usize = 6;
/// Slots `0..ACTIVE_SLOTS` form the active combat pair, the rest is bench.
pub const ACTIVE_SLOTS: usize = 2;
pub const ITEM_CAPACITY: usize = 10;

pub const BASE_HP: u32 = 100;
pub const BASE_SP: u32 = 3;
pub const BASE_EVOLUTION_THRESHOLD: u32 = 50;

pub const DEFAULT_SKILL: &str = "tackle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Supply,
    Tactics,
    Combat,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "SETUP",
            Phase::Supply => "SUPPLY",
            Phase::Tactics => "TACTICS",
            Phase::Combat => "COMBAT",
            Phase::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: String,
    pub species_id: String,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub sp: u32,
    /// Healing past `max_hp`, banked until evolution pays it out.
    pub overheal: u32,
    pub evolution_progress: u32,
    pub evolution_threshold: u32,
    pub is_active: bool,
    /// Roster position, or -1 while the creature is not in a roster.
    pub slot_index: i32,
}

impl Creature {
    /// Builds a fresh creature of `species_id` at full base hp.
    pub fn new(id: impl Into<String>, species_id: &str) -> Self {
        Self {
            id: id.into(),
            species_id: species_id.to_string(),
            name: display_name(species_id),
            hp: BASE_HP,
            max_hp: BASE_HP,
            sp: BASE_SP,
            overheal: 0,
            evolution_progress: 0,
            evolution_threshold: BASE_EVOLUTION_THRESHOLD,
            is_active: false,
            slot_index: -1,
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn can_evolve(&self) -> bool {
        self.evolution_progress >= self.evolution_threshold
    }
}

fn display_name(species_id: &str) -> String {
    let mut chars = species_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EffectType {
    Heal,
    Boost,
    Revive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub effect_type: EffectType,
    pub value: u32,
}

impl Item {
    pub fn potion() -> Self {
        Self {
            id: "potion".to_string(),
            name: "Potion".to_string(),
            effect_type: EffectType::Heal,
            value: 30,
        }
    }

    pub fn super_potion() -> Self {
        Self {
            id: "super_potion".to_string(),
            name: "Super Potion".to_string(),
            effect_type: EffectType::Heal,
            value: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: String,
    pub roster: Vec<Creature>,
    pub items: Vec<Item>,
    pub wild_encounter: Option<Creature>,
    pub is_ready: bool,
}

impl PlayerState {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            roster: Vec::with_capacity(ROSTER_SIZE),
            items: Vec::with_capacity(ITEM_CAPACITY),
            wild_encounter: None,
            is_ready: false,
        }
    }

    /// Adds `item` unless the bag is full. Returns whether it was kept.
    pub fn grant_item(&mut self, item: Item) -> bool {
        if self.items.len() >= ITEM_CAPACITY {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Re-derives `slot_index` and `is_active` from roster positions.
    pub fn sync_slots(&mut self) {
        for (index, creature) in self.roster.iter_mut().enumerate() {
            creature.slot_index = index as i32;
            creature.is_active = index < ACTIVE_SLOTS;
        }
    }

    /// A player with at least one creature, all of them at 0 hp.
    pub fn is_defeated(&self) -> bool {
        !self.roster.is_empty() && self.roster.iter().all(Creature::is_fainted)
    }
}

/// An attack locked in during TACTICS, resolved at COMBAT entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "ATTACK")]
pub struct QueuedAttack {
    pub player_id: String,
    pub src_index: usize,
    pub skill_id: String,
    pub target_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub room_id: String,
    pub phase: Phase,
    pub turn_count: u32,
    pub player1: PlayerState,
    pub player2: PlayerState,
    pub p1_actions: Vec<QueuedAttack>,
    pub p2_actions: Vec<QueuedAttack>,
    pub combat_log: Vec<String>,
    pub winner: Option<String>,
}

impl BattleState {
    pub fn new(room_id: impl Into<String>, player1: PlayerState, player2: PlayerState) -> Self {
        Self {
            room_id: room_id.into(),
            phase: Phase::Setup,
            turn_count: 1,
            player1,
            player2,
            p1_actions: Vec::new(),
            p2_actions: Vec::new(),
            combat_log: Vec::new(),
            winner: None,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerState> {
        if self.player1.player_id == player_id {
            Some(&self.player1)
        } else if self.player2.player_id == player_id {
            Some(&self.player2)
        } else {
            None
        }
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerState> {
        if self.player1.player_id == player_id {
            Some(&mut self.player1)
        } else if self.player2.player_id == player_id {
            Some(&mut self.player2)
        } else {
            None
        }
    }

    /// The player facing `player_id`, if `player_id` is seated in this battle.
    pub fn opponent_mut(&mut self, player_id: &str) -> Option<&mut PlayerState> {
        if self.player1.player_id == player_id {
            Some(&mut self.player2)
        } else if self.player2.player_id == player_id {
            Some(&mut self.player1)
        } else {
            None
        }
    }

    pub fn actions_mut(&mut self, player_id: &str) -> Option<&mut Vec<QueuedAttack>> {
        if self.player1.player_id == player_id {
            Some(&mut self.p1_actions)
        } else if self.player2.player_id == player_id {
            Some(&mut self.p2_actions)
        } else {
            None
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.combat_log.push(line.into());
    }

    /// Drops the oldest log lines beyond `max_lines`. Zero keeps everything.
    pub fn trim_log(&mut self, max_lines: usize) {
        if max_lines == 0 || self.combat_log.len() <= max_lines {
            return;
        }
        let excess = self.combat_log.len() - max_lines;
        self.combat_log.drain(..excess);
    }

    /// Snapshot as `viewer` may see it: the opponent's queued attacks stay hidden.
    pub fn view_for(&self, viewer: &str) -> BattleState {
        let mut view = self.clone();
        if view.player1.player_id != viewer {
            view.p1_actions.clear();
        }
        if view.player2.player_id != viewer {
            view.p2_actions.clear();
        }
        view
    }
}

fn default_skill() -> String {
    DEFAULT_SKILL.to_string()
}

/// A single player command, tagged by `type` on the wire.
///
/// Index fields that the rules require are optional here so that a missing
/// value reaches the resolver and is reported in the combat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Action {
    Catch {
        #[serde(default)]
        keep: bool,
        #[serde(default)]
        replace_index: Option<usize>,
    },
    Swap {
        #[serde(default)]
        src_index: Option<usize>,
        #[serde(default)]
        dst_index: Option<usize>,
    },
    Item {
        #[serde(default)]
        item_index: Option<usize>,
        #[serde(default)]
        target_index: Option<usize>,
    },
    Evolve {
        #[serde(default)]
        target_index: Option<usize>,
    },
    Attack {
        #[serde(default)]
        src_index: usize,
        #[serde(default = "default_skill")]
        skill_id: String,
        #[serde(default)]
        target_index: usize,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Catch { .. } => "CATCH",
            Action::Swap { .. } => "SWAP",
            Action::Item { .. } => "ITEM",
            Action::Evolve { .. } => "EVOLVE",
            Action::Attack { .. } => "ATTACK",
        }
    }
}

/// Frames a client sends to its room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Ready,
    Action { payload: Action },
}

/// Frames the server sends to every subscriber of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    StateUpdate { payload: BattleState },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_battle() -> BattleState {
        let mut p1 = PlayerState::new(HOST_PLAYER_ID);
        let mut p2 = PlayerState::new(GUEST_PLAYER_ID);
        for i in 0..ROSTER_SIZE {
            p1.roster.push(Creature::new(format!("p1_{i}"), "pikachu"));
            p2.roster.push(Creature::new(format!("p2_{i}"), "bulbasaur"));
        }
        BattleState::new("room", p1, p2)
    }

    #[test]
    fn test_creature_creation() {
        let creature = Creature::new("c1", "charmander");
        assert_eq!(creature.name, "Charmander");
        assert_eq!(creature.hp, BASE_HP);
        assert_eq!(creature.max_hp, BASE_HP);
        assert_eq!(creature.sp, BASE_SP);
        assert_eq!(creature.evolution_threshold, BASE_EVOLUTION_THRESHOLD);
        assert_eq!(creature.slot_index, -1);
        assert!(!creature.is_active);
        assert!(!creature.is_fainted());
    }

    #[test]
    fn test_battle_starts_in_setup() {
        let state = test_battle();
        assert_eq!(state.phase, Phase::Setup);
        assert_eq!(state.turn_count, 1);
        assert!(state.winner.is_none());
        assert!(state.combat_log.is_empty());
    }

    #[test]
    fn test_grant_item_respects_capacity() {
        let mut player = PlayerState::new(HOST_PLAYER_ID);
        for _ in 0..ITEM_CAPACITY {
            assert!(player.grant_item(Item::potion()));
        }
        assert!(!player.grant_item(Item::super_potion()));
        assert_eq!(player.items.len(), ITEM_CAPACITY);
        assert!(player.items.iter().all(|item| item.id == "potion"));
    }

    #[test]
    fn test_sync_slots_marks_active_pair() {
        let mut state = test_battle();
        state.player1.sync_slots();

        for (index, creature) in state.player1.roster.iter().enumerate() {
            assert_eq!(creature.slot_index, index as i32);
            assert_eq!(creature.is_active, index < ACTIVE_SLOTS);
        }
    }

    #[test]
    fn test_defeat_requires_every_creature_fainted() {
        let mut state = test_battle();
        assert!(!state.player2.is_defeated());

        for creature in state.player2.roster.iter_mut().skip(1) {
            creature.hp = 0;
        }
        assert!(!state.player2.is_defeated());

        state.player2.roster[0].hp = 0;
        assert!(state.player2.is_defeated());
        assert!(!PlayerState::new("empty").is_defeated());
    }

    #[test]
    fn test_player_lookup() {
        let mut state = test_battle();
        assert_eq!(state.player(GUEST_PLAYER_ID).unwrap().player_id, GUEST_PLAYER_ID);
        assert!(state.player("spectator").is_none());
        assert_eq!(
            state.opponent_mut(HOST_PLAYER_ID).unwrap().player_id,
            GUEST_PLAYER_ID
        );
        assert!(state.actions_mut("spectator").is_none());
    }

    #[test]
    fn test_trim_log_drops_oldest() {
        let mut state = test_battle();
        for i in 0..5 {
            state.log(format!("line {i}"));
        }

        state.trim_log(0);
        assert_eq!(state.combat_log.len(), 5);

        state.trim_log(3);
        assert_eq!(state.combat_log, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_view_hides_opponent_queue() {
        let mut state = test_battle();
        let attack = |player_id: &str| QueuedAttack {
            player_id: player_id.to_string(),
            src_index: 0,
            skill_id: DEFAULT_SKILL.to_string(),
            target_index: 1,
        };
        state.p1_actions.push(attack(HOST_PLAYER_ID));
        state.p2_actions.push(attack(GUEST_PLAYER_ID));

        let host_view = state.view_for(HOST_PLAYER_ID);
        assert_eq!(host_view.p1_actions.len(), 1);
        assert!(host_view.p2_actions.is_empty());

        let guest_view = state.view_for(GUEST_PLAYER_ID);
        assert!(guest_view.p1_actions.is_empty());
        assert_eq!(guest_view.p2_actions.len(), 1);

        // the authoritative state keeps both queues
        assert_eq!(state.p1_actions.len(), 1);
        assert_eq!(state.p2_actions.len(), 1);
    }

    #[test]
    fn test_client_message_wire_format() {
        let ready: ClientMessage = serde_json::from_value(json!({ "type": "READY" })).unwrap();
        assert_eq!(ready, ClientMessage::Ready);

        let swap: ClientMessage = serde_json::from_value(json!({
            "type": "ACTION",
            "payload": { "type": "SWAP", "src_index": 0, "dst_index": 3 }
        }))
        .unwrap();
        assert_eq!(
            swap,
            ClientMessage::Action {
                payload: Action::Swap {
                    src_index: Some(0),
                    dst_index: Some(3)
                }
            }
        );
    }

    #[test]
    fn test_attack_defaults_missing_fields() {
        let action: Action = serde_json::from_value(json!({ "type": "ATTACK" })).unwrap();
        assert_eq!(
            action,
            Action::Attack {
                src_index: 0,
                skill_id: DEFAULT_SKILL.to_string(),
                target_index: 0,
            }
        );
    }

    #[test]
    fn test_catch_and_index_fields_tolerate_absence() {
        let catch: Action = serde_json::from_value(json!({ "type": "CATCH" })).unwrap();
        assert_eq!(
            catch,
            Action::Catch {
                keep: false,
                replace_index: None
            }
        );

        let evolve: Action =
            serde_json::from_value(json!({ "type": "EVOLVE", "extra": true })).unwrap();
        assert_eq!(evolve, Action::Evolve { target_index: None });
    }

    #[test]
    fn test_unknown_action_type_is_rejected() {
        let result = serde_json::from_value::<Action>(json!({ "type": "RETREAT" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_state_update_wire_format() {
        let mut state = test_battle();
        state.p1_actions.push(QueuedAttack {
            player_id: HOST_PLAYER_ID.to_string(),
            src_index: 1,
            skill_id: "ember".to_string(),
            target_index: 0,
        });

        let value = serde_json::to_value(ServerMessage::StateUpdate { payload: state }).unwrap();
        assert_eq!(value["type"], "STATE_UPDATE");
        assert_eq!(value["payload"]["phase"], "setup");
        assert_eq!(value["payload"]["turn_count"], 1);
        assert_eq!(value["payload"]["p1_actions"][0]["type"], "ATTACK");
        assert_eq!(value["payload"]["p1_actions"][0]["skill_id"], "ember");
        assert_eq!(value["payload"]["player1"]["roster"][0]["name"], "Pikachu");
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Tactics.to_string(), "TACTICS");
        assert_eq!(Phase::Finished.to_string(), "FINISHED");
    }
}
