//! Heal-to-evolve progression.
//!
//! Every point of requested healing counts toward evolution, whether it
//! restores hp or spills past `max_hp`. The spill is banked as overheal and
//! paid out as hp when the creature evolves.

use shared::Creature;

/// Flat `max_hp` gain granted by an evolution.
pub const EVOLUTION_HP_BONUS: u32 = 50;

/// What a single heal did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealOutcome {
    /// Hp actually restored.
    pub heal: u32,
    /// Part of the amount that did not fit under `max_hp`.
    pub overheal: u32,
    /// Evolution progress after the heal.
    pub progress: u32,
    pub can_evolve: bool,
}

/// Heals `creature` by `amount`, banking any excess as overheal.
///
/// `heal + overheal == amount` always holds, and evolution progress grows by
/// exactly `amount`.
pub fn apply_healing(creature: &mut Creature, amount: u32) -> HealOutcome {
    let old_hp = creature.hp;
    let raw = old_hp.saturating_add(amount);

    creature.hp = raw.min(creature.max_hp);
    let overheal = raw - creature.hp;
    let heal = creature.hp - old_hp;

    creature.evolution_progress = creature.evolution_progress.saturating_add(heal + overheal);
    creature.overheal = creature.overheal.saturating_add(overheal);

    HealOutcome {
        heal,
        overheal,
        progress: creature.evolution_progress,
        can_evolve: creature.can_evolve(),
    }
}

/// Evolves `creature` if it has reached its threshold.
///
/// Raises `max_hp` by [`EVOLUTION_HP_BONUS`] and pays out banked overheal as
/// hp; it does not refill to full. Returns false without touching the
/// creature when progress is short.
pub fn execute_evolution(creature: &mut Creature) -> bool {
    if !creature.can_evolve() {
        return false;
    }

    creature.max_hp += EVOLUTION_HP_BONUS;
    creature.hp = creature
        .hp
        .saturating_add(creature.overheal)
        .min(creature.max_hp);

    creature.evolution_progress = 0;
    creature.overheal = 0;
    true
}
