//! Dice primitive for deterministic random number generation.
//!
//! The engine never touches ambient randomness. Every roll goes through the
//! [`Dice`] handle threaded into the execution, so a test can pin every face
//! and a replay can reproduce a whole battle from its seed.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::config::EngineConfig;
use crate::state::AdvantageMode;

/// Source of die faces.
pub trait Dice {
    /// Rolls one die with `sides` faces (1..=sides). `sides` is at least 1.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Rolls `count` dice with `sides` faces each.
    fn roll(&mut self, sides: u32, count: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll_die(sides.max(1))).collect()
    }

    /// Rolls a d20, twice when the mode has advantage or disadvantage.
    fn roll_d20(&mut self, mode: AdvantageMode) -> D20Roll {
        let mut rolls = ArrayVec::new();
        rolls.push(self.roll_die(20));
        if mode != AdvantageMode::Normal {
            rolls.push(self.roll_die(20));
        }
        let natural = match mode {
            AdvantageMode::Normal => rolls[0],
            AdvantageMode::Advantage => rolls[0].max(rolls[1]),
            AdvantageMode::Disadvantage => rolls[0].min(rolls[1]),
        };
        D20Roll {
            natural,
            rolls,
            mode,
        }
    }
}

/// A d20 roll with every die that was thrown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct D20Roll {
    /// Kept face.
    pub natural: u32,
    pub rolls: ArrayVec<u32, { EngineConfig::MAX_D20_DICE }>,
    pub mode: AdvantageMode,
}

// ============================================================================
// PCG
// ============================================================================

/// Seeded PCG-XSH-RR dice.
///
/// 64-bit state, 32-bit output. The same seed always yields the same faces.
#[derive(Clone, Copy, Debug)]
pub struct PcgDice {
    state: u64,
}

impl PcgDice {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn seeded(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed for one action execution, mixed from the battle seed, the round and
    /// the acting token.
    pub fn for_action(battle_seed: u64, round: u32, actor: u32) -> Self {
        let mut hash = battle_seed;
        hash ^= u64::from(round).wrapping_mul(0x9e3779b97f4a7c15);
        hash ^= u64::from(actor).wrapping_mul(0x517cc1b727220a95);
        hash ^= hash >> 33;
        hash = hash.wrapping_mul(0xff51afd7ed558ccd);
        hash ^= hash >> 33;
        Self::seeded(hash)
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        let state = self.state;
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl Dice for PcgDice {
    /// Uniform over `1..=sides`: draws past the last whole multiple of
    /// `sides` are rejected.
    fn roll_die(&mut self, sides: u32) -> u32 {
        let sides = u64::from(sides.max(1));
        let zone = (1u64 << 32) - (1u64 << 32) % sides;
        loop {
            let draw = u64::from(self.next_u32());
            if draw < zone {
                return (draw % sides) as u32 + 1;
            }
        }
    }
}

// ============================================================================
// Test doubles
// ============================================================================

/// Every die shows the same face (clamped to the die's range).
#[derive(Clone, Copy, Debug)]
pub struct FixedDice(pub u32);

impl Dice for FixedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.clamp(1, sides.max(1))
    }
}

/// Plays back queued faces, then a fallback face.
#[derive(Clone, Debug)]
pub struct ScriptedDice {
    faces: VecDeque<u32>,
    fallback: u32,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            fallback: 1,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, face: u32) -> Self {
        self.fallback = face;
        self
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl Dice for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.faces
            .pop_front()
            .unwrap_or(self.fallback)
            .clamp(1, sides.max(1))
    }
}
