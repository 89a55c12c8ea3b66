//! Formula token substitution.
//!
//! Authored formulas mix dice notation with symbolic tokens:
//!
//! ```text
//! "1d8 + modFOR"               -> "1d8 + 3"
//! "8 + proficiencyBonus + modINT" -> "8 + 2 + 4"
//! ```
//!
//! Resolution is purely textual. Each recognized token is replaced by the
//! actor's value; unrecognized identifiers and tokens without a value are left
//! untouched for the dice parser to reject or accept.

use std::str::FromStr;

use crate::state::{Ability, Token};

/// Symbolic tokens understood inside formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::AsRefStr)]
pub enum FormulaToken {
    #[strum(serialize = "modFOR")]
    ModFor,
    #[strum(serialize = "modDEX")]
    ModDex,
    #[strum(serialize = "modCON")]
    ModCon,
    #[strum(serialize = "modINT")]
    ModInt,
    #[strum(serialize = "modSAG")]
    ModSag,
    #[strum(serialize = "modCHA")]
    ModCha,
    #[strum(serialize = "level")]
    Level,
    #[strum(serialize = "proficiencyBonus")]
    ProficiencyBonus,
    #[strum(serialize = "attackBonus")]
    AttackBonus,
    #[strum(serialize = "moveRange")]
    MoveRange,
    #[strum(serialize = "armorClass")]
    ArmorClass,
    #[strum(serialize = "maxHp")]
    MaxHp,
}

impl FormulaToken {
    pub fn ability(self) -> Option<Ability> {
        match self {
            Self::ModFor => Some(Ability::For),
            Self::ModDex => Some(Ability::Dex),
            Self::ModCon => Some(Ability::Con),
            Self::ModInt => Some(Ability::Int),
            Self::ModSag => Some(Ability::Sag),
            Self::ModCha => Some(Ability::Cha),
            _ => None,
        }
    }

    /// Value of the token for `actor`.
    ///
    /// Ability modifiers always resolve (falling back to 0). Every other token
    /// resolves only when some source actually provides it.
    pub fn resolve(self, actor: &Token) -> Option<i32> {
        if let Some(ability) = self.ability() {
            return Some(actor.ability_mod(ability));
        }
        match self {
            Self::Level => actor.level().map(|l| l as i32),
            Self::ProficiencyBonus => actor.proficiency_bonus(),
            Self::AttackBonus => actor.attack_bonus(),
            Self::MoveRange => Some(actor.move_range() as i32),
            Self::ArmorClass => actor.armor_class(),
            Self::MaxHp => Some(actor.max_hp as i32),
            _ => None,
        }
    }
}

/// Resolves a single token name for `actor`.
pub fn resolve_token(name: &str, actor: &Token) -> Option<i32> {
    FormulaToken::from_str(name).ok()?.resolve(actor)
}

/// Substitutes every resolvable token in `formula` with its numeric value.
pub fn resolve_formula(formula: &str, actor: &Token) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut chars = formula.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            out.push(c);
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                end = i + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let word = &formula[start..end];
        // Runs starting with a digit are literals or dice ("2d6").
        let value = if c.is_ascii_digit() {
            None
        } else {
            resolve_token(word, actor)
        };
        match value {
            Some(v) => out.push_str(&v.to_string()),
            None => out.push_str(word),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Position, TokenId};

    fn actor() -> Token {
        Token::new(TokenId(1), "fighter", Position::ORIGIN, 30)
            .with_mod(Ability::For, 3)
            .with_level(5)
    }

    #[test]
    fn substitutes_known_tokens() {
        assert_eq!(resolve_formula("1d6 + modFOR", &actor()), "1d6 + 3");
        assert_eq!(
            resolve_formula("8 + proficiencyBonus + modFOR", &actor()),
            "8 + 3 + 3"
        );
    }

    #[test]
    fn unknown_ability_mod_falls_back_to_zero() {
        assert_eq!(resolve_formula("modCHA", &actor()), "0");
    }

    #[test]
    fn derives_modifier_from_sheet_score() {
        let mut a = actor();
        a.sheet.scores.set(Ability::Dex, 15);
        assert_eq!(resolve_formula("1d4+modDEX", &a), "1d4+2");
    }

    #[test]
    fn unresolvable_tokens_stay_in_place() {
        let a = Token::new(TokenId(2), "peasant", Position::ORIGIN, 4);
        assert_eq!(resolve_formula("attackBonus + level", &a), "attackBonus + level");
        assert_eq!(resolve_formula("1d6 + spellPower", &a), "1d6 + spellPower");
    }

    #[test]
    fn dice_literals_are_not_tokens() {
        let mut a = actor();
        a.stats.level = Some(2);
        assert_eq!(resolve_formula("2d6+level", &a), "2d6+2");
        assert_eq!(resolve_formula("d20", &a), "d20");
    }

    #[test]
    fn negative_modifiers_are_inlined() {
        let a = actor().with_mod(Ability::Dex, -1);
        assert_eq!(resolve_formula("1d8 + modDEX", &a), "1d8 + -1");
    }
}
