//! Dice expressions: `NdM`, `dM`, integer constants, `+`/`-` chains and unary
//! minus.
//!
//! Formulas are parsed after token substitution, so `"1d8 + modDEX"` arrives
//! here as `"1d8 + 3"`. Any identifier left over is an unresolved symbol.

use std::fmt;

use crate::env::Dice;

use super::DiceError;

/// Largest dice count or die size accepted by the parser.
const MAX_OPERAND: u32 = 1000;

/// How dice are rolled on a critical hit.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CritRule {
    /// Every dice term rolls twice as many dice.
    #[default]
    DoubleDice,
    /// Every dice term adds its maximum to a normal roll.
    MaxPlusRoll,
    /// The whole total is doubled.
    DoubleTotal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TermKind {
    Dice { count: u32, sides: u32 },
    Const(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Term {
    negative: bool,
    kind: TermKind,
}

/// Parsed dice expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiceExpr {
    terms: Vec<Term>,
}

/// Result of rolling a [`DiceExpr`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiceRoll {
    pub total: i32,
    /// Every face rolled, in order.
    pub faces: Vec<u32>,
}

impl DiceExpr {
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        Parser::new(input).parse()
    }

    /// Constant expression, used for numeric fallbacks.
    pub fn constant(value: i32) -> Self {
        Self {
            terms: vec![Term {
                negative: value < 0,
                kind: TermKind::Const(value.unsigned_abs()),
            }],
        }
    }

    /// True if the expression contains no dice.
    pub fn is_constant(&self) -> bool {
        self.terms
            .iter()
            .all(|t| matches!(t.kind, TermKind::Const(_)))
    }

    /// Rolls the expression. `crit` selects the crit rule, if any.
    pub fn roll(&self, dice: &mut dyn Dice, crit: Option<CritRule>) -> DiceRoll {
        let mut roll = DiceRoll::default();
        for term in &self.terms {
            let value = match term.kind {
                TermKind::Const(n) => n as i64,
                TermKind::Dice { count, sides } => {
                    let count = match crit {
                        Some(CritRule::DoubleDice) => count * 2,
                        _ => count,
                    };
                    let faces = dice.roll(sides, count);
                    let mut sum: i64 = faces.iter().map(|&f| i64::from(f)).sum();
                    roll.faces.extend(faces);
                    if crit == Some(CritRule::MaxPlusRoll) {
                        sum += i64::from(count) * i64::from(sides);
                    }
                    sum
                }
            };
            let value = if term.negative { -value } else { value };
            roll.total = roll.total.saturating_add(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        }
        if crit == Some(CritRule::DoubleTotal) {
            roll.total = roll.total.saturating_mul(2);
        }
        roll
    }

    /// Value of a dice-free expression.
    pub fn constant_value(&self) -> Option<i32> {
        if !self.is_constant() {
            return None;
        }
        Some(self.terms.iter().fold(0i32, |acc, term| match term.kind {
            TermKind::Const(n) if term.negative => acc.saturating_sub(n as i32),
            TermKind::Const(n) => acc.saturating_add(n as i32),
            TermKind::Dice { .. } => acc,
        }))
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            match (i, term.negative) {
                (0, true) => f.write_str("-")?,
                (0, false) => {}
                (_, true) => f.write_str(" - ")?,
                (_, false) => f.write_str(" + ")?,
            }
            match term.kind {
                TermKind::Dice { count, sides } => write!(f, "{count}d{sides}")?,
                TermKind::Const(n) => write!(f, "{n}")?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<DiceExpr, DiceError> {
        self.skip_ws();
        if self.pos == self.bytes.len() {
            return Err(DiceError::Empty);
        }

        let mut terms = Vec::new();
        let mut negative = self.signs(false);
        loop {
            terms.push(Term {
                negative,
                kind: self.atom()?,
            });
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(b'+') | Some(b'-') => negative = self.signs(false),
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(DiceExpr { terms })
    }

    /// Consumes a run of `+`/`-` signs and folds them.
    fn signs(&mut self, mut negative: bool) -> bool {
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'-') => negative = !negative,
                Some(b'+') => {}
                _ => return negative,
            }
            self.pos += 1;
        }
    }

    fn atom(&mut self) -> Result<TermKind, DiceError> {
        self.skip_ws();
        let count = match self.peek() {
            Some(c) if c.is_ascii_digit() => Some(self.number()?),
            Some(b'd') | Some(b'D') => None,
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => return Err(self.symbol()),
            _ => return Err(self.unexpected()),
        };

        if !matches!(self.peek(), Some(b'd') | Some(b'D')) {
            // A plain constant; a trailing letter means a glued identifier.
            if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                return Err(self.symbol());
            }
            return Ok(TermKind::Const(count.unwrap_or(0)));
        }
        self.pos += 1;

        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.symbol_from(self.pos - 1));
        }
        let sides = self.number()?;
        if sides == 0 {
            return Err(DiceError::ZeroSides(self.input.to_string()));
        }
        Ok(TermKind::Dice {
            count: count.unwrap_or(1),
            sides,
        })
    }

    fn number(&mut self) -> Result<u32, DiceError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.input[start..self.pos]
            .parse::<u32>()
            .ok()
            .filter(|n| *n <= MAX_OPERAND)
            .ok_or_else(|| DiceError::Overflow(self.input.to_string()))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn symbol(&self) -> DiceError {
        self.symbol_from(self.pos)
    }

    fn symbol_from(&self, start: usize) -> DiceError {
        let end = self.bytes[start..]
            .iter()
            .position(|c| !(c.is_ascii_alphanumeric() || *c == b'_'))
            .map_or(self.bytes.len(), |len| start + len);
        DiceError::UnresolvedSymbol {
            expr: self.input.to_string(),
            symbol: self.input[start..end].to_string(),
        }
    }

    fn unexpected(&self) -> DiceError {
        let found = self.input[self.pos..].chars().next().unwrap_or('\0');
        DiceError::UnexpectedChar {
            expr: self.input.to_string(),
            found,
            offset: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{FixedDice, ScriptedDice};

    #[test]
    fn parses_and_rolls_mixed_terms() {
        let expr = DiceExpr::parse("2d6 + 3 - 1d4").unwrap();
        let mut dice = ScriptedDice::new([5, 2, 3]);
        let roll = expr.roll(&mut dice, None);
        assert_eq!(roll.total, 5 + 2 + 3 - 3);
        assert_eq!(roll.faces, vec![5, 2, 3]);
    }

    #[test]
    fn bare_die_and_sign_runs() {
        let expr = DiceExpr::parse("d20 + -2").unwrap();
        assert_eq!(expr.roll(&mut FixedDice(11), None).total, 9);
        assert_eq!(DiceExpr::parse("- -4").unwrap().constant_value(), Some(4));
        assert_eq!(DiceExpr::parse("-3").unwrap().constant_value(), Some(-3));
    }

    #[test]
    fn crit_rules() {
        let expr = DiceExpr::parse("1d8 + 2").unwrap();
        assert_eq!(expr.roll(&mut FixedDice(3), Some(CritRule::DoubleDice)).total, 8);
        assert_eq!(expr.roll(&mut FixedDice(3), Some(CritRule::MaxPlusRoll)).total, 13);
        assert_eq!(expr.roll(&mut FixedDice(3), Some(CritRule::DoubleTotal)).total, 10);
    }

    #[test]
    fn rejects_leftover_symbols() {
        assert_eq!(
            DiceExpr::parse("1d6 + spellPower"),
            Err(DiceError::UnresolvedSymbol {
                expr: "1d6 + spellPower".into(),
                symbol: "spellPower".into(),
            })
        );
        assert!(matches!(
            DiceExpr::parse("3x"),
            Err(DiceError::UnresolvedSymbol { .. })
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(DiceExpr::parse("   "), Err(DiceError::Empty));
        assert!(matches!(DiceExpr::parse("1d0"), Err(DiceError::ZeroSides(_))));
        assert!(matches!(DiceExpr::parse("2 * 3"), Err(DiceError::UnexpectedChar { found: '*', .. })));
        assert!(matches!(DiceExpr::parse("99999d6"), Err(DiceError::Overflow(_))));
        assert!(matches!(DiceExpr::parse("1d6 +"), Err(DiceError::UnexpectedChar { .. })));
    }

    #[test]
    fn display_normalizes_spacing() {
        assert_eq!(DiceExpr::parse("1d6+-2").unwrap().to_string(), "1d6 - 2");
    }
}
