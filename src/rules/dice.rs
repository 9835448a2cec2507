//! Dice notation
//!
//! Parses and rolls dice notation like "2d6+3", "1d20", "4d6-2". Rolls
//! take an explicit RNG so callers can seed them.

use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

/// Most dice a single expression may roll
pub const MAX_DICE: u32 = 100;

/// Largest die
pub const MAX_SIDES: u32 = 1000;

/// Largest flat modifier, either sign
pub const MAX_MODIFIER: i32 = 10_000;

/// Dice notation parse errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("missing 'd' in dice notation")]
    MissingSeparator,

    #[error("invalid dice count: {0}")]
    InvalidCount(String),

    #[error("invalid die sides: {0}")]
    InvalidSides(String),

    #[error("invalid modifier: {0}")]
    InvalidModifier(String),
}

/// A parsed dice expression such as `2d6+3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceRoll {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Roll with the given RNG, returning individual dice and the total
    pub fn roll<R: Rng>(&self, rng: &mut R) -> (Vec<u32>, i64) {
        let dice: Vec<u32> = (0..self.count)
            .map(|_| rng.random_range(1..=self.sides))
            .collect();
        let sum = dice.iter().fold(0i64, |acc, &d| acc.saturating_add(i64::from(d)));
        (dice, sum.saturating_add(i64::from(self.modifier)))
    }

    pub fn min(&self) -> i64 {
        i64::from(self.count).saturating_add(i64::from(self.modifier))
    }

    pub fn max(&self) -> i64 {
        i64::from(self.count)
            .saturating_mul(i64::from(self.sides))
            .saturating_add(i64::from(self.modifier))
    }
}

impl FromStr for DiceRoll {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.modifier {
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m if m < 0 => write!(f, "{}d{}{}", self.count, self.sides, m),
            _ => write!(f, "{}d{}", self.count, self.sides),
        }
    }
}

/// Parse a dice notation string like "2d6+3"
pub fn parse_dice(notation: &str) -> Result<DiceRoll, DiceError> {
    let notation = notation.trim().to_lowercase();
    let d_pos = notation.find('d').ok_or(DiceError::MissingSeparator)?;

    // "d6" means "1d6"
    let count_str = &notation[..d_pos];
    let count: u32 = if count_str.is_empty() {
        1
    } else {
        count_str
            .parse()
            .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?
    };
    if count == 0 || count > MAX_DICE {
        return Err(DiceError::InvalidCount(count_str.to_string()));
    }

    let rest = &notation[d_pos + 1..];
    let (sides_str, modifier) = match rest.find(['+', '-']) {
        Some(pos) if pos > 0 => {
            // keep the sign for i32 parsing; "+3" parses fine
            let mod_str = &rest[pos..];
            let modifier: i32 = mod_str
                .parse()
                .ok()
                .filter(|m: &i32| m.unsigned_abs() <= MAX_MODIFIER.unsigned_abs())
                .ok_or_else(|| DiceError::InvalidModifier(mod_str.to_string()))?;
            (&rest[..pos], modifier)
        }
        _ => (rest, 0),
    };

    let sides: u32 = sides_str
        .parse()
        .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;
    if sides == 0 || sides > MAX_SIDES {
        return Err(DiceError::InvalidSides(sides_str.to_string()));
    }

    Ok(DiceRoll {
        count,
        sides,
        modifier,
    })
}
