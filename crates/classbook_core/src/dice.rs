//! Dice engine: roll, sort, drop-lowest, sum.
//!
//! # Responsibility
//! - Draw uniform die results in `[1, num_sides]`.
//! - Provide keep-highest rolls and their sum.
//!
//! # Invariants
//! - `roll(n, drop)` returns exactly `n.saturating_sub(drop)` values, sorted
//!   ascending.
//! - Summing zero kept values is an error, never an implicit `0`.
//! - Every `*_with` variant draws only from the caller's RNG, so seeded
//!   callers get reproducible results.

use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Side count used when a caller does not pick one.
pub const DEFAULT_NUM_SIDES: i64 = 6;

/// Upper bound on rolls per request; keeps one request from allocating
/// unbounded memory.
pub const MAX_ROLLS: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiceError {
    InvalidArgument(String),
    EmptyReduction,
}

impl Display for DiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::EmptyReduction => write!(f, "cannot sum an empty roll"),
        }
    }
}

impl Error for DiceError {}

/// Rolls one die with `sides` faces using `rng`.
///
/// # Errors
/// - `InvalidArgument` when `sides` is not a positive 32-bit count.
pub fn roll_once_with<R: Rng + ?Sized>(sides: i64, rng: &mut R) -> Result<i64, DiceError> {
    let die = RandomDie::new(sides)?;
    Ok(die.roll_once_with(rng))
}

/// A die with a fixed number of sides. Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomDie {
    num_sides: u32,
}

impl Default for RandomDie {
    fn default() -> Self {
        Self {
            num_sides: DEFAULT_NUM_SIDES as u32,
        }
    }
}

impl RandomDie {
    /// # Errors
    /// - `InvalidArgument` when `num_sides` is zero, negative or above
    ///   `u32::MAX`.
    pub fn new(num_sides: i64) -> Result<Self, DiceError> {
        match u32::try_from(num_sides) {
            Ok(sides) if sides > 0 => Ok(Self { num_sides: sides }),
            _ => Err(DiceError::InvalidArgument(format!(
                "numSides must be a positive integer, got {num_sides}"
            ))),
        }
    }

    pub fn num_sides(&self) -> i64 {
        i64::from(self.num_sides)
    }

    pub fn roll_once(&self) -> i64 {
        self.roll_once_with(&mut rand::thread_rng())
    }

    pub fn roll_once_with<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        i64::from(rng.gen_range(1..=self.num_sides))
    }

    /// Rolls `num_rolls` times and keeps all but the `drop` lowest results.
    ///
    /// A `drop` of `num_rolls` or more keeps nothing and is not an error.
    pub fn roll(&self, num_rolls: i64, drop: i64) -> Result<Vec<i64>, DiceError> {
        self.roll_with(num_rolls, drop, &mut rand::thread_rng())
    }

    pub fn roll_with<R: Rng + ?Sized>(
        &self,
        num_rolls: i64,
        drop: i64,
        rng: &mut R,
    ) -> Result<Vec<i64>, DiceError> {
        if !(0..=MAX_ROLLS).contains(&num_rolls) {
            return Err(DiceError::InvalidArgument(format!(
                "numRolls must be between 0 and {MAX_ROLLS}, got {num_rolls}"
            )));
        }
        if drop < 0 {
            return Err(DiceError::InvalidArgument(format!(
                "drop must not be negative, got {drop}"
            )));
        }

        // Both bounds were checked above, so the casts cannot truncate.
        let num_rolls = num_rolls as usize;
        let mut results: Vec<i64> = (0..num_rolls).map(|_| self.roll_once_with(rng)).collect();
        results.sort_unstable();

        let drop = usize::try_from(drop).unwrap_or(usize::MAX);
        if drop >= num_rolls {
            return Ok(Vec::new());
        }
        Ok(results.split_off(drop))
    }

    /// Sums the kept results of [`RandomDie::roll`].
    ///
    /// # Errors
    /// - `EmptyReduction` when nothing is kept.
    pub fn roll_sum(&self, num_rolls: i64, drop: i64) -> Result<i64, DiceError> {
        self.roll_sum_with(num_rolls, drop, &mut rand::thread_rng())
    }

    pub fn roll_sum_with<R: Rng + ?Sized>(
        &self,
        num_rolls: i64,
        drop: i64,
        rng: &mut R,
    ) -> Result<i64, DiceError> {
        self.roll_with(num_rolls, drop, rng)?
            .into_iter()
            .reduce(|total, value| total + value)
            .ok_or(DiceError::EmptyReduction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_rejects_non_positive_sides() {
        assert!(matches!(RandomDie::new(0), Err(DiceError::InvalidArgument(_))));
        assert!(matches!(RandomDie::new(-3), Err(DiceError::InvalidArgument(_))));
        assert!(matches!(
            RandomDie::new(i64::from(u32::MAX) + 1),
            Err(DiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn one_sided_die_always_rolls_one() {
        let die = RandomDie::new(1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(die.roll_with(5, 0, &mut rng).unwrap(), vec![1; 5]);
    }

    #[test]
    fn same_seed_gives_same_rolls() {
        let die = RandomDie::new(20).unwrap();
        let first = die.roll_with(8, 2, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = die.roll_with(8, 2, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn drop_keeps_highest_values() {
        let die = RandomDie::new(6).unwrap();
        let all = die.roll_with(6, 0, &mut StdRng::seed_from_u64(3)).unwrap();
        let kept = die.roll_with(6, 2, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(kept, all[2..].to_vec());
    }

    #[test]
    fn negative_inputs_are_rejected() {
        let die = RandomDie::default();
        assert!(matches!(die.roll(-1, 0), Err(DiceError::InvalidArgument(_))));
        assert!(matches!(die.roll(3, -1), Err(DiceError::InvalidArgument(_))));
        assert!(matches!(
            die.roll(MAX_ROLLS + 1, 0),
            Err(DiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn roll_once_with_validates_sides() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(roll_once_with(0, &mut rng).is_err());
        let value = roll_once_with(4, &mut rng).unwrap();
        assert!((1..=4).contains(&value));
    }
}
