use classbook_core::dice::{roll_once_with, DiceError, RandomDie};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn roll_returns_expected_count_sorted_and_in_range() {
    let die = RandomDie::new(8).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);

    for num_rolls in 0..12 {
        for drop in 0..14 {
            let kept = die.roll_with(num_rolls, drop, &mut rng).unwrap();
            let expected = (num_rolls - drop).max(0) as usize;
            assert_eq!(kept.len(), expected, "numRolls={num_rolls} drop={drop}");
            assert!(kept.iter().all(|value| (1..=8).contains(value)));
            assert!(kept.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }
}

#[test]
fn roll_without_drop_keeps_everything() {
    let die = RandomDie::default();
    assert_eq!(die.roll(5, 0).unwrap().len(), 5);
}

#[test]
fn dropping_every_roll_is_empty_not_an_error() {
    let die = RandomDie::default();
    assert!(die.roll(4, 4).unwrap().is_empty());
    assert!(die.roll(4, 9).unwrap().is_empty());
    assert!(die.roll(0, 0).unwrap().is_empty());
}

#[test]
fn roll_sum_matches_sum_of_same_roll() {
    let die = RandomDie::new(12).unwrap();
    let kept = die
        .roll_with(6, 2, &mut StdRng::seed_from_u64(99))
        .unwrap();
    let sum = die
        .roll_sum_with(6, 2, &mut StdRng::seed_from_u64(99))
        .unwrap();
    assert_eq!(sum, kept.iter().sum::<i64>());
}

#[test]
fn roll_sum_over_empty_roll_fails_with_empty_reduction() {
    let die = RandomDie::default();
    assert_eq!(die.roll_sum(3, 3), Err(DiceError::EmptyReduction));
    assert_eq!(die.roll_sum(0, 0), Err(DiceError::EmptyReduction));
}

#[test]
fn roll_once_stays_within_sides() {
    let die = RandomDie::new(4).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..200 {
        let value = die.roll_once_with(&mut rng);
        assert!((1..=4).contains(&value));
    }
    assert!((1..=4).contains(&die.roll_once()));
}

#[test]
fn every_face_eventually_appears() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut seen = [false; 6];
    for _ in 0..600 {
        let value = roll_once_with(6, &mut rng).unwrap();
        seen[(value - 1) as usize] = true;
    }
    assert!(seen.iter().all(|face| *face));
}

#[test]
fn non_positive_sides_are_invalid() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        roll_once_with(0, &mut rng),
        Err(DiceError::InvalidArgument(_))
    ));
    assert!(matches!(
        roll_once_with(-6, &mut rng),
        Err(DiceError::InvalidArgument(_))
    ));
}
