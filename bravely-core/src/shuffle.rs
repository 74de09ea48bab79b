//! Seeded permutation primitives shared by every randomization phase.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{RandomizerError, Result};

/// Source of uniform draws.
pub trait Draw {
    // `upper` is never zero.
    fn below(&mut self, upper: usize) -> usize;

    fn chance(&mut self, p: f64) -> bool;
}

impl Draw for StdRng {
    fn below(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.gen::<f64>() < p
    }
}

/// Each phase draws from its own generator derived from the root seed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Spells,
    SupportCosts,
    StatAffinities,
    Specialties,
    Commands,
    Support,
    MixedAbilities,
    MagicLevels,
    Aptitudes,
    Treasures,
}

impl Phase {
    fn salt(self) -> u64 {
        match self {
            Phase::Spells => 0x5EE1_1000,
            Phase::SupportCosts => 0xC057_2000,
            Phase::StatAffinities => 0x57A7_3000,
            Phase::Specialties => 0x5BEC_4000,
            Phase::Commands => 0xC0DE_5000,
            Phase::Support => 0x5A55_6000,
            Phase::MixedAbilities => 0x31C5_7000,
            Phase::MagicLevels => 0x1E7E_8000,
            Phase::Aptitudes => 0xA971_9000,
            Phase::Treasures => 0x7EA5_A000,
        }
    }

    pub fn rng(self, seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed ^ self.salt())
    }
}

/// Fisher-Yates from the last position down: position `i` swaps with a
/// uniform draw from `0..=i`.
pub fn shuffle<T, D: Draw + ?Sized>(items: &mut [T], draw: &mut D) {
    for i in (0..items.len()).rev() {
        let j = draw.below(i + 1);
        items.swap(i, j);
    }
}

/// Sattolo pass: position `i` swaps with a uniform draw from `0..i`, so
/// every element leaves its position (a single cycle).
pub fn sattolo<T, D: Draw + ?Sized>(items: &mut [T], draw: &mut D) {
    for i in (1..items.len()).rev() {
        let j = draw.below(i);
        items.swap(i, j);
    }
}

pub fn shuffle_positions<T: Clone, D: Draw + ?Sized>(items: &mut [T], positions: &[usize], draw: &mut D) {
    let mut picked: Vec<T> = positions.iter().map(|&p| items[p].clone()).collect();
    shuffle(&mut picked, draw);
    for (&p, value) in positions.iter().zip(picked) {
        items[p] = value;
    }
}

/// Reshuffles `items` until `accept` holds and returns the number of
/// shuffles it took. Callers guarantee an accepting arrangement exists.
pub fn shuffle_until<T, D, F>(items: &mut [T], draw: &mut D, accept: F) -> usize
where
    D: Draw + ?Sized,
    F: Fn(&[T]) -> bool,
{
    let mut attempts = 0;
    loop {
        shuffle(items, draw);
        attempts += 1;
        if accept(items) {
            return attempts;
        }
    }
}

/// Makes `items[position] == sentinel` by swapping it with a uniformly
/// chosen other position that holds the sentinel. Leaves the multiset
/// untouched and draws nothing when the position already holds it.
pub fn keep_value_at<T, D>(items: &mut [T], position: usize, sentinel: &T, draw: &mut D) -> Result<()>
where
    T: PartialEq,
    D: Draw + ?Sized,
{
    if items.get(position) == Some(sentinel) {
        return Ok(());
    }
    if position >= items.len() {
        return Err(RandomizerError::Contract(format!(
            "position {position} outside {} values",
            items.len()
        )));
    }
    let holders: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, v)| *v == sentinel)
        .map(|(i, _)| i)
        .collect();
    if holders.is_empty() {
        return Err(RandomizerError::Contract(
            "no position holds the required value".to_string(),
        ));
    }
    let j = holders[draw.below(holders.len())];
    items.swap(position, j);
    Ok(())
}

#[derive(Clone, Debug)]
pub struct CandidatePool<T> {
    name: &'static str,
    values: Vec<T>,
}

impl<T> CandidatePool<T> {
    pub fn new(name: &'static str, values: Vec<T>) -> Self {
        Self { name, values }
    }

    pub fn shuffled<D: Draw + ?Sized>(name: &'static str, mut values: Vec<T>, draw: &mut D) -> Self {
        shuffle(&mut values, draw);
        Self { name, values }
    }

    pub fn take(&mut self) -> Result<T> {
        self.values.pop().ok_or_else(|| {
            RandomizerError::Contract(format!("candidate pool '{}' is exhausted", self.name))
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

#[cfg(test)]
pub(crate) struct ScriptedDraw {
    draws: std::collections::VecDeque<usize>,
    chances: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedDraw {
    pub(crate) fn new(draws: &[usize]) -> Self {
        Self {
            draws: draws.iter().copied().collect(),
            chances: Default::default(),
        }
    }

    pub(crate) fn with_chances(mut self, chances: &[bool]) -> Self {
        self.chances = chances.iter().copied().collect();
        self
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.draws.is_empty() && self.chances.is_empty()
    }
}

#[cfg(test)]
impl Draw for ScriptedDraw {
    fn below(&mut self, upper: usize) -> usize {
        let value = self.draws.pop_front().expect("script ran out of draws");
        assert!(value < upper, "scripted draw {value} not below {upper}");
        value
    }

    fn chance(&mut self, _p: f64) -> bool {
        self.chances.pop_front().expect("script ran out of coin flips")
    }
}
