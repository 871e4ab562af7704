//! Classification of a set of played cards into singles, pairs and tractors.

use crate::model::card::Card;
use crate::model::order::{Family, Order};
use crate::model::suit::Suit;
use crate::model::unit::{Pair, Single, Tractor, Unit};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shape signature: tractor lengths (in pairs, longest first), pair count
/// and single count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    pub tractors: Vec<usize>,
    pub pairs: usize,
    pub singles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Format {
    cards: Vec<Card>,
    all_trumps: bool,
    suit: Option<Suit>,
    tractors: Vec<Tractor>,
    pairs: Vec<Pair>,
    singles: Vec<Single>,
}

impl Format {
    pub fn create(order: &Order, cards: &[Card]) -> Self {
        let mut sorted = cards.to_vec();
        sorted.sort_by_key(|card| (order.for_card(*card), card.suit, card.id));

        let mut singles = Vec::new();
        let mut by_family: BTreeMap<Family, Vec<Pair>> = BTreeMap::new();
        let mut iter = sorted.iter().copied().peekable();
        while let Some(card) = iter.next() {
            let strength = order.for_card(card);
            match iter.next_if(|next| next.matches(&card)) {
                Some(partner) => by_family
                    .entry(order.family(card))
                    .or_default()
                    .push(Pair::new(card, partner, strength)),
                None => singles.push(Single::new(card, strength)),
            }
        }

        let mut tractors = Vec::new();
        let mut pairs = Vec::new();
        for family_pairs in by_family.into_values() {
            // One canonical pair per strength builds tractors; duplicates
            // become its peers and stay standalone.
            let mut canonical: Vec<Pair> = Vec::with_capacity(family_pairs.len());
            for pair in family_pairs {
                match canonical.last_mut() {
                    Some(last) if last.strength() == pair.strength() => {
                        last.add_peer(pair.clone());
                        pairs.push(pair);
                    }
                    Some(_) | None => canonical.push(pair),
                }
            }

            let mut run: Vec<Pair> = Vec::new();
            for pair in canonical {
                let extends = run
                    .last()
                    .is_some_and(|last| pair.strength() == last.strength() + 1);
                if !extends {
                    flush_run(&mut run, &mut tractors, &mut pairs);
                }
                run.push(pair);
            }
            flush_run(&mut run, &mut tractors, &mut pairs);
        }

        tractors.sort_by(|a, b| {
            b.pair_count()
                .cmp(&a.pair_count())
                .then(a.strength().cmp(&b.strength()))
        });
        pairs.sort_by_key(|pair| (pair.strength(), pair.cards()[0].suit, pair.cards()[0].id));
        singles.sort_by_key(|single| (single.strength(), single.card().suit, single.card().id));

        let all_trumps = !sorted.is_empty() && sorted.iter().all(|card| order.is_trump(*card));
        let suit = if all_trumps {
            None
        } else {
            uniform_suit(order, &sorted)
        };

        Self {
            cards: sorted,
            all_trumps,
            suit,
            tractors,
            pairs,
            singles,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn all_trumps(&self) -> bool {
        self.all_trumps
    }

    /// The single non-trump suit shared by every card; `None` when mixed or
    /// all trumps.
    pub fn suit(&self) -> Option<Suit> {
        self.suit
    }

    /// The family every card belongs to, if there is exactly one.
    pub fn family(&self) -> Option<Family> {
        if self.all_trumps {
            Some(Family::Trump)
        } else {
            self.suit.map(Family::Suit)
        }
    }

    pub fn tractors(&self) -> &[Tractor] {
        &self.tractors
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn singles(&self) -> &[Single] {
        &self.singles
    }

    pub fn unit_count(&self) -> usize {
        self.tractors.len() + self.pairs.len() + self.singles.len()
    }

    pub fn is_toss(&self) -> bool {
        self.unit_count() != 1
    }

    /// Units from largest to smallest: tractors, pairs, then singles.
    pub fn units(&self) -> Vec<Unit> {
        self.tractors
            .iter()
            .cloned()
            .map(Unit::Tractor)
            .chain(self.pairs.iter().cloned().map(Unit::Pair))
            .chain(self.singles.iter().cloned().map(Unit::Single))
            .collect()
    }

    /// The biggest unit in the play, used as the kitty capture unit.
    pub fn largest_unit(&self) -> Option<Unit> {
        self.units().into_iter().next()
    }

    pub fn shape(&self) -> Shape {
        Shape {
            tractors: self.tractors.iter().map(Tractor::pair_count).collect(),
            pairs: self.pairs.len(),
            singles: self.singles.len(),
        }
    }

    /// Whether this play can take the trick from a lead of `lead`'s shape:
    /// the same shape, and either all trumps or entirely in the lead suit.
    pub fn contends_with(&self, lead: &Format) -> bool {
        if self.shape() != lead.shape() {
            return false;
        }
        if self.all_trumps {
            return true;
        }
        !lead.all_trumps && self.suit.is_some() && self.suit == lead.suit
    }

    /// Strictly stronger than `other` at the first deciding tier: tractors by
    /// length, then the strongest pair, then the strongest single.
    ///
    /// Panics when the shapes differ; callers compare only contending plays.
    pub fn beats(&self, other: &Format) -> bool {
        assert_eq!(
            self.shape(),
            other.shape(),
            "beats called on formats of different shapes"
        );

        let mut lengths: Vec<usize> = self.tractors.iter().map(Tractor::pair_count).collect();
        lengths.dedup();
        for length in lengths {
            let mine = strongest_tractor(&self.tractors, length);
            let theirs = strongest_tractor(&other.tractors, length);
            if let Some(decided) = decide(mine, theirs) {
                return decided;
            }
        }

        let mine = self.pairs.first().map(Pair::strength);
        let theirs = other.pairs.first().map(Pair::strength);
        if let Some(decided) = decide(mine, theirs) {
            return decided;
        }

        let mine = self.singles.first().map(Single::strength);
        let theirs = other.singles.first().map(Single::strength);
        decide(mine, theirs).unwrap_or(false)
    }
}

fn flush_run(run: &mut Vec<Pair>, tractors: &mut Vec<Tractor>, pairs: &mut Vec<Pair>) {
    match run.len() {
        0 => {}
        1 => pairs.append(run),
        _ => tractors.push(Tractor::new(std::mem::take(run))),
    }
}

fn uniform_suit(order: &Order, cards: &[Card]) -> Option<Suit> {
    let first = cards.first()?;
    cards
        .iter()
        .all(|card| card.suit == first.suit && !order.is_trump(*card))
        .then_some(first.suit)
}

fn strongest_tractor(tractors: &[Tractor], pairs: usize) -> Option<u8> {
    tractors
        .iter()
        .filter(|tractor| tractor.pair_count() == pairs)
        .map(Tractor::strength)
        .min()
}

fn decide(mine: Option<u8>, theirs: Option<u8>) -> Option<bool> {
    match (mine, theirs) {
        (Some(mine), Some(theirs)) if mine != theirs => Some(mine < theirs),
        _ => None,
    }
}
