//! Irreducible play shapes: singles, pairs and tractors.

use crate::model::card::{Card, CardId};
use crate::model::legality::LegalityFailure;
use core::fmt;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Single,
    Pair,
    /// Tractor made of this many pairs (at least two).
    Tractor(usize),
}

impl UnitKind {
    pub const fn card_count(self) -> usize {
        match self {
            UnitKind::Single => 1,
            UnitKind::Pair => 2,
            UnitKind::Tractor(pairs) => pairs * 2,
        }
    }

    pub const fn pair_count(self) -> usize {
        match self {
            UnitKind::Single => 0,
            UnitKind::Pair => 1,
            UnitKind::Tractor(pairs) => pairs,
        }
    }

    /// Next-smaller shapes that together cover the same number of cards.
    pub fn fallback(self) -> Vec<UnitKind> {
        match self {
            UnitKind::Single => Vec::new(),
            UnitKind::Pair => vec![UnitKind::Single, UnitKind::Single],
            UnitKind::Tractor(pairs) if pairs <= 2 => vec![UnitKind::Pair; pairs],
            UnitKind::Tractor(pairs) => vec![UnitKind::Tractor(pairs - 1), UnitKind::Pair],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            UnitKind::Single => "single",
            UnitKind::Pair => "pair",
            UnitKind::Tractor(_) => "tractor",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Tractor(pairs) => write!(f, "{}-pair tractor", pairs),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Single {
    card: Card,
    strength: u8,
}

impl Single {
    pub(crate) fn new(card: Card, strength: u8) -> Self {
        Self { card, strength }
    }

    pub fn card(&self) -> Card {
        self.card
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }
}

/// Two cards with the same face. `peers` holds other pairs of the same
/// strength in the same family (off-suit trump-rank pairs) that may stand in
/// for this one inside a tractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    cards: [Card; 2],
    strength: u8,
    #[serde(skip)]
    peers: Vec<Pair>,
}

impl Pair {
    pub(crate) fn new(first: Card, second: Card, strength: u8) -> Self {
        debug_assert!(first.matches(&second), "pair of mismatched cards");
        Self {
            cards: [first, second],
            strength,
            peers: Vec::new(),
        }
    }

    pub fn cards(&self) -> [Card; 2] {
        self.cards
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    pub fn peers(&self) -> &[Pair] {
        &self.peers
    }

    pub(crate) fn add_peer(&mut self, peer: Pair) {
        self.peers.push(Pair { peers: Vec::new(), ..peer });
    }

    fn drawn(&self, draw: &mut impl FnMut(Card) -> Option<Card>) -> Option<Pair> {
        Some(Pair::new(draw(self.cards[0])?, draw(self.cards[1])?, self.strength))
    }

    fn singles(&self) -> [Single; 2] {
        self.cards.map(|card| Single::new(card, self.strength))
    }

    /// This pair followed by each of its peers.
    fn with_peers(&self) -> Vec<Pair> {
        let mut options = Vec::with_capacity(1 + self.peers.len());
        options.push(self.clone());
        options.extend(self.peers.iter().cloned());
        options
    }
}

/// Two or more pairs with consecutive strengths, strongest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tractor {
    pairs: Vec<Pair>,
}

impl Tractor {
    pub(crate) fn new(pairs: Vec<Pair>) -> Self {
        debug_assert!(pairs.len() >= 2, "tractor needs at least two pairs");
        debug_assert!(
            pairs
                .windows(2)
                .all(|w| w[1].strength == w[0].strength + 1),
            "tractor pairs must be consecutive"
        );
        Self { pairs }
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn strength(&self) -> u8 {
        self.pairs[0].strength
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    fn windows(&self, pairs: usize) -> Vec<Tractor> {
        if pairs < 2 || pairs > self.pairs.len() {
            return Vec::new();
        }
        self.pairs
            .windows(pairs)
            .map(|window| Tractor::new(window.to_vec()))
            .collect()
    }

    fn peer_variants(&self) -> Vec<Tractor> {
        let mut variants: Vec<Vec<Pair>> = vec![Vec::with_capacity(self.pairs.len())];
        for pair in &self.pairs {
            let options = pair.with_peers();
            variants = variants
                .into_iter()
                .flat_map(|prefix| {
                    options.iter().map(move |option| {
                        let mut next = prefix.clone();
                        next.push(option.clone());
                        next
                    })
                })
                .collect();
        }
        variants.into_iter().map(Tractor::new).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Unit {
    Single(Single),
    Pair(Pair),
    Tractor(Tractor),
}

/// Outcome of matching a lead unit against a follower's hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The follower submitted this unit from their hand.
    Matched(Unit),
    /// The hand cannot form the shape at all; a smaller shape must be used.
    Unavailable,
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Single(_) => UnitKind::Single,
            Unit::Pair(_) => UnitKind::Pair,
            Unit::Tractor(tractor) => UnitKind::Tractor(tractor.pair_count()),
        }
    }

    pub fn cards(&self) -> Vec<Card> {
        match self {
            Unit::Single(single) => vec![single.card],
            Unit::Pair(pair) => pair.cards.to_vec(),
            Unit::Tractor(tractor) => tractor.pairs.iter().flat_map(|pair| pair.cards).collect(),
        }
    }

    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards().iter().map(|card| card.id).collect()
    }

    pub fn len(&self) -> usize {
        self.kind().card_count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn pair_count(&self) -> usize {
        self.kind().pair_count()
    }

    /// Strength index of the unit's strongest card.
    pub fn strength(&self) -> u8 {
        match self {
            Unit::Single(single) => single.strength,
            Unit::Pair(pair) => pair.strength,
            Unit::Tractor(tractor) => tractor.strength(),
        }
    }

    pub fn highest(&self) -> Card {
        match self {
            Unit::Single(single) => single.card,
            Unit::Pair(pair) => pair.cards[0],
            Unit::Tractor(tractor) => tractor.pairs[0].cards[0],
        }
    }

    /// Every unit of shape `target` that can be carved out of this one.
    pub fn decompose_into(&self, target: UnitKind) -> Vec<Unit> {
        match (self, target) {
            (Unit::Single(single), UnitKind::Single) => vec![Unit::Single(single.clone())],
            (Unit::Single(_), _) => Vec::new(),
            (Unit::Pair(pair), UnitKind::Single) => {
                pair.singles().into_iter().map(Unit::Single).collect()
            }
            (Unit::Pair(pair), UnitKind::Pair) => vec![Unit::Pair(pair.clone())],
            (Unit::Pair(_), UnitKind::Tractor(_)) => Vec::new(),
            (Unit::Tractor(tractor), UnitKind::Single) => tractor
                .pairs
                .iter()
                .flat_map(|pair| pair.singles())
                .map(Unit::Single)
                .collect(),
            (Unit::Tractor(tractor), UnitKind::Pair) => {
                tractor.pairs.iter().cloned().map(Unit::Pair).collect()
            }
            (Unit::Tractor(tractor), UnitKind::Tractor(pairs)) => tractor
                .windows(pairs)
                .into_iter()
                .map(Unit::Tractor)
                .collect(),
        }
    }

    /// This unit plus every tractor obtained by swapping constituent pairs
    /// for their peers. Singles and pairs have no variants.
    pub fn peer_variants(&self) -> Vec<Unit> {
        match self {
            Unit::Tractor(tractor) => tractor
                .peer_variants()
                .into_iter()
                .map(Unit::Tractor)
                .collect(),
            other => vec![other.clone()],
        }
    }

    /// Matches this lead unit against the follower's `hand` units, accepting
    /// only a candidate whose faces can all be found among the `played` cards.
    pub fn resolve(&self, played: &[Card], hand: &[Unit]) -> Result<Resolved, LegalityFailure> {
        resolve_kind(self.kind(), played, hand)
    }

    /// This unit rebuilt from distinct `played` cards of the same faces.
    /// Copies of a face are interchangeable, so ids need not agree.
    fn drawn_from(&self, played: &[Card]) -> Option<Unit> {
        let mut used = vec![false; played.len()];
        let mut draw = |card: Card| -> Option<Card> {
            let index = (0..played.len())
                .find(|&i| !used[i] && played[i].id == card.id)
                .or_else(|| (0..played.len()).find(|&i| !used[i] && played[i].matches(&card)))?;
            used[index] = true;
            Some(played[index])
        };
        match self {
            Unit::Single(single) => {
                Some(Unit::Single(Single::new(draw(single.card)?, single.strength)))
            }
            Unit::Pair(pair) => pair.drawn(&mut draw).map(Unit::Pair),
            Unit::Tractor(tractor) => tractor
                .pairs
                .iter()
                .map(|pair| pair.drawn(&mut draw))
                .collect::<Option<Vec<Pair>>>()
                .map(|pairs| Unit::Tractor(Tractor::new(pairs))),
        }
    }

    fn identity(&self) -> Vec<CardId> {
        let mut ids = self.card_ids();
        ids.sort_unstable();
        ids
    }
}

/// Shape-only form of [`Unit::resolve`], used when a lead unit has been
/// broken down into smaller requirements.
pub fn resolve_kind(
    kind: UnitKind,
    played: &[Card],
    hand: &[Unit],
) -> Result<Resolved, LegalityFailure> {
    let candidates = candidates(kind, hand);
    let Some(best) = candidates.first() else {
        return Ok(Resolved::Unavailable);
    };
    match candidates
        .iter()
        .find_map(|candidate| candidate.drawn_from(played))
    {
        Some(found) => Ok(Resolved::Matched(found)),
        None => Err(LegalityFailure::format(kind, best.cards())),
    }
}

/// All distinct units of shape `kind` available from `hand`, strongest first.
pub fn candidates(kind: UnitKind, hand: &[Unit]) -> Vec<Unit> {
    let mut found: Vec<(u8, Vec<CardId>, Unit)> = hand
        .iter()
        .flat_map(|unit| unit.decompose_into(kind))
        .flat_map(|unit| unit.peer_variants())
        .map(|unit| (unit.strength(), unit.identity(), unit))
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    found.dedup_by(|a, b| a.1 == b.1);
    found.into_iter().map(|(_, _, unit)| unit).collect()
}

#[cfg(test)]
mod tests {
    use super::{Pair, Resolved, Single, Tractor, Unit, UnitKind, candidates};
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn pair(id: u32, rank: Rank, suit: Suit, strength: u8) -> Pair {
        Pair::new(
            Card::new(id, rank, suit),
            Card::new(id + 1, rank, suit),
            strength,
        )
    }

    fn spade_tractor() -> Tractor {
        Tractor::new(vec![
            pair(10, Rank::Queen, Suit::Spades, 18),
            pair(20, Rank::Jack, Suit::Spades, 19),
            pair(30, Rank::Ten, Suit::Spades, 20),
        ])
    }

    #[test]
    fn single_only_decomposes_into_itself() {
        let single = Unit::Single(Single::new(Card::new(1, Rank::Ace, Suit::Clubs), 16));
        assert_eq!(single.decompose_into(UnitKind::Single), vec![single.clone()]);
        assert!(single.decompose_into(UnitKind::Pair).is_empty());
    }

    #[test]
    fn pair_decomposes_into_itself_or_singles() {
        let unit = Unit::Pair(pair(1, Rank::Nine, Suit::Hearts, 20));
        assert_eq!(unit.decompose_into(UnitKind::Pair), vec![unit.clone()]);
        let singles = unit.decompose_into(UnitKind::Single);
        assert_eq!(singles.len(), 2);
        assert!(singles.iter().all(|s| s.kind() == UnitKind::Single));
        assert!(unit.decompose_into(UnitKind::Tractor(2)).is_empty());
    }

    #[test]
    fn tractor_decomposes_into_windows_pairs_and_singles() {
        let unit = Unit::Tractor(spade_tractor());
        let windows = unit.decompose_into(UnitKind::Tractor(2));
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].strength(), 18);
        assert_eq!(windows[1].strength(), 19);
        assert_eq!(unit.decompose_into(UnitKind::Tractor(3)), vec![unit.clone()]);
        assert!(unit.decompose_into(UnitKind::Tractor(4)).is_empty());

        let pairs = unit.decompose_into(UnitKind::Pair);
        assert_eq!(pairs.len(), unit.len() / 2);
        for pair in &pairs {
            let cards = pair.cards();
            assert!(cards[0].matches(&cards[1]));
        }
        assert_eq!(unit.decompose_into(UnitKind::Single).len(), 6);
    }

    #[test]
    fn fallback_covers_the_same_card_count() {
        for kind in [
            UnitKind::Pair,
            UnitKind::Tractor(2),
            UnitKind::Tractor(3),
            UnitKind::Tractor(5),
        ] {
            let covered: usize = kind.fallback().iter().map(|k| k.card_count()).sum();
            assert_eq!(covered, kind.card_count(), "{kind}");
        }
        assert!(UnitKind::Single.fallback().is_empty());
    }

    #[test]
    fn peers_expand_into_equivalent_tractors() {
        let mut club_twos = pair(1, Rank::Two, Suit::Clubs, 3);
        club_twos.add_peer(pair(3, Rank::Two, Suit::Hearts, 3));
        let tractor = Unit::Tractor(Tractor::new(vec![
            club_twos,
            pair(5, Rank::Ace, Suit::Spades, 4),
        ]));
        let variants = tractor.peer_variants();
        assert_eq!(variants.len(), 2);
        assert!(variants[1].cards().iter().any(|card| card.suit == Suit::Hearts));
    }

    #[test]
    fn resolve_accepts_peer_tractor() {
        let mut club_twos = pair(1, Rank::Two, Suit::Clubs, 3);
        let heart_twos = pair(3, Rank::Two, Suit::Hearts, 3);
        club_twos.add_peer(heart_twos.clone());
        let hand = vec![
            Unit::Tractor(Tractor::new(vec![
                club_twos,
                pair(5, Rank::Ace, Suit::Spades, 4),
            ])),
            Unit::Pair(heart_twos),
        ];
        let lead = Unit::Tractor(Tractor::new(vec![
            pair(50, Rank::Two, Suit::Spades, 2),
            pair(52, Rank::Two, Suit::Diamonds, 3),
        ]));
        let played = [
            Card::new(3, Rank::Two, Suit::Hearts),
            Card::new(4, Rank::Two, Suit::Hearts),
            Card::new(5, Rank::Ace, Suit::Spades),
            Card::new(6, Rank::Ace, Suit::Spades),
        ];
        match lead.resolve(&played, &hand).unwrap() {
            Resolved::Matched(unit) => {
                let mut ids = unit.card_ids();
                ids.sort_unstable();
                assert_eq!(ids, vec![3, 4, 5, 6]);
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn resolve_reports_unavailable_shapes() {
        let hand = vec![Unit::Pair(pair(1, Rank::Nine, Suit::Hearts, 20))];
        let lead = Unit::Tractor(spade_tractor());
        assert_eq!(
            lead.resolve(&[], &hand),
            Ok(Resolved::Unavailable)
        );
    }

    #[test]
    fn resolve_rejects_with_strongest_candidate_as_hint() {
        let hand = vec![
            Unit::Pair(pair(1, Rank::Nine, Suit::Hearts, 20)),
            Unit::Pair(pair(3, Rank::King, Suit::Hearts, 17)),
            Unit::Single(Single::new(Card::new(5, Rank::Four, Suit::Hearts), 25)),
        ];
        let lead = Unit::Pair(pair(40, Rank::Ace, Suit::Hearts, 16));
        let played = [
            Card::new(1, Rank::Nine, Suit::Hearts),
            Card::new(5, Rank::Four, Suit::Hearts),
        ];
        let failure = lead.resolve(&played, &hand).unwrap_err();
        assert_eq!(failure.title, "Illegal format for pair");
        assert_eq!(failure.message, "There are available pairs to play.");
        let hint: Vec<_> = failure.hint.iter().map(|card| card.id).collect();
        assert_eq!(hint, vec![3, 4]);
    }

    #[test]
    fn resolve_matches_copies_by_face() {
        let hand = vec![
            Unit::Pair(pair(1, Rank::King, Suit::Spades, 17)),
            Unit::Single(Single::new(Card::new(3, Rank::King, Suit::Spades), 17)),
        ];
        let lead = Unit::Pair(pair(40, Rank::Nine, Suit::Spades, 21));
        let played = [
            Card::new(1, Rank::King, Suit::Spades),
            Card::new(3, Rank::King, Suit::Spades),
        ];
        match lead.resolve(&played, &hand).unwrap() {
            Resolved::Matched(unit) => {
                let mut ids = unit.card_ids();
                ids.sort_unstable();
                assert_eq!(ids, vec![1, 3]);
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn candidates_are_sorted_and_deduplicated() {
        let tractor = Unit::Tractor(spade_tractor());
        let loose = Unit::Pair(pair(50, Rank::Five, Suit::Spades, 25));
        let found = candidates(UnitKind::Pair, &[loose, tractor]);
        let strengths: Vec<_> = found.iter().map(|unit| unit.strength()).collect();
        assert_eq!(strengths, vec![18, 19, 20, 25]);
    }
}
