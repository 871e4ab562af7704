//! Lead and follow legality, with hints a client can show the player.

use crate::model::card::{Card, CardId};
use crate::model::format::Format;
use crate::model::hand::Hand;
use crate::model::order::{Family, Order};
use crate::model::unit::{Resolved, Unit, UnitKind, candidates, resolve_kind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Rejection of a play that breaks the rules. Carries the cards the player
/// should have played instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{title}: {message}")]
pub struct LegalityFailure {
    pub title: String,
    pub message: String,
    pub hint: Vec<Card>,
}

impl LegalityFailure {
    pub fn format(kind: UnitKind, hint: Vec<Card>) -> Self {
        Self {
            title: format!("Illegal format for {}", kind.label()),
            message: format!("There are available {}s to play.", kind.label()),
            hint,
        }
    }

    pub fn suit(family: Family, hint: Vec<Card>) -> Self {
        Self {
            title: "Illegal suit".to_string(),
            message: format!("You must follow with {} while you hold them.", family_label(family)),
            hint,
        }
    }

    pub fn count(expected: usize, hint: Vec<Card>) -> Self {
        let noun = if expected == 1 { "card" } else { "cards" };
        Self {
            title: "Wrong number of cards".to_string(),
            message: format!("You must play exactly {expected} {noun}."),
            hint,
        }
    }

    pub fn lead(hint: Vec<Card>) -> Self {
        Self {
            title: "Illegal lead".to_string(),
            message: "Leading cards must be of one suit or all trumps.".to_string(),
            hint,
        }
    }
}

/// A lead requirement together with the follower's unit that satisfied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complement {
    pub required: UnitKind,
    pub matched: Unit,
}

/// Validates a lead and returns its classification.
pub fn check_lead(order: &Order, played: &[Card]) -> Result<Format, LegalityFailure> {
    let format = Format::create(order, played);
    if format.family().is_some() {
        return Ok(format);
    }

    let mut by_family: BTreeMap<Family, Vec<Card>> = BTreeMap::new();
    for card in played {
        by_family.entry(order.family(*card)).or_default().push(*card);
    }
    let mut hint: Vec<Card> = Vec::new();
    for cards in by_family.into_values() {
        if cards.len() > hint.len() {
            hint = cards;
        }
    }
    Err(LegalityFailure::lead(hint))
}

/// Validates `played` as a follow to `lead` from `hand`. The played cards are
/// assumed to be drawn from the hand already.
///
/// Returns how each lead unit was matched; a follower short of the lead's
/// family gets no complements since the rest of their play is free.
pub fn check_follow(
    order: &Order,
    lead: &Format,
    hand: &Hand,
    played: &[Card],
) -> Result<Vec<Complement>, LegalityFailure> {
    let expected = lead.len();
    if played.len() != expected {
        return Err(LegalityFailure::count(
            expected,
            suggest_follow(order, lead, hand),
        ));
    }
    let Some(family) = lead.family() else {
        return Ok(Vec::new());
    };

    let held = hand.cards_in(order, family);
    let played_ids: HashSet<CardId> = played.iter().map(|card| card.id).collect();

    if held.len() < expected {
        if held.iter().all(|card| played_ids.contains(&card.id)) {
            return Ok(Vec::new());
        }
        return Err(LegalityFailure::suit(family, held));
    }
    if played.iter().any(|card| order.family(*card) != family) {
        return Err(LegalityFailure::suit(
            family,
            required_cards(order, lead, hand),
        ));
    }

    let mut pool = held;
    let mut remaining = played.to_vec();
    let mut complements = Vec::new();
    for unit in lead.units() {
        let kind = unit.kind();
        let before = pool.clone();
        if let Err(mut failure) = satisfy(order, kind, &mut pool, &mut remaining, &mut complements)
        {
            failure.hint = take_strongest(order, kind, &mut before.clone());
            return Err(failure);
        }
    }
    Ok(complements)
}

/// The cards of the lead's family a follower is obliged to play: the
/// strongest unit for each lead requirement, breaking shapes down only when
/// the hand cannot form them. Returns every held card when the hand is short.
pub fn required_cards(order: &Order, lead: &Format, hand: &Hand) -> Vec<Card> {
    let Some(family) = lead.family() else {
        return Vec::new();
    };
    let held = hand.cards_in(order, family);
    if held.len() <= lead.len() {
        return held;
    }

    let mut pool = held;
    let mut required = Vec::with_capacity(lead.len());
    for unit in lead.units() {
        required.extend(take_strongest(order, unit.kind(), &mut pool));
    }
    required
}

/// A legal follow: the required cards topped up with the hand's remaining
/// cards in hand order.
pub fn suggest_follow(order: &Order, lead: &Format, hand: &Hand) -> Vec<Card> {
    let mut play = required_cards(order, lead, hand);
    let chosen: HashSet<CardId> = play.iter().map(|card| card.id).collect();
    let filler = hand
        .iter()
        .copied()
        .filter(|card| !chosen.contains(&card.id))
        .take(lead.len().saturating_sub(play.len()));
    play.extend(filler);
    play
}

fn satisfy(
    order: &Order,
    kind: UnitKind,
    pool: &mut Vec<Card>,
    remaining: &mut Vec<Card>,
    complements: &mut Vec<Complement>,
) -> Result<(), LegalityFailure> {
    let units = Format::create(order, pool).units();
    match resolve_kind(kind, remaining, &units)? {
        Resolved::Matched(unit) => {
            for card in unit.cards() {
                remaining.retain(|submitted| submitted.id != card.id);
                pool.retain(|held| held.id != card.id);
            }
            complements.push(Complement {
                required: kind,
                matched: unit,
            });
        }
        Resolved::Unavailable => {
            for smaller in kind.fallback() {
                satisfy(order, smaller, pool, remaining, complements)?;
            }
        }
    }
    Ok(())
}

fn take_strongest(order: &Order, kind: UnitKind, pool: &mut Vec<Card>) -> Vec<Card> {
    let units = Format::create(order, pool).units();
    if let Some(best) = candidates(kind, &units).into_iter().next() {
        let cards = best.cards();
        pool.retain(|held| !cards.iter().any(|card| card.id == held.id));
        return cards;
    }
    let mut taken = Vec::with_capacity(kind.card_count());
    for smaller in kind.fallback() {
        taken.extend(take_strongest(order, smaller, pool));
    }
    taken
}

fn family_label(family: Family) -> &'static str {
    match family {
        Family::Trump => "trumps",
        Family::Suit(suit) => suit.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::{check_follow, check_lead, required_cards, suggest_follow};
    use crate::model::card::Card;
    use crate::model::format::Format;
    use crate::model::hand::Hand;
    use crate::model::order::Order;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::unit::UnitKind;

    fn card(id: u32, rank: Rank, suit: Suit) -> Card {
        Card::new(id, rank, suit)
    }

    fn ids(cards: &[Card]) -> Vec<u32> {
        let mut ids: Vec<u32> = cards.iter().map(|card| card.id).collect();
        ids.sort_unstable();
        ids
    }

    fn hearts_trump() -> Order {
        Order::new(Rank::Two, Suit::Hearts).unwrap()
    }

    fn spade_tractor_lead(order: &Order) -> Format {
        Format::create(
            order,
            &[
                card(100, Rank::Nine, Suit::Spades),
                card(101, Rank::Nine, Suit::Spades),
                card(102, Rank::Ten, Suit::Spades),
                card(103, Rank::Ten, Suit::Spades),
            ],
        )
    }

    fn two_pair_hand() -> Hand {
        Hand::with_cards(vec![
            card(1, Rank::King, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
            card(3, Rank::Seven, Suit::Spades),
            card(4, Rank::Seven, Suit::Spades),
            card(5, Rank::Five, Suit::Diamonds),
            card(6, Rank::Eight, Suit::Clubs),
            card(9, Rank::Three, Suit::Spades),
        ])
    }

    #[test]
    fn short_follower_may_fill_with_other_suits() {
        let order = hearts_trump();
        let lead = Format::create(
            &order,
            &[
                card(100, Rank::Ace, Suit::Spades),
                card(101, Rank::King, Suit::Spades),
            ],
        );
        let spade = card(10, Rank::Nine, Suit::Spades);
        let diamond = card(11, Rank::Five, Suit::Diamonds);
        let club = card(12, Rank::Seven, Suit::Clubs);
        let hand = Hand::with_cards(vec![spade, diamond, club]);

        assert_eq!(check_follow(&order, &lead, &hand, &[spade, diamond]), Ok(Vec::new()));

        let failure = check_follow(&order, &lead, &hand, &[diamond, club]).unwrap_err();
        assert_eq!(failure.title, "Illegal suit");
        assert!(failure.message.contains("spades"));
        assert_eq!(ids(&failure.hint), vec![10]);
    }

    #[test]
    fn off_suit_singles_rejected_with_both_pairs_as_hint() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        let hand = two_pair_hand();
        let played = [
            card(1, Rank::King, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
            card(5, Rank::Five, Suit::Diamonds),
            card(6, Rank::Eight, Suit::Clubs),
        ];
        let failure = check_follow(&order, &lead, &hand, &played).unwrap_err();
        assert_eq!(failure.title, "Illegal suit");
        assert_eq!(ids(&failure.hint), vec![1, 2, 3, 4]);
    }

    #[test]
    fn broken_pair_inside_fallback_reports_whole_requirement() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        let hand = two_pair_hand();
        let played = [
            card(1, Rank::King, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
            card(3, Rank::Seven, Suit::Spades),
            card(9, Rank::Three, Suit::Spades),
        ];
        let failure = check_follow(&order, &lead, &hand, &played).unwrap_err();
        assert_eq!(failure.title, "Illegal format for pair");
        assert_eq!(failure.message, "There are available pairs to play.");
        assert_eq!(ids(&failure.hint), vec![1, 2, 3, 4]);
    }

    #[test]
    fn two_pairs_satisfy_a_tractor_lead_without_one() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        let hand = two_pair_hand();
        let played = [
            card(3, Rank::Seven, Suit::Spades),
            card(1, Rank::King, Suit::Spades),
            card(4, Rank::Seven, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
        ];
        let complements = check_follow(&order, &lead, &hand, &played).unwrap();
        assert_eq!(complements.len(), 2);
        assert!(complements.iter().all(|c| c.required == UnitKind::Pair));
        assert_eq!(complements[0].matched.highest().rank, Rank::King);
    }

    #[test]
    fn peer_pair_may_stand_in_for_canonical_pair() {
        let order = Order::new(Rank::Two, Suit::Spades).unwrap();
        let lead = Format::create(
            &order,
            &[
                card(100, Rank::Two, Suit::Spades),
                card(101, Rank::Two, Suit::Spades),
                card(102, Rank::Two, Suit::Hearts),
                card(103, Rank::Two, Suit::Hearts),
            ],
        );
        assert_eq!(lead.shape().tractors, vec![2]);

        let hand = Hand::with_cards(vec![
            card(1, Rank::Two, Suit::Clubs),
            card(2, Rank::Two, Suit::Clubs),
            card(3, Rank::Two, Suit::Diamonds),
            card(4, Rank::Two, Suit::Diamonds),
            card(5, Rank::Ace, Suit::Spades),
            card(6, Rank::Ace, Suit::Spades),
            card(7, Rank::Nine, Suit::Hearts),
        ]);

        let with_peer = [
            card(3, Rank::Two, Suit::Diamonds),
            card(4, Rank::Two, Suit::Diamonds),
            card(5, Rank::Ace, Suit::Spades),
            card(6, Rank::Ace, Suit::Spades),
        ];
        let complements = check_follow(&order, &lead, &hand, &with_peer).unwrap();
        assert_eq!(complements[0].required, UnitKind::Tractor(2));

        let no_tractor = [
            card(1, Rank::Two, Suit::Clubs),
            card(2, Rank::Two, Suit::Clubs),
            card(3, Rank::Two, Suit::Diamonds),
            card(4, Rank::Two, Suit::Diamonds),
        ];
        let failure = check_follow(&order, &lead, &hand, &no_tractor).unwrap_err();
        assert_eq!(failure.title, "Illegal format for tractor");
        assert_eq!(ids(&failure.hint), vec![1, 2, 5, 6]);
    }

    #[test]
    fn any_two_of_three_copies_make_a_pair() {
        let order = hearts_trump();
        let lead = Format::create(
            &order,
            &[
                card(100, Rank::Nine, Suit::Spades),
                card(101, Rank::Nine, Suit::Spades),
            ],
        );
        let hand = Hand::with_cards(vec![
            card(1, Rank::King, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
            card(3, Rank::King, Suit::Spades),
            card(4, Rank::Five, Suit::Clubs),
        ]);
        let played = [
            card(1, Rank::King, Suit::Spades),
            card(3, Rank::King, Suit::Spades),
        ];
        assert_eq!(Format::create(&order, &played).pairs().len(), 1);

        let complements = check_follow(&order, &lead, &hand, &played).unwrap();
        assert_eq!(complements.len(), 1);
        assert_eq!(complements[0].required, UnitKind::Pair);
        assert_eq!(ids(&complements[0].matched.cards()), vec![1, 3]);
    }

    #[test]
    fn triplicated_faces_form_tractors_from_any_copies() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        let hand = Hand::with_cards(vec![
            card(1, Rank::King, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
            card(3, Rank::King, Suit::Spades),
            card(4, Rank::Queen, Suit::Spades),
            card(5, Rank::Queen, Suit::Spades),
            card(6, Rank::Queen, Suit::Spades),
        ]);
        let played = [
            card(2, Rank::King, Suit::Spades),
            card(3, Rank::King, Suit::Spades),
            card(4, Rank::Queen, Suit::Spades),
            card(6, Rank::Queen, Suit::Spades),
        ];
        let complements = check_follow(&order, &lead, &hand, &played).unwrap();
        assert_eq!(complements[0].required, UnitKind::Tractor(2));
        assert_eq!(ids(&complements[0].matched.cards()), vec![2, 3, 4, 6]);

        let broken = [
            card(1, Rank::King, Suit::Spades),
            card(2, Rank::King, Suit::Spades),
            card(3, Rank::King, Suit::Spades),
            card(4, Rank::Queen, Suit::Spades),
        ];
        let failure = check_follow(&order, &lead, &hand, &broken).unwrap_err();
        assert_eq!(failure.title, "Illegal format for tractor");
    }

    #[test]
    fn wrong_count_is_rejected_with_a_suggestion() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        let hand = two_pair_hand();
        let failure =
            check_follow(&order, &lead, &hand, &[card(1, Rank::King, Suit::Spades)]).unwrap_err();
        assert_eq!(failure.title, "Wrong number of cards");
        assert_eq!(failure.hint.len(), 4);
    }

    #[test]
    fn required_cards_returns_whole_family_when_short() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        let hand = Hand::with_cards(vec![
            card(1, Rank::King, Suit::Spades),
            card(5, Rank::Five, Suit::Diamonds),
        ]);
        assert_eq!(ids(&required_cards(&order, &lead, &hand)), vec![1]);
    }

    #[test]
    fn suggestion_is_always_a_legal_follow() {
        let order = hearts_trump();
        let lead = spade_tractor_lead(&order);
        for hand in [
            two_pair_hand(),
            Hand::with_cards(vec![
                card(1, Rank::King, Suit::Spades),
                card(5, Rank::Five, Suit::Diamonds),
                card(6, Rank::Eight, Suit::Clubs),
                card(7, Rank::Ace, Suit::Clubs),
                card(8, Rank::Ace, Suit::Hearts),
            ]),
        ] {
            let suggestion = suggest_follow(&order, &lead, &hand);
            assert_eq!(suggestion.len(), 4);
            assert!(check_follow(&order, &lead, &hand, &suggestion).is_ok());
        }
    }

    #[test]
    fn mixed_family_lead_is_rejected() {
        let order = Order::new(Rank::Two, Suit::Clubs).unwrap();
        let played = [
            card(1, Rank::Ace, Suit::Spades),
            card(2, Rank::Nine, Suit::Hearts),
            card(3, Rank::King, Suit::Spades),
        ];
        let failure = check_lead(&order, &played).unwrap_err();
        assert_eq!(failure.title, "Illegal lead");
        assert_eq!(ids(&failure.hint), vec![1, 3]);

        let toss = [card(1, Rank::Ace, Suit::Spades), card(3, Rank::King, Suit::Spades)];
        let format = check_lead(&order, &toss).unwrap();
        assert!(format.is_toss());
    }
}
