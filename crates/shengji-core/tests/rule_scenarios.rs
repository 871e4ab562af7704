use shengji_core::game::config::RuleConfig;
use shengji_core::game::match_state::MatchState;
use shengji_core::game::serialization::MatchSnapshot;
use shengji_core::model::card::{Card, CardId};
use shengji_core::model::order::Order;
use shengji_core::model::player::PlayerPosition;
use shengji_core::model::rank::Rank;
use shengji_core::model::round::{PlayOutcome, RoundPhase, RoundState};
use shengji_core::model::suit::Suit;

fn spades(id: CardId, rank: Rank) -> Card {
    Card::new(id, rank, Suit::Spades)
}

fn ids(cards: &[Card]) -> Vec<CardId> {
    let mut ids: Vec<CardId> = cards.iter().map(|card| card.id).collect();
    ids.sort_unstable();
    ids
}

fn filler(first_id: CardId, count: usize) -> Vec<Card> {
    (0..count as CardId)
        .map(|offset| Card::new(first_id + offset, Rank::Six, Suit::Diamonds))
        .collect()
}

#[test]
fn partial_follow_allows_one_spade_plus_an_off_suit_card() {
    let order = Order::new(Rank::Two, Suit::Hearts).unwrap();
    let mut east = vec![spades(10, Rank::Nine), Card::new(11, Rank::Seven, Suit::Clubs)];
    east.push(Card::new(12, Rank::Eight, Suit::Clubs));
    let mut round = RoundState::from_hands(
        order,
        [
            vec![spades(1, Rank::Ace), spades(2, Rank::King), spades(3, Rank::Four)],
            east,
            filler(20, 3),
            filler(30, 3),
        ],
        Vec::new(),
        PlayerPosition::North,
        PlayerPosition::North,
    );
    round.play(PlayerPosition::North, &[1, 2]).unwrap();

    let rejected = round.play(PlayerPosition::East, &[11, 12]).unwrap_err();
    let failure = rejected.legality().expect("suit failure");
    assert_eq!(failure.title, "Illegal suit");
    assert_eq!(ids(&failure.hint), vec![10]);

    assert_eq!(
        round.play(PlayerPosition::East, &[10, 11]),
        Ok(PlayOutcome::Played)
    );
}

#[test]
fn tractor_lead_rejects_off_suit_cards_and_hints_both_pairs() {
    let order = Order::new(Rank::Two, Suit::Hearts).unwrap();
    let lead = vec![
        spades(1, Rank::Nine),
        spades(2, Rank::Nine),
        spades(3, Rank::Ten),
        spades(4, Rank::Ten),
    ];
    let east = vec![
        spades(11, Rank::King),
        spades(12, Rank::King),
        spades(13, Rank::Five),
        spades(14, Rank::Five),
        Card::new(15, Rank::Seven, Suit::Clubs),
        Card::new(16, Rank::Eight, Suit::Clubs),
    ];
    let mut round = RoundState::from_hands(
        order,
        [lead, east, filler(20, 6), filler(30, 6)],
        Vec::new(),
        PlayerPosition::North,
        PlayerPosition::North,
    );
    round.play(PlayerPosition::North, &[1, 2, 3, 4]).unwrap();

    let rejected = round
        .play(PlayerPosition::East, &[11, 12, 15, 16])
        .unwrap_err();
    let failure = rejected.legality().expect("legality failure");
    assert_eq!(ids(&failure.hint), vec![11, 12, 13, 14]);
    assert_eq!(round.hand(PlayerPosition::East).len(), 6);

    round.play(PlayerPosition::East, &[11, 12, 13, 14]).unwrap();
    assert_eq!(round.current_trick().current_winner(), Some(PlayerPosition::North));
}

#[test]
fn peer_tractor_of_trump_rank_pairs_wins_over_a_plain_trump_tractor() {
    let order = Order::new(Rank::Two, Suit::Spades).unwrap();
    let north = vec![
        spades(1, Rank::King),
        spades(2, Rank::King),
        spades(3, Rank::Queen),
        spades(4, Rank::Queen),
    ];
    let east = vec![
        Card::new(11, Rank::Two, Suit::Clubs),
        Card::new(12, Rank::Two, Suit::Clubs),
        Card::new(13, Rank::Two, Suit::Hearts),
        Card::new(14, Rank::Two, Suit::Hearts),
        spades(15, Rank::Ace),
        spades(16, Rank::Ace),
    ];
    let mut round = RoundState::from_hands(
        order,
        [north, east, filler(20, 6), filler(30, 6)],
        Vec::new(),
        PlayerPosition::North,
        PlayerPosition::North,
    );
    round.play(PlayerPosition::North, &[1, 2, 3, 4]).unwrap();
    round.play(PlayerPosition::East, &[13, 14, 15, 16]).unwrap();
    assert_eq!(round.current_trick().current_winner(), Some(PlayerPosition::East));
}

#[test]
fn seeded_match_plays_several_deals_and_restores_from_snapshot() {
    let mut state =
        MatchState::with_seed(RuleConfig::default(), PlayerPosition::South, 2024).unwrap();

    for _ in 0..3 {
        let round = state.round_mut();
        let (seat, suit) = PlayerPosition::LOOP
            .iter()
            .flat_map(|seat| Suit::ALL.iter().map(move |suit| (*seat, *suit)))
            .find(|(seat, suit)| round.can_declare(*seat, *suit))
            .expect("someone can declare");
        round.declare(seat, suit).unwrap();
        let buried: Vec<CardId> = round
            .hand(seat)
            .cards()
            .iter()
            .rev()
            .take(round.kitty_size())
            .map(|card| card.id)
            .collect();
        round.bury(seat, &buried).unwrap();
        while round.phase() == RoundPhase::Playing {
            let next = round.expected_to_play().unwrap();
            let play: Vec<CardId> = round
                .suggested_play(next)
                .unwrap()
                .iter()
                .map(|card| card.id)
                .collect();
            round.play(next, &play).unwrap();
        }
        let outcome = state.end_deal().unwrap();
        assert!(outcome.level_deltas.iter().any(|delta| *delta > 0) || outcome.promotion.levels == 0);
    }

    assert_eq!(state.deal_number(), 4);
    let restored = MatchSnapshot::from_json(&MatchSnapshot::to_json(&state).unwrap())
        .unwrap()
        .restore()
        .unwrap();
    assert_eq!(restored.levels(), state.levels());
    for seat in PlayerPosition::LOOP {
        assert_eq!(
            restored.round().hand(seat).cards(),
            state.round().hand(seat).cards()
        );
    }
}
