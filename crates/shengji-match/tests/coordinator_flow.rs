use shengji_core::game::config::RuleConfig;
use shengji_core::model::card::CardId;
use shengji_core::model::player::PlayerPosition;
use shengji_core::model::round::{PlayOutcome, RoundPhase};
use shengji_core::model::suit::Suit;
use shengji_match::{Envelope, MatchCoordinator, MatchEvent};
use std::sync::Arc;
use std::thread;

const MATCH: &str = "table-1";

fn declare_and_bury(coordinator: &MatchCoordinator) -> PlayerPosition {
    let (seat, _) = PlayerPosition::LOOP
        .iter()
        .flat_map(|seat| Suit::ALL.iter().map(move |suit| (*seat, *suit)))
        .find(|(seat, suit)| coordinator.declare(MATCH, *seat, *suit).is_ok())
        .expect("someone can declare");
    let view = coordinator.view(MATCH, seat).unwrap();
    let own = view
        .seats
        .iter()
        .find(|hand| hand.seat == seat)
        .expect("declarer seat");
    let buried: Vec<CardId> = own.cards.iter().take(8).map(|card| card.id).collect();
    coordinator.bury(MATCH, seat, &buried).unwrap();
    seat
}

fn lead_ids(coordinator: &MatchCoordinator, seat: PlayerPosition) -> Vec<CardId> {
    let view = coordinator.view(MATCH, seat).unwrap();
    let own = view.seats.iter().find(|hand| hand.seat == seat).unwrap();
    vec![own.cards[0].id]
}

#[tokio::test]
async fn subscribers_receive_every_event_then_the_sentinel() {
    let coordinator = MatchCoordinator::new();
    coordinator
        .create_match(MATCH, RuleConfig::default(), PlayerPosition::North, 31)
        .unwrap();
    let mut first = coordinator.subscribe(MATCH).unwrap();
    let mut second = coordinator.subscribe(MATCH).unwrap();

    let declarer = declare_and_bury(&coordinator);
    let leader = coordinator
        .view(MATCH, declarer)
        .unwrap()
        .expected_to_play
        .unwrap();
    let ids = lead_ids(&coordinator, leader);
    assert_eq!(
        coordinator.play(MATCH, leader, &ids).unwrap(),
        PlayOutcome::Played
    );
    coordinator.close_match(MATCH).unwrap();

    for subscription in [&mut first, &mut second] {
        let mut received = Vec::new();
        while let Some(event) = subscription.recv().await {
            received.push(event);
        }
        assert_eq!(received.len(), 3);
        assert!(matches!(received[0], MatchEvent::Declared { seat, .. } if seat == declarer));
        assert!(matches!(received[1], MatchEvent::KittyBuried { .. }));
        match &received[2] {
            MatchEvent::Played { seat, cards, .. } => {
                assert_eq!(*seat, leader);
                assert_eq!(cards.iter().map(|card| card.id).collect::<Vec<_>>(), ids);
            }
            other => panic!("expected a play, got {other:?}"),
        }
        assert_eq!(subscription.recv().await, None);
    }
}

#[test]
fn concurrent_plays_are_serialized_per_match() {
    let coordinator = Arc::new(MatchCoordinator::new());
    coordinator
        .create_match(MATCH, RuleConfig::default(), PlayerPosition::East, 8)
        .unwrap();
    let mut events = coordinator.subscribe(MATCH).unwrap();
    let declarer = declare_and_bury(&coordinator);
    let leader = coordinator
        .view(MATCH, declarer)
        .unwrap()
        .expected_to_play
        .unwrap();
    let ids = lead_ids(&coordinator, leader);

    // The same lead submitted from several connections lands exactly once.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let ids = ids.clone();
            thread::spawn(move || coordinator.play(MATCH, leader, &ids).is_ok())
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(accepted, 1);

    let mut plays = 0;
    while let Some(Envelope::Update(event)) = events.try_recv() {
        if matches!(event, MatchEvent::Played { .. }) {
            plays += 1;
        }
    }
    assert_eq!(plays, 1);
}

#[test]
fn illegal_play_carries_a_hint_and_a_full_deal_can_be_scored() {
    let coordinator = MatchCoordinator::new();
    coordinator
        .create_match(MATCH, RuleConfig::default(), PlayerPosition::South, 12)
        .unwrap();
    declare_and_bury(&coordinator);

    loop {
        let view = coordinator.view(MATCH, PlayerPosition::North).unwrap();
        if view.phase == RoundPhase::Finished {
            break;
        }
        let seat = view.expected_to_play.unwrap();
        let ids = match coordinator.play(MATCH, seat, &lead_ids(&coordinator, seat)) {
            Ok(_) => continue,
            Err(error) => {
                let failure = error.legality().expect("only legality failures here");
                assert!(!failure.hint.is_empty());
                let own_view = coordinator.view(MATCH, seat).unwrap();
                let own = own_view.seats.iter().find(|hand| hand.seat == seat).unwrap();
                let held: Vec<CardId> = own.cards.iter().map(|card| card.id).collect();
                assert!(failure.hint.iter().all(|card| held.contains(&card.id)));
                failure.hint.iter().map(|card| card.id).collect::<Vec<_>>()
            }
        };
        coordinator.play(MATCH, seat, &ids).unwrap();
    }

    let outcome = coordinator.end_deal(MATCH).unwrap();
    assert_eq!(outcome.deal_number, 1);
    let snapshot = coordinator.snapshot(MATCH).unwrap();
    assert_eq!(snapshot.deal_number, 2);
    assert_eq!(snapshot.levels, outcome.levels);
}
