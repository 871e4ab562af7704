use super::config::RuleConfig;
use super::match_state::{MatchError, MatchState};
use crate::model::player::PlayerPosition;
use crate::model::score::LevelBoard;
use serde::{Deserialize, Serialize};

/// Enough to rebuild a match at the start of its current deal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub seed: u64,
    pub deal_number: u32,
    pub levels: [u8; 4],
    pub deal_starting_player: PlayerPosition,
    #[serde(default)]
    pub rules: RuleConfig,
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            deal_number: state.deal_number(),
            levels: *state.levels().levels(),
            deal_starting_player: state.round().starting_player(),
            rules: state.rules().clone(),
        }
    }

    pub fn restore(self) -> Result<MatchState, MatchError> {
        MatchState::with_seed_deal(
            self.rules,
            self.seed,
            self.deal_number,
            self.deal_starting_player,
            LevelBoard::from_levels(self.levels),
        )
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::MatchSnapshot;
    use crate::game::config::RuleConfig;
    use crate::game::match_state::MatchState;
    use crate::model::player::PlayerPosition;

    #[test]
    fn snapshot_serializes_to_json() {
        let state =
            MatchState::with_seed(RuleConfig::default(), PlayerPosition::North, 99).unwrap();
        let json = MatchSnapshot::to_json(&state).unwrap();
        assert!(json.contains("\"seed\": 99"));
        assert!(json.contains("\"deal_number\": 1"));
        assert!(json.contains("\"trump_rank\": \"two\""));
    }

    #[test]
    fn restore_deals_the_same_hands() {
        let state =
            MatchState::with_seed(RuleConfig::default(), PlayerPosition::West, 123).unwrap();
        let restored = MatchSnapshot::capture(&state).restore().unwrap();
        assert_eq!(restored.seed(), 123);
        assert_eq!(restored.round().starting_player(), PlayerPosition::West);
        for seat in PlayerPosition::LOOP {
            assert_eq!(
                restored.round().hand(seat).cards(),
                state.round().hand(seat).cards()
            );
        }
    }

    #[test]
    fn later_deal_is_reproduced_with_levels() {
        let json = r#"{
            "seed": 7,
            "deal_number": 3,
            "levels": [4, 2, 4, 2],
            "deal_starting_player": "East"
        }"#;

        let snapshot = MatchSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.rules, RuleConfig::default());
        let state = snapshot.clone().restore().unwrap();
        assert_eq!(state.deal_number(), 3);
        assert_eq!(state.levels().levels(), &[4, 2, 4, 2]);
        assert_eq!(MatchSnapshot::capture(&state), snapshot);
    }
}
