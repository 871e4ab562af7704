use crate::game::config::{RuleConfig, RuleError};
use crate::model::deck::Deck;
use crate::model::player::{PlayerPosition, Team};
use crate::model::round::{DealError, DealSettlement, RoundState};
use crate::model::score::{LevelBoard, Promotion, Side};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MatchState {
    rules: RuleConfig,
    levels: LevelBoard,
    deal_number: u32,
    current_round: RoundState,
    rng: StdRng,
    seed: u64,
}

/// Everything that changed when a deal was scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealOutcome {
    pub deal_number: u32,
    pub settlement: DealSettlement,
    pub promotion: Promotion,
    pub winning_team: Team,
    /// Levels gained by each seat, after clamping.
    pub level_deltas: [u8; 4],
    pub levels: [u8; 4],
    pub next_starting_player: PlayerPosition,
    pub match_winner: Option<Team>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error(transparent)]
    Deal(#[from] DealError),
    #[error("match already won by {0}")]
    MatchOver(Team),
}

impl MatchState {
    pub fn new(rules: RuleConfig, starting_player: PlayerPosition) -> Result<Self, MatchError> {
        let seed: u64 = rand::random();
        Self::with_seed(rules, starting_player, seed)
    }

    pub fn with_seed(
        rules: RuleConfig,
        starting_player: PlayerPosition,
        seed: u64,
    ) -> Result<Self, MatchError> {
        let levels = LevelBoard::new(rules.starting_level);
        Self::with_seed_deal(rules, seed, 1, starting_player, levels)
    }

    /// Rebuilds the match at the start of `deal_number`; the rng is advanced
    /// past the shuffles of earlier deals so the same cards come out.
    pub fn with_seed_deal(
        rules: RuleConfig,
        seed: u64,
        deal_number: u32,
        starting_player: PlayerPosition,
        levels: LevelBoard,
    ) -> Result<Self, MatchError> {
        rules.validate()?;
        let normalized_deal = deal_number.max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 1..normalized_deal {
            let _ = Deck::shuffled(rules.decks, &mut rng);
        }

        let deck = Deck::shuffled(rules.decks, &mut rng);
        let current_round =
            RoundState::deal(&deck, rules.trump_rank, starting_player, rules.kitty_size)?;

        Ok(Self {
            rules,
            levels,
            deal_number: normalized_deal,
            current_round,
            rng,
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn levels(&self) -> &LevelBoard {
        &self.levels
    }

    pub fn round(&self) -> &RoundState {
        &self.current_round
    }

    pub fn round_mut(&mut self) -> &mut RoundState {
        &mut self.current_round
    }

    pub fn deal_number(&self) -> u32 {
        self.deal_number
    }

    pub fn winner(&self) -> Option<Team> {
        self.levels.champion(self.rules.max_level)
    }

    /// Scores the finished deal, promotes the winning team and deals the next
    /// hand.
    pub fn end_deal(&mut self) -> Result<DealOutcome, MatchError> {
        if let Some(team) = self.winner() {
            return Err(MatchError::MatchOver(team));
        }
        let settlement = self.current_round.settlement()?;
        let promotion = Promotion::from_score(settlement.attacker_score);
        let winning_team = promotion.winner(settlement.attackers);
        let level_deltas =
            self.levels
                .apply(promotion, settlement.attackers, self.rules.max_level);

        let next_starting_player = match promotion.side {
            Side::Defenders => settlement.declarer.opposite(),
            Side::Attackers => settlement.declarer.next(),
        };

        info!(
            deal = self.deal_number,
            score = settlement.attacker_score,
            winners = %winning_team,
            levels = promotion.levels,
            "deal scored"
        );

        let deal_number = self.deal_number;
        self.deal_number += 1;
        let deck = Deck::shuffled(self.rules.decks, &mut self.rng);
        self.current_round = RoundState::deal(
            &deck,
            self.rules.trump_rank,
            next_starting_player,
            self.rules.kitty_size,
        )?;

        Ok(DealOutcome {
            deal_number,
            settlement,
            promotion,
            winning_team,
            level_deltas,
            levels: *self.levels.levels(),
            next_starting_player,
            match_winner: self.winner(),
        })
    }
}
