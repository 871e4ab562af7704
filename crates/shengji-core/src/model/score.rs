use crate::model::player::{PlayerPosition, Team};
use crate::model::unit::Unit;
use serde::{Deserialize, Serialize};

/// Attackers need this many points to win the deal.
pub const ATTACKER_THRESHOLD: i32 = 80;
const BAND_WIDTH: i32 = 40;

/// Factor applied to the kitty's points when attackers capture it: doubles
/// once for the capturing unit and again for each pair inside it.
pub fn kitty_multiplier(capturing: &Unit) -> u32 {
    1 << (capturing.pair_count() + 1)
}

pub fn kitty_bonus(kitty_points: u32, capturing: &Unit) -> u32 {
    kitty_points * kitty_multiplier(capturing)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attackers,
    Defenders,
}

/// Which side goes up, and by how many levels, for a given attacker score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub side: Side,
    pub levels: u8,
}

impl Promotion {
    pub fn from_score(score: i32) -> Self {
        if score >= ATTACKER_THRESHOLD {
            let bands = (score - ATTACKER_THRESHOLD) / BAND_WIDTH;
            return Self {
                side: Side::Attackers,
                levels: bands.min(4) as u8,
            };
        }
        let levels = match score {
            40..=79 => 1,
            0..=39 => 2,
            -40..=-1 => 3,
            -79..=-41 => 4,
            _ => 5,
        };
        Self {
            side: Side::Defenders,
            levels,
        }
    }

    pub fn winner(self, attackers: Team) -> Team {
        match self.side {
            Side::Attackers => attackers,
            Side::Defenders => attackers.other(),
        }
    }
}

/// Current level of every seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBoard {
    levels: [u8; 4],
}

impl LevelBoard {
    pub const fn new(starting_level: u8) -> Self {
        Self {
            levels: [starting_level; 4],
        }
    }

    pub fn from_levels(levels: [u8; 4]) -> Self {
        Self { levels }
    }

    pub fn level(&self, seat: PlayerPosition) -> u8 {
        self.levels[seat.index()]
    }

    pub fn levels(&self) -> &[u8; 4] {
        &self.levels
    }

    pub fn team_level(&self, team: Team) -> u8 {
        team.members()
            .iter()
            .map(|seat| self.level(*seat))
            .min()
            .unwrap_or(0)
    }

    /// Promotes the winning team, clamping at `max_level`, and returns the
    /// change applied to each seat.
    pub fn apply(&mut self, promotion: Promotion, attackers: Team, max_level: u8) -> [u8; 4] {
        let winners = promotion.winner(attackers);
        let mut deltas = [0u8; 4];
        for seat in winners.members() {
            let before = self.levels[seat.index()];
            let after = before.saturating_add(promotion.levels).min(max_level).max(before);
            self.levels[seat.index()] = after;
            deltas[seat.index()] = after - before;
        }
        deltas
    }

    /// The first team whose members have all reached `max_level`.
    pub fn champion(&self, max_level: u8) -> Option<Team> {
        [Team::NorthSouth, Team::EastWest]
            .into_iter()
            .find(|team| self.team_level(*team) >= max_level)
    }
}
