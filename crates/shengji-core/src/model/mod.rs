pub mod card;
pub mod deck;
pub mod format;
pub mod hand;
pub mod legality;
pub mod order;
pub mod player;
pub mod rank;
pub mod round;
pub mod score;
pub mod suit;
pub mod trick;
pub mod unit;
