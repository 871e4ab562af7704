#![deny(warnings)]
pub mod broadcast;
pub mod coordinator;
pub mod error;
pub mod view;

pub use broadcast::{BroadcastError, Broadcaster, Envelope, Subscription};
pub use coordinator::{MatchCoordinator, MatchEvent};
pub use error::CoordinatorError;
pub use view::{CardView, PlayerView};
