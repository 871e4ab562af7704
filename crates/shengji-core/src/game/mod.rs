pub mod config;
pub mod match_state;
pub mod serialization;
