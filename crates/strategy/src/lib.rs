pub mod inference;
pub mod sentiment;
pub mod services;
pub mod sizing;
