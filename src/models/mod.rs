pub mod injury;
pub mod news;
pub mod next_match;
pub mod player;
pub mod user;
