pub mod bootstrap;
pub mod media_service;
pub mod next_match_service;
pub mod token_service;
