pub(crate) mod auth;
pub(crate) mod comments;
pub(crate) mod extract;
pub(crate) mod injuries;
pub(crate) mod news;
pub(crate) mod next_match;
pub(crate) mod players;
pub(crate) mod upload;
pub(crate) mod users;
