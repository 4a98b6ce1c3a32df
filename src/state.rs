use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Repositories;
use crate::services::media_service::MediaStore;
use crate::services::next_match_service::NextMatchService;
use crate::services::token_service::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub tokens: Arc<TokenService>,
    pub media: Arc<MediaStore>,
    pub next_match: NextMatchService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(repos: Repositories, media: MediaStore, config: AppConfig) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_days);
        let next_match = NextMatchService::new(repos.next_match.clone());
        AppState {
            repos,
            tokens: Arc::new(tokens),
            media: Arc::new(media),
            next_match,
            config: Arc::new(config),
        }
    }
}
