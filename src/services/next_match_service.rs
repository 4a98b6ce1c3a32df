use std::sync::Arc;

use crate::database::NextMatchRepository;
use crate::errors::Result;
use crate::models::next_match::{enforce_single_mvp, NextMatchState, NextMatchUpdate};

/// Reads and replaces the next-match singleton. It offers no way to delete
/// the record.
#[derive(Clone)]
pub struct NextMatchService {
    repo: Arc<dyn NextMatchRepository>,
}

impl NextMatchService {
    pub fn new(repo: Arc<dyn NextMatchRepository>) -> Self {
        NextMatchService { repo }
    }

    /// Current state, or the defaults when nothing was ever saved. Never
    /// writes.
    pub async fn get(&self) -> Result<NextMatchState> {
        Ok(self
            .repo
            .load()
            .await?
            .map(|record| NextMatchState::from_record(&record))
            .unwrap_or_default())
    }

    pub async fn upsert(&self, mut update: NextMatchUpdate) -> Result<NextMatchState> {
        enforce_single_mvp(&mut update.team1_lineup, &mut update.team2_lineup);

        let created = self.repo.save(&update.into_record()).await?;
        if created {
            tracing::info!("Next match record created");
        } else {
            tracing::info!("Next match record updated");
        }

        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::models::next_match::{
        Lineup, NextMatchPayload, NextMatchRecord, DEFAULT_MATCH_DATE, LINEUP_SIZE,
    };
    use serde_json::{json, Value};

    fn service() -> (NextMatchService, Arc<dyn NextMatchRepository>) {
        let repo: Arc<dyn NextMatchRepository> = Arc::new(MemoryStore::default());
        (NextMatchService::new(repo.clone()), repo)
    }

    fn update(body: Value) -> NextMatchUpdate {
        let payload: NextMatchPayload = serde_json::from_value(body).unwrap();
        NextMatchUpdate::try_from(payload).unwrap()
    }

    #[tokio::test]
    async fn fresh_store_reads_defaults_without_creating_the_record() {
        let (service, repo) = service();
        let state = service.get().await.unwrap();

        assert_eq!(state.match_date, DEFAULT_MATCH_DATE);
        assert_eq!(state.team1_score, None);
        assert_eq!(state.team2_score, None);
        assert_eq!(state.team1_lineup, Lineup::default());
        assert_eq!(state.team2_lineup, Lineup::default());
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_after_write_returns_the_normalized_state() {
        let (service, _) = service();
        let written = service
            .upsert(update(json!({
                "match_date": "24/02/2026",
                "team1_score": "2",
                "team2_score": 1,
                "team1_lineup": [{ "playerId": 7, "playerName": "Giacinto Lesce", "vote": "7,5" }],
                "team2_lineup": "not an array"
            })))
            .await
            .unwrap();

        assert_eq!(written.team1_score, Some(2));
        assert_eq!(written.team1_lineup.slots()[0].vote, "7.5");
        assert_eq!(written.team2_lineup, Lineup::default());
        assert_eq!(service.get().await.unwrap(), written);
    }

    #[tokio::test]
    async fn only_the_first_seven_entries_are_kept() {
        let (service, _) = service();
        let entries: Vec<Value> = (1..=10)
            .map(|i| json!({ "playerId": i, "playerName": format!("P{}", i) }))
            .collect();
        let state = service
            .upsert(update(json!({ "team1_lineup": entries })))
            .await
            .unwrap();

        let names: Vec<&str> = state
            .team1_lineup
            .slots()
            .iter()
            .map(|s| s.player_name.as_str())
            .collect();
        assert_eq!(names, vec!["P1", "P2", "P3", "P4", "P5", "P6", "P7"]);
    }

    #[tokio::test]
    async fn empty_score_reads_back_as_null() {
        let (service, _) = service();
        service
            .upsert(update(json!({ "team1_score": 3, "team2_score": 0 })))
            .await
            .unwrap();
        let state = service
            .upsert(update(json!({ "team1_score": "", "team2_score": 0 })))
            .await
            .unwrap();
        assert_eq!(state.team1_score, None);
        assert_eq!(state.team2_score, Some(0));
    }

    #[tokio::test]
    async fn single_mvp_survives_a_save() {
        let (service, _) = service();
        let state = service
            .upsert(update(json!({
                "team1_lineup": [{ "playerId": 3, "mvp": true }],
                "team2_lineup": [{}, {}, { "playerId": 5, "mvp": true }]
            })))
            .await
            .unwrap();

        assert_eq!(state.team1_lineup.mvp_count(), 0);
        assert!(state.team2_lineup.slots()[2].mvp);
        assert_eq!(state.team2_lineup.mvp_count(), 1);
    }

    #[tokio::test]
    async fn omitted_fields_reset_instead_of_merging() {
        let (service, _) = service();
        service
            .upsert(update(json!({
                "match_date": "01/03/2026",
                "team1_score": 4,
                "team1_lineup": [{ "playerId": 1 }]
            })))
            .await
            .unwrap();
        let state = service.upsert(update(json!({}))).await.unwrap();

        assert_eq!(state.match_date, DEFAULT_MATCH_DATE);
        assert_eq!(state.team1_score, None);
        assert_eq!(state.team1_lineup, Lineup::default());
    }

    #[tokio::test]
    async fn record_stays_present_across_many_saves() {
        let (service, repo) = service();
        for len in 0..=20 {
            let entries: Vec<Value> = (0..len).map(|i| json!({ "playerId": i + 1, "mvp": true })).collect();
            let state = service
                .upsert(update(json!({ "team1_lineup": entries.clone(), "team2_lineup": entries })))
                .await
                .unwrap();
            assert_eq!(state.team1_lineup.slots().len(), LINEUP_SIZE);
            assert_eq!(state.team2_lineup.slots().len(), LINEUP_SIZE);
            assert!(state.team1_lineup.mvp_count() + state.team2_lineup.mvp_count() <= 1);
            assert!(repo.load().await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn corrupted_stored_lineups_are_served_as_empty() {
        let (service, repo) = service();
        repo.save(&NextMatchRecord {
            match_date: String::new(),
            team1_score: Some(1),
            team2_score: None,
            team1_lineup: "{{{".to_string(),
            team2_lineup: "[{\"playerId\": 2}]".to_string(),
        })
        .await
        .unwrap();

        let state = service.get().await.unwrap();
        assert_eq!(state.match_date, DEFAULT_MATCH_DATE);
        assert_eq!(state.team1_lineup, Lineup::default());
        assert_eq!(state.team2_lineup.slots()[0].player_id, Some(2));
    }
}
