use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjuryStatus {
    #[default]
    Infortunato,
    #[serde(rename = "In Dubbio")]
    InDubbio,
    Recuperato,
}

impl InjuryStatus {
    /// Blank means the default status.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim).unwrap_or("") {
            "" | "Infortunato" => Ok(InjuryStatus::Infortunato),
            "In Dubbio" => Ok(InjuryStatus::InDubbio),
            "Recuperato" => Ok(InjuryStatus::Recuperato),
            other => Err(AppError::invalid_data(format!(
                "Invalid status '{}': expected Infortunato, In Dubbio or Recuperato",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Injury {
    #[serde(rename = "_id")]
    pub id: i64,
    /// Free text; may name a player that is not on the roster.
    pub player_name: String,
    pub injury: String,
    #[serde(default)]
    pub expected_return: String,
    #[serde(default)]
    pub status: InjuryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InjuryResponse {
    pub id: i64,
    pub player_name: String,
    pub injury: String,
    pub expected_return: String,
    pub status: InjuryStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Injury> for InjuryResponse {
    fn from(i: Injury) -> Self {
        InjuryResponse {
            id: i.id,
            player_name: i.player_name,
            injury: i.injury,
            expected_return: i.expected_return,
            status: i.status,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InjuryRequest {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub injury: String,
    #[serde(default)]
    pub expected_return: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl InjuryRequest {
    pub fn validate(self) -> Result<(String, String, String, InjuryStatus)> {
        let player_name = self.player_name.trim().to_string();
        let injury = self.injury.trim().to_string();
        if player_name.is_empty() || injury.is_empty() {
            return Err(AppError::invalid_data(
                "Nome giocatore e infortunio obbligatori",
            ));
        }
        let status = InjuryStatus::parse(self.status.as_deref())?;
        let expected_return = self.expected_return.unwrap_or_default().trim().to_string();
        Ok((player_name, injury, expected_return, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_display_name() {
        assert_eq!(InjuryStatus::parse(Some("In Dubbio")).unwrap(), InjuryStatus::InDubbio);
        assert_eq!(InjuryStatus::parse(None).unwrap(), InjuryStatus::Infortunato);
        assert!(InjuryStatus::parse(Some("Squalificato")).is_err());
        assert_eq!(
            serde_json::to_string(&InjuryStatus::InDubbio).unwrap(),
            "\"In Dubbio\""
        );
    }

    #[test]
    fn request_requires_name_and_injury() {
        let missing = InjuryRequest {
            player_name: "Antonio Graniti".to_string(),
            injury: "  ".to_string(),
            expected_return: None,
            status: None,
        };
        assert!(missing.validate().is_err());

        let ok = InjuryRequest {
            player_name: " Antonio Graniti ".to_string(),
            injury: "Distorsione caviglia".to_string(),
            expected_return: Some("2 settimane".to_string()),
            status: Some("Recuperato".to_string()),
        };
        let (name, _, ret, status) = ok.validate().unwrap();
        assert_eq!(name, "Antonio Graniti");
        assert_eq!(ret, "2 settimane");
        assert_eq!(status, InjuryStatus::Recuperato);
    }
}
