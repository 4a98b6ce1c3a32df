use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

pub const POSITIONS: [&str; 4] = ["Portiere", "Difensore", "Centrocampista", "Attaccante"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub goals: i64,
    #[serde(default)]
    pub matches: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Player as returned by the API (`id` instead of the storage key).
#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub id: i64,
    pub name: String,
    pub number: i64,
    pub position: String,
    pub height: String,
    pub goals: i64,
    pub matches: i64,
    pub description: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl From<Player> for PlayerResponse {
    fn from(p: Player) -> Self {
        PlayerResponse {
            id: p.id,
            name: p.name,
            number: p.number,
            position: p.position,
            height: p.height,
            goals: p.goals,
            matches: p.matches,
            description: p.description,
            image: p.image,
            created_at: p.created_at,
        }
    }
}

/// Validated text fields of a create/update form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFields {
    pub name: String,
    pub number: i64,
    pub position: String,
    pub height: String,
    pub goals: i64,
    pub matches: i64,
    pub description: String,
}

impl PlayerFields {
    pub fn apply_to(self, player: &mut Player) {
        player.name = self.name;
        player.number = self.number;
        player.position = self.position;
        player.height = self.height;
        player.goals = self.goals;
        player.matches = self.matches;
        player.description = self.description;
    }

    pub fn into_player(self, image: String) -> Player {
        let mut player = Player {
            id: 0,
            name: String::new(),
            number: 0,
            position: String::new(),
            height: String::new(),
            goals: 0,
            matches: 0,
            description: String::new(),
            image,
            created_at: Utc::now(),
        };
        self.apply_to(&mut player);
        player
    }
}

pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_data("Il nome è obbligatorio"));
    }
    Ok(name.to_string())
}

pub fn validate_position(position: &str) -> Result<String> {
    let position = position.trim();
    if position.is_empty() || POSITIONS.contains(&position) {
        Ok(position.to_string())
    } else {
        Err(AppError::invalid_data(format!(
            "Position must be one of {} or empty",
            POSITIONS.join(", ")
        )))
    }
}

/// Blank means 0; anything else must be a non-negative integer.
pub fn parse_count(field: &str, raw: Option<&str>) -> Result<i64> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(0);
    }
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(AppError::invalid_data(format!(
            "{} must be a non-negative integer",
            field
        ))),
    }
}
