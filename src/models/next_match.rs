//! The "next match" singleton: match date, optional score and two
//! fixed-size lineups.
//!
//! Two shapes exist. [`NextMatchRecord`] is what the store holds, with the
//! lineups kept as serialized JSON text. [`NextMatchState`] is what the API
//! returns: always two lineups of exactly [`LINEUP_SIZE`] slots, whatever
//! the stored text looks like. Client payloads are coerced into a
//! [`NextMatchUpdate`] before they reach the service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, Result};

pub const LINEUP_SIZE: usize = 7;
pub const DEFAULT_MATCH_DATE: &str = "17/02/2026";
/// Fixed storage key of the only next-match document.
pub const NEXT_MATCH_KEY: i64 = 1;

/// Decodes JSON text, falling back to `T::default()` on any failure.
///
/// This is the only place where malformed stored data is tolerated.
pub fn decode_lenient<T: DeserializeOwned + Default>(raw: &str) -> T {
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("discarding malformed stored value: {}", e);
            T::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineupSlot {
    #[serde(rename = "playerId")]
    pub player_id: Option<i64>,
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub vote: String,
    pub mvp: bool,
}

impl LineupSlot {
    /// Coerces one client- or store-provided slot. Anything that is not an
    /// object becomes an empty slot; unknown fields are ignored.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return LineupSlot::default();
        };
        LineupSlot {
            player_id: obj.get("playerId").and_then(coerce_player_id),
            player_name: obj.get("playerName").map(coerce_text).unwrap_or_default(),
            vote: obj
                .get("vote")
                .map(|v| normalize_vote(&coerce_text(v)))
                .unwrap_or_default(),
            mvp: obj.get("mvp").map(truthy).unwrap_or(false),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        *self == LineupSlot::default()
    }
}

fn coerce_player_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Spellings of "senza voto" (played too little to be graded).
const UNGRADED_TOKENS: [&str; 5] = ["s.v.", "s.v", "sv", "n.v.", "nv"];
/// Canonical form of every [`UNGRADED_TOKENS`] spelling.
pub const UNGRADED_VOTE: &str = "s.v.";

/// Maps a vote to its canonical token, or `""` when it is not a grade.
///
/// The vocabulary:
/// - grades from 1 to 10 in quarter steps (`"6"`, `"6.25"`, `"6.5"`,
///   `"6.75"`), with a comma accepted as decimal separator;
/// - whole grades with a `+`/`-` suffix (`"6+"`, `"5-"`);
/// - `"s.v."` for an ungraded player, in any of its common spellings.
pub fn normalize_vote(raw: &str) -> String {
    let raw = raw.trim().replace(',', ".");
    if raw.is_empty() {
        return String::new();
    }
    if UNGRADED_TOKENS.contains(&raw.to_ascii_lowercase().as_str()) {
        return UNGRADED_VOTE.to_string();
    }

    if let Some(base) = raw.strip_suffix('+').or_else(|| raw.strip_suffix('-')) {
        let suffix = &raw[base.len()..];
        return match base.trim().parse::<u8>() {
            Ok(grade) if (1..=10).contains(&grade) => format!("{}{}", grade, suffix),
            _ => String::new(),
        };
    }

    match raw.parse::<f64>() {
        Ok(grade) if (1.0..=10.0).contains(&grade) && (grade * 4.0).fract() == 0.0 => {
            let text = format!("{:.2}", grade);
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => String::new(),
    }
}

/// Exactly [`LINEUP_SIZE`] slots, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lineup(pub [LineupSlot; LINEUP_SIZE]);

impl Lineup {
    /// Keeps the first seven entries, pads the rest with empty slots.
    pub fn from_values(values: &[Value]) -> Self {
        let mut lineup = Lineup::default();
        for (slot, value) in lineup.0.iter_mut().zip(values.iter()) {
            *slot = LineupSlot::from_value(value);
        }
        lineup
    }

    /// Accepts an array, or JSON text holding one. Anything else is empty.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(values) => Lineup::from_values(values),
            Value::String(raw) => Lineup::decode(raw),
            _ => Lineup::default(),
        }
    }

    /// Parses the stored representation.
    pub fn decode(raw: &str) -> Self {
        let values: Vec<Value> = decode_lenient(raw);
        Lineup::from_values(&values)
    }

    /// The stored representation.
    pub fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn slots(&self) -> &[LineupSlot] {
        &self.0
    }

    #[cfg(test)]
    pub fn mvp_count(&self) -> usize {
        self.0.iter().filter(|s| s.mvp).count()
    }
}

/// Leaves at most one MVP across both lineups: the last flagged slot in
/// team1-then-team2 order wins.
pub fn enforce_single_mvp(team1: &mut Lineup, team2: &mut Lineup) {
    let mut slots: Vec<&mut LineupSlot> = team1.0.iter_mut().chain(team2.0.iter_mut()).collect();
    let Some(winner) = slots.iter().rposition(|s| s.mvp) else {
        return;
    };
    for (i, slot) in slots.iter_mut().enumerate() {
        slot.mvp = i == winner;
    }
}

/// The stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct NextMatchRecord {
    pub match_date: String,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub team1_lineup: String,
    pub team2_lineup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextMatchState {
    pub match_date: String,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub team1_lineup: Lineup,
    pub team2_lineup: Lineup,
}

impl Default for NextMatchState {
    fn default() -> Self {
        NextMatchState {
            match_date: DEFAULT_MATCH_DATE.to_string(),
            team1_score: None,
            team2_score: None,
            team1_lineup: Lineup::default(),
            team2_lineup: Lineup::default(),
        }
    }
}

impl NextMatchState {
    pub fn from_record(record: &NextMatchRecord) -> Self {
        let mut team1_lineup = Lineup::decode(&record.team1_lineup);
        let mut team2_lineup = Lineup::decode(&record.team2_lineup);
        enforce_single_mvp(&mut team1_lineup, &mut team2_lineup);

        let match_date = match record.match_date.trim() {
            "" => DEFAULT_MATCH_DATE.to_string(),
            date => date.to_string(),
        };

        NextMatchState {
            match_date,
            team1_score: record.team1_score.filter(|s| *s >= 0),
            team2_score: record.team2_score.filter(|s| *s >= 0),
            team1_lineup,
            team2_lineup,
        }
    }
}

/// Request body as the client sends it; every field is optional and loosely
/// typed.
#[derive(Debug, Default, Deserialize)]
pub struct NextMatchPayload {
    #[serde(default)]
    pub match_date: Option<Value>,
    #[serde(default)]
    pub team1_score: Option<Value>,
    #[serde(default)]
    pub team2_score: Option<Value>,
    #[serde(default)]
    pub team1_lineup: Option<Value>,
    #[serde(default)]
    pub team2_lineup: Option<Value>,
}

/// A complete replacement of the next-match state. Omitted fields carry
/// their defaults, never the previously stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct NextMatchUpdate {
    pub match_date: String,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub team1_lineup: Lineup,
    pub team2_lineup: Lineup,
}

impl Default for NextMatchUpdate {
    fn default() -> Self {
        let state = NextMatchState::default();
        NextMatchUpdate {
            match_date: state.match_date,
            team1_score: state.team1_score,
            team2_score: state.team2_score,
            team1_lineup: state.team1_lineup,
            team2_lineup: state.team2_lineup,
        }
    }
}

impl TryFrom<NextMatchPayload> for NextMatchUpdate {
    type Error = AppError;

    fn try_from(payload: NextMatchPayload) -> Result<Self> {
        let match_date = match payload.match_date.as_ref().map(coerce_text) {
            Some(date) if !date.is_empty() => date,
            _ => DEFAULT_MATCH_DATE.to_string(),
        };

        Ok(NextMatchUpdate {
            match_date,
            team1_score: parse_score("team1_score", payload.team1_score.as_ref())?,
            team2_score: parse_score("team2_score", payload.team2_score.as_ref())?,
            team1_lineup: payload.team1_lineup.as_ref().map(Lineup::from_json).unwrap_or_default(),
            team2_lineup: payload.team2_lineup.as_ref().map(Lineup::from_json).unwrap_or_default(),
        })
    }
}

impl NextMatchUpdate {
    pub fn into_record(self) -> NextMatchRecord {
        NextMatchRecord {
            match_date: self.match_date,
            team1_score: self.team1_score,
            team2_score: self.team2_score,
            team1_lineup: self.team1_lineup.encode(),
            team2_lineup: self.team2_lineup.encode(),
        }
    }
}

/// Absent, null and `""` mean "no score"; otherwise a non-negative integer
/// (number or numeric string) is required.
pub fn parse_score(field: &str, value: Option<&Value>) -> Result<Option<i64>> {
    let invalid = || AppError::invalid_data(format!("{} must be a non-negative integer", field));
    let score = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(_) => None,
    };
    score.filter(|s| *s >= 0).map(Some).ok_or_else(invalid)
}
