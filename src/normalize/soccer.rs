use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::id_string;
use crate::broker::{MatchSnapshot, NormalizedState, Score};
use crate::utils::error::NormalizeError;

// ESPN scoreboard shapes. Every field is optional so that an explicit
// `null` reads like a missing field instead of failing the record.

#[derive(Debug, Deserialize)]
struct EspnEvent {
    id: Option<Value>,
    competitions: Option<Vec<EspnCompetition>>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    competitors: Option<Vec<EspnCompetitor>>,
    status: Option<EspnStatus>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct EspnCompetitor {
    #[serde(rename = "homeAway")]
    home_away: Option<String>,
    team: Option<EspnTeam>,
    score: Option<Value>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct EspnTeam {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    kind: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    description: Option<String>,
    #[serde(rename = "shortDetail")]
    short_detail: Option<String>,
}

/// Normalizes an ESPN soccer scoreboard document.
pub fn normalize_soccer(raw: &Value) -> Result<NormalizedState, NormalizeError> {
    let events = raw
        .get("events")
        .and_then(Value::as_array)
        .ok_or_else(|| NormalizeError::Malformed("scoreboard has no events list".to_string()))?;

    let matches = events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| match parse_event(event) {
            Ok(snapshot) => Some(snapshot),
            Err(reason) => {
                warn!(index, reason = %reason, "Skipping malformed soccer event");
                None
            }
        })
        .collect();

    Ok(NormalizedState::new(matches))
}

fn parse_event(raw: &Value) -> Result<MatchSnapshot, String> {
    let event = EspnEvent::deserialize(raw).map_err(|e| e.to_string())?;
    let competition = event
        .competitions
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or("event has no competitions")?;

    let competitors = competition.competitors.unwrap_or_default();
    let home = pick_side(&competitors, "home", 0);
    let away = pick_side(&competitors, "away", 1);

    let (status, time) = competition
        .status
        .and_then(|s| s.kind)
        .map(|kind| {
            (
                kind.description.unwrap_or_default(),
                kind.short_detail.unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    Ok(MatchSnapshot {
        id: id_string(event.id.as_ref()),
        home_team: team_name(&home, "Home"),
        away_team: team_name(&away, "Away"),
        home_score: Score::Goals(goals(home.score.as_ref())?),
        away_score: Score::Goals(goals(away.score.as_ref())?),
        status,
        time,
    })
}

/// The competitor flagged with `side`, else the one at `fallback`, else an
/// anonymous competitor.
fn pick_side(competitors: &[EspnCompetitor], side: &str, fallback: usize) -> EspnCompetitor {
    competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some(side))
        .or_else(|| competitors.get(fallback))
        .cloned()
        .unwrap_or_default()
}

fn team_name(competitor: &EspnCompetitor, default: &str) -> String {
    competitor
        .team
        .as_ref()
        .and_then(|t| t.display_name.clone())
        .unwrap_or_else(|| default.to_string())
}

/// Missing or empty scores count as zero; anything else must be a
/// non-negative integer.
fn goals(score: Option<&Value>) -> Result<u32, String> {
    match score {
        None | Some(Value::Null) => Ok(0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("score {s:?} is not a number")),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|g| u32::try_from(g).ok())
            .ok_or_else(|| format!("score {n} is out of range")),
        Some(other) => Err(format!("score {other} is not a number")),
    }
}
