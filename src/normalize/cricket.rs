use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use super::{id_string, is_truthy, plain};
use crate::broker::{MatchSnapshot, NormalizedState, Score, Scorecard, TeamCard};
use crate::utils::error::NormalizeError;

/// Keys under which CricAPI has been seen to return the match list.
const RECORD_KEYS: [&str; 3] = ["data", "matches", "result"];

const EMPTY_INNINGS: &str = "0/0 (0.0)";

#[derive(Debug, Deserialize)]
struct CricMatch {
    id: Option<Value>,
    name: Option<String>,
    #[serde(rename = "matchType")]
    match_type: Option<String>,
    status: Option<String>,
    venue: Option<String>,
    teams: Option<Vec<String>>,
    #[serde(rename = "teamInfo")]
    team_info: Option<Vec<Option<TeamInfo>>>,
    score: Option<Vec<Value>>,
    #[serde(rename = "dateTimeGMT")]
    date_time_gmt: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TeamInfo {
    name: Option<String>,
    shortname: Option<String>,
    img: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Innings {
    r: Option<Value>,
    w: Option<Value>,
    o: Option<Value>,
    runs: Option<Value>,
    wickets: Option<Value>,
    overs: Option<Value>,
    inning: Option<String>,
}

impl Innings {
    fn is_empty(&self) -> bool {
        self.r.is_none()
            && self.w.is_none()
            && self.o.is_none()
            && self.runs.is_none()
            && self.wickets.is_none()
            && self.overs.is_none()
            && self.inning.is_none()
    }

    /// `"{runs}/{wickets} ({overs})"`, preferring the short field names.
    fn summary(&self) -> String {
        let runs = self.r.as_ref().or(self.runs.as_ref()).map_or("0".into(), plain);
        let wickets = self.w.as_ref().or(self.wickets.as_ref()).map_or("0".into(), plain);
        let overs = self.o.as_ref().or(self.overs.as_ref()).map_or("0".into(), plain);
        format!("{runs}/{wickets} ({overs})")
    }
}

/// Normalizes a CricAPI `currentMatches` document into match summaries plus
/// per-match scorecards.
pub fn normalize_cricket(raw: &Value) -> Result<NormalizedState, NormalizeError> {
    let records = match_list(raw)?;

    let mut matches = Vec::with_capacity(records.len());
    let mut cards = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match parse_match(record) {
            Ok((snapshot, card)) => {
                matches.push(snapshot);
                cards.push(card);
            }
            Err(reason) => warn!(index, reason = %reason, "Skipping malformed cricket match"),
        }
    }

    Ok(NormalizedState::new(matches).with_cards(cards))
}

/// First non-empty array under a known key; an empty array is a valid,
/// empty list. A document with no array at all is malformed.
fn match_list(raw: &Value) -> Result<&[Value], NormalizeError> {
    if raw.get("status").and_then(Value::as_str) == Some("failure") {
        let reason = raw.get("reason").map(plain).unwrap_or_default();
        return Err(NormalizeError::Malformed(format!(
            "provider reported failure: {reason}"
        )));
    }

    let arrays: Vec<&Vec<Value>> = RECORD_KEYS
        .iter()
        .filter_map(|key| raw.get(key).and_then(Value::as_array))
        .collect();

    if arrays.is_empty() {
        return Err(NormalizeError::Malformed(
            "document has no data, matches or result list".to_string(),
        ));
    }

    Ok(arrays
        .into_iter()
        .find(|list| !list.is_empty())
        .map_or(&[][..], |list| list.as_slice()))
}

fn parse_match(raw: &Value) -> Result<(MatchSnapshot, Scorecard), String> {
    let record = CricMatch::deserialize(raw).map_err(|e| e.to_string())?;

    let raw_scores = record.score.unwrap_or_default();
    let innings = raw_scores
        .iter()
        .map(|entry| match entry {
            Value::Null => Ok(None),
            other => Innings::deserialize(other)
                .map(|innings| Some(innings).filter(|i| !i.is_empty()))
                .map_err(|e| format!("bad score entry: {e}")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let teams = record.teams.unwrap_or_default();
    let team_info: Vec<TeamInfo> = record
        .team_info
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();

    let home = side_name(&teams, &team_info, 0, "Home");
    let away = side_name(&teams, &team_info, 1, "Away");

    let home_innings = latest_for(&innings, &home);
    let away_innings = latest_for(&innings, &away);

    let id = id_string(record.id.as_ref());
    let status = record.status.unwrap_or_default();
    let time = [record.date_time_gmt, record.date]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    let snapshot = MatchSnapshot {
        id: id.clone(),
        home_team: home.clone(),
        away_team: away.clone(),
        home_score: Score::Line(home_innings.map_or(EMPTY_INNINGS.to_string(), Innings::summary)),
        away_score: Score::Line(away_innings.map_or(EMPTY_INNINGS.to_string(), Innings::summary)),
        status: status.clone(),
        time,
    };

    let card = Scorecard {
        id,
        name: record.name.unwrap_or_default(),
        match_type: record.match_type.unwrap_or_default(),
        status,
        venue: record.venue.unwrap_or_default(),
        teams: vec![
            team_card(&home, team_info.first(), home_innings),
            team_card(&away, team_info.get(1), away_innings),
        ],
        raw_score_list: raw_scores,
    };

    Ok((snapshot, card))
}

fn side_name(teams: &[String], team_info: &[TeamInfo], index: usize, default: &str) -> String {
    teams
        .get(index)
        .cloned()
        .or_else(|| team_info.get(index).and_then(|info| info.name.clone()))
        .unwrap_or_else(|| default.to_string())
}

/// Latest innings whose label mentions `team`, else the last innings played.
fn latest_for<'a>(innings: &'a [Option<Innings>], team: &str) -> Option<&'a Innings> {
    let needle = team.to_lowercase();
    innings
        .iter()
        .rev()
        .flatten()
        .find(|i| {
            !needle.is_empty()
                && i.inning
                    .as_deref()
                    .is_some_and(|label| label.to_lowercase().contains(&needle))
        })
        .or_else(|| innings.last().and_then(Option::as_ref))
}

fn team_card(team: &str, info: Option<&TeamInfo>, innings: Option<&Innings>) -> TeamCard {
    let shortname = info
        .and_then(|i| i.shortname.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| team.chars().take(3).collect::<String>().to_uppercase());
    let img = info.and_then(|i| i.img.clone()).unwrap_or_default();

    let first_truthy = |a: Option<&Value>, b: Option<&Value>, default: Value| {
        [a, b]
            .into_iter()
            .flatten()
            .find(|v| is_truthy(v))
            .cloned()
            .unwrap_or(default)
    };

    let (runs, wickets, overs) = match innings {
        Some(i) => (
            first_truthy(i.r.as_ref(), i.runs.as_ref(), json!(0)),
            first_truthy(i.w.as_ref(), i.wickets.as_ref(), json!(0)),
            first_truthy(i.o.as_ref(), i.overs.as_ref(), json!("")),
        ),
        None => (json!(0), json!(0), json!("")),
    };

    TeamCard {
        team: team.to_string(),
        shortname,
        img,
        runs,
        wickets,
        overs,
    }
}
