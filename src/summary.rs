use std::{collections::HashMap, path::Path};

use itertools::Itertools;
use serde::Serialize;

use crate::{
    error::ProcessingError,
    resolver::{EventSummary, Resolution},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripGroup {
    pub trip_group_key: String,
    pub trip_name: String,
    pub year: Option<i32>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub events: Vec<EventSummary>,
}

impl TripGroup {
    /// Builds a group from its members, which must all share one group key.
    /// Members end up ordered by start, absent starts first.
    fn from_members(trip_group_key: String, members: Vec<EventSummary>) -> Self {
        let trip_name = members
            .first()
            .map(|e| e.trip_name.clone())
            .unwrap_or_else(|| trip_group_key.clone());

        Self {
            year: members.iter().filter_map(|e| e.year).min(),
            start: members.iter().filter_map(|e| e.start.clone()).min(),
            end: members.iter().filter_map(|e| e.end.clone()).max(),
            events: members
                .into_iter()
                .sorted_by(|a, b| a.start.cmp(&b.start))
                .collect(),
            trip_group_key,
            trip_name,
        }
    }
}

/// Groups event summaries by trip group key, ordered by start (absent first).
/// Ties keep the order in which groups first appear.
pub fn group_events(events: &[EventSummary]) -> Vec<TripGroup> {
    let first_seen: HashMap<&str, usize> = events
        .iter()
        .map(|e| e.trip_group_key.as_str())
        .unique()
        .enumerate()
        .map(|(i, key)| (key, i))
        .collect();

    events
        .iter()
        .cloned()
        .into_group_map_by(|e| e.trip_group_key.clone())
        .into_iter()
        .sorted_by_key(|(key, _)| first_seen[key.as_str()])
        .map(|(key, members)| TripGroup::from_members(key, members))
        .sorted_by(|a, b| a.start.cmp(&b.start))
        .collect()
}

/// The `summary.json` document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub source_files: usize,
    pub segment_count: usize,
    pub trip_groups: Vec<TripGroup>,
    pub events: Vec<EventSummary>,
}

impl From<&Resolution> for Summary {
    fn from(resolution: &Resolution) -> Self {
        Self {
            source_files: resolution.source_files,
            segment_count: resolution.segments.len(),
            trip_groups: group_events(&resolution.events),
            events: resolution.events.clone(),
        }
    }
}

impl Summary {
    pub fn to_json(&self) -> Result<String, ProcessingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ProcessingError> {
        std::fs::write(path, self.to_json()?).map_err(|e| ProcessingError::io(path, e))
    }
}
