use std::path::PathBuf;

use thiserror::Error;

use crate::airports::SourceKind;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not list itinerary directory {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("CSV error in {source_kind} dataset: {source}")]
    Csv {
        source_kind: SourceKind,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProcessingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single input record was left out of the output.
///
/// None of these abort a run; they are collected into a [`SkipReport`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("Could not read itinerary {path:?}: {message}")]
    UnreadableDocument { path: PathBuf, message: String },

    #[error("Malformed itinerary JSON in {path:?}: {message}")]
    MalformedDocument { path: PathBuf, message: String },

    #[error("Malformed event in {trip_key}: {message}")]
    MalformedEvent { trip_key: String, message: String },

    #[error("Malformed segment in {trip_key}: {message}")]
    MalformedSegment { trip_key: String, message: String },

    #[error("No coordinates for departure {label:?} in {trip_key}")]
    UnresolvedDeparture { trip_key: String, label: String },

    #[error("No coordinates for arrival {label:?} in {trip_key}")]
    UnresolvedArrival { trip_key: String, label: String },

    #[error("Invalid {source_kind} row {code:?}: {message}")]
    InvalidAirportRow {
        source_kind: SourceKind,
        code: String,
        message: String,
    },
}

impl SkipReason {
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::UnreadableDocument { .. } => "unreadable_document",
            SkipReason::MalformedDocument { .. } => "malformed_document",
            SkipReason::MalformedEvent { .. } => "malformed_event",
            SkipReason::MalformedSegment { .. } => "malformed_segment",
            SkipReason::UnresolvedDeparture { .. } => "unresolved_departure",
            SkipReason::UnresolvedArrival { .. } => "unresolved_arrival",
            SkipReason::InvalidAirportRow { .. } => "invalid_airport_row",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SkipReport {
    pub reasons: Vec<SkipReason>,
}

impl SkipReport {
    pub fn push(&mut self, reason: SkipReason) {
        log::debug!("Skipping: {}", reason);
        self.reasons.push(reason);
    }

    pub fn extend(&mut self, other: SkipReport) {
        self.reasons.extend(other.reasons);
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.reasons.iter().filter(|r| r.kind() == kind).count()
    }

    /// Per-kind totals, ordered by kind name.
    pub fn counts(&self) -> std::collections::BTreeMap<&'static str, usize> {
        use itertools::Itertools;

        self.reasons
            .iter()
            .map(SkipReason::kind)
            .counts()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_by_kind() {
        let mut report = SkipReport::default();
        report.push(SkipReason::UnresolvedDeparture {
            trip_key: "a:1".to_string(),
            label: "Berlin Hbf".to_string(),
        });
        report.push(SkipReason::UnresolvedDeparture {
            trip_key: "a:2".to_string(),
            label: "Somewhere".to_string(),
        });
        report.push(SkipReason::MalformedDocument {
            path: PathBuf::from("broken.txt"),
            message: "EOF".to_string(),
        });

        assert_eq!(report.len(), 3);
        assert_eq!(report.count("unresolved_departure"), 2);
        assert_eq!(report.count("unresolved_arrival"), 0);

        let counts = report.counts();
        assert_eq!(counts.get("malformed_document"), Some(&1));
        assert_eq!(
            counts.keys().copied().collect::<Vec<_>>(),
            vec!["malformed_document", "unresolved_departure"]
        );
    }

    #[test]
    fn test_skip_reason_messages() {
        let reason = SkipReason::UnresolvedArrival {
            trip_key: "trip:0".to_string(),
            label: "Arrival".to_string(),
        };
        assert!(reason.to_string().contains("trip:0"));
        assert_eq!(reason.kind(), "unresolved_arrival");
    }
}
