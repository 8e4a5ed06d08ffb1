use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use crate::{
    airports::AirportIndex,
    codes::extract_code,
    error::{ProcessingError, SkipReason, SkipReport},
    kayak::{Address, RawSegment, TripDocument, TripEvent},
    timestamp::Timestamp,
};

/// File extension of itinerary exports.
pub const DOCUMENT_EXTENSION: &str = "txt";

const LODGING: &str = "Hotel";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub trip_group_key: String,
    pub trip_name: String,
    pub trip_key: String,
    #[serde(rename = "type")]
    pub category: String,
    pub from_label: String,
    pub to_label: String,
    pub departure: Option<Timestamp>,
    pub arrival: Option<Timestamp>,
    pub from: Coordinate,
    pub to: Coordinate,
}

impl Segment {
    /// Year of departure, else of arrival.
    pub fn year(&self) -> Option<i32> {
        self.departure.or(self.arrival).map(|ts| ts.year())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub trip_group_key: String,
    pub trip_name: String,
    pub trip_key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub category: String,
    pub year: Option<i32>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub segment_count: usize,
}

/// Everything extracted from one run over a set of itinerary documents.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Resolution {
    pub source_files: usize,
    pub segments: Vec<Segment>,
    pub events: Vec<EventSummary>,
    pub skips: SkipReport,
}

/// Identity shared by every record taken from one document.
struct DocumentContext<'a> {
    stem: &'a str,
    trip_group_key: String,
    trip_name: String,
}

/// One resolved endpoint of a segment.
struct Endpoint {
    label: String,
    coordinate: Option<Coordinate>,
}

pub struct Resolver<'a> {
    airports: &'a AirportIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(airports: &'a AirportIndex) -> Self {
        Self { airports }
    }

    /// Lists `*.txt` documents directly inside `dir`, sorted by file name.
    pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, ProcessingError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| ProcessingError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION)
            {
                paths.push(path.to_path_buf());
            }
        }
        Ok(paths)
    }

    pub fn resolve_dir(&self, dir: &Path) -> Result<Resolution, ProcessingError> {
        let paths = Self::discover(dir)?;
        log::info!("Resolving {} itinerary documents in {:?}", paths.len(), dir);

        let mut resolution = Resolution {
            source_files: paths.len(),
            ..Default::default()
        };
        for path in &paths {
            self.resolve_file(path, &mut resolution);
        }

        log::info!(
            "Resolved {} segments and {} events ({} records skipped)",
            resolution.segments.len(),
            resolution.events.len(),
            resolution.skips.len()
        );
        Ok(resolution)
    }

    /// Reads one document into `resolution`. An unreadable or malformed
    /// document is recorded as a skip and contributes nothing else.
    pub fn resolve_file(&self, path: &Path, resolution: &mut Resolution) {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping unreadable itinerary {:?}: {}", path, e);
                resolution.skips.push(SkipReason::UnreadableDocument {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                return;
            }
        };

        match serde_json::from_str::<TripDocument>(&content) {
            Ok(document) => self.resolve_document(&stem, &document, resolution),
            Err(e) => {
                log::warn!("Skipping malformed itinerary {:?}: {}", path, e);
                resolution.skips.push(SkipReason::MalformedDocument {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Resolves a parsed document; `stem` is its file name without extension.
    pub fn resolve_document(&self, stem: &str, document: &TripDocument, resolution: &mut Resolution) {
        let ctx = DocumentContext {
            stem,
            trip_group_key: document
                .trip_id
                .clone()
                .unwrap_or_else(|| stem.to_owned()),
            trip_name: document
                .custom_name
                .clone()
                .or_else(|| document.name.clone())
                .unwrap_or_else(|| stem.to_owned()),
        };

        for (position, value) in document.trip_events.iter().enumerate() {
            match trip_event(value) {
                Ok(event) => self.resolve_event(&ctx, position, &event, resolution),
                Err(message) => resolution.skips.push(SkipReason::MalformedEvent {
                    trip_key: format!("{}:{}", ctx.stem, position),
                    message,
                }),
            }
        }
    }

    fn resolve_event(
        &self,
        ctx: &DocumentContext,
        position: usize,
        event: &TripEvent,
        resolution: &mut Resolution,
    ) {
        let category = event
            .ui_description
            .clone()
            .unwrap_or_else(|| "Other".to_owned());
        let trip_key = format!(
            "{}:{}",
            ctx.stem,
            event.id.clone().unwrap_or_else(|| position.to_string())
        );
        let is_lodging = category.eq_ignore_ascii_case(LODGING);

        if is_lodging && event.address.as_ref().and_then(Address::coordinates).is_some() {
            resolution.events.push(lodging_summary(ctx, trip_key, event));
            return;
        }

        let mut segment_entries = 0;
        let mut survivors = 0;
        let mut start: Option<Timestamp> = None;
        let mut end: Option<Timestamp> = None;
        let mut title: Option<String> = None;

        for leg in &event.legs {
            for value in &leg.segments {
                segment_entries += 1;

                let raw = match raw_segment(value) {
                    Ok(raw) => raw,
                    Err(message) => {
                        resolution.skips.push(SkipReason::MalformedSegment {
                            trip_key: trip_key.clone(),
                            message,
                        });
                        continue;
                    }
                };

                let departure = Timestamp::parse(
                    raw.departure_date.as_deref(),
                    raw.departure_time_zone_id.as_deref(),
                );
                let arrival = Timestamp::parse(
                    raw.arrival_date.as_deref(),
                    raw.arrival_time_zone_id.as_deref(),
                );
                if let Some(dep) = departure {
                    start = Some(start.map_or(dep, |s| s.min(dep)));
                }
                if let Some(arr) = arrival {
                    end = Some(end.map_or(arr, |e| e.max(arr)));
                }

                let from = self.resolve_endpoint(raw.departure_address.as_ref(), "Departure");
                let to = self.resolve_endpoint(raw.arrival_address.as_ref(), "Arrival");

                let (Some(from_coordinate), Some(to_coordinate)) = (from.coordinate, to.coordinate)
                else {
                    resolution.skips.push(if from.coordinate.is_none() {
                        SkipReason::UnresolvedDeparture {
                            trip_key: trip_key.clone(),
                            label: from.label,
                        }
                    } else {
                        SkipReason::UnresolvedArrival {
                            trip_key: trip_key.clone(),
                            label: to.label,
                        }
                    });
                    continue;
                };

                if title.is_none() {
                    title = Some(format!("{} → {}", from.label, to.label));
                }
                survivors += 1;

                resolution.segments.push(Segment {
                    trip_group_key: ctx.trip_group_key.clone(),
                    trip_name: ctx.trip_name.clone(),
                    trip_key: trip_key.clone(),
                    category: category.clone(),
                    from_label: from.label,
                    to_label: to.label,
                    departure,
                    arrival,
                    from: from_coordinate,
                    to: to_coordinate,
                });
            }
        }

        if survivors > 0 {
            // Events sharing an id share a trip key, and the count covers all of them.
            let segment_count = resolution
                .segments
                .iter()
                .filter(|s| s.trip_key == trip_key)
                .count();
            resolution.events.push(EventSummary {
                trip_group_key: ctx.trip_group_key.clone(),
                trip_name: ctx.trip_name.clone(),
                trip_key,
                title: title.unwrap_or_else(|| format!("{} trip", category)),
                category,
                year: start.map(|s| s.year()),
                start: start.map(|s| s.to_iso()),
                end: end.map(|e| e.to_iso()),
                segment_count,
            });
        } else if is_lodging {
            resolution.events.push(lodging_summary(ctx, trip_key, event));
        } else if segment_entries > 0 {
            log::debug!("No resolvable segments in {}", trip_key);
        }
    }

    /// Direct coordinates first, then an airport code found in the raw address.
    fn resolve_endpoint(&self, address: Option<&Address>, fallback: &str) -> Endpoint {
        let Some(address) = address else {
            return Endpoint {
                label: fallback.to_owned(),
                coordinate: None,
            };
        };

        let mut label = address
            .city
            .clone()
            .or_else(|| address.raw_address.clone())
            .unwrap_or_else(|| fallback.to_owned());

        if let Some(coordinates) = address.coordinates() {
            return Endpoint {
                label,
                coordinate: Some(coordinates.into()),
            };
        }

        let airport = extract_code(address.raw_address.as_deref())
            .and_then(|code| self.airports.get(&code));
        let coordinate = airport.map(|airport| {
            if !label.contains(&airport.code) {
                label = format!("{} ({})", label, airport.code);
            }
            Coordinate {
                lat: airport.lat,
                lon: airport.lon,
            }
        });

        Endpoint { label, coordinate }
    }
}

fn trip_event(value: &Value) -> Result<TripEvent, String> {
    if !value.is_object() {
        return Err(format!("expected an object, found {}", value));
    }
    TripEvent::deserialize(value).map_err(|e| e.to_string())
}

fn raw_segment(value: &Value) -> Result<RawSegment, String> {
    if !value.is_object() {
        return Err(format!("expected an object, found {}", value));
    }
    RawSegment::deserialize(value).map_err(|e| e.to_string())
}

fn lodging_summary(ctx: &DocumentContext, trip_key: String, event: &TripEvent) -> EventSummary {
    let address = event.address.as_ref();
    let title = address
        .and_then(|a| a.location_name.clone().or_else(|| a.raw_address.clone()))
        .unwrap_or_else(|| LODGING.to_owned());
    let start = Timestamp::parse(event.venue_start(), None);
    let end = Timestamp::parse(event.venue_end(), None);

    EventSummary {
        trip_group_key: ctx.trip_group_key.clone(),
        trip_name: ctx.trip_name.clone(),
        trip_key,
        title,
        category: LODGING.to_owned(),
        year: start.map(|s| s.year()),
        start: start.map(|s| s.to_iso()),
        end: end.map(|e| e.to_iso()),
        segment_count: 0,
    }
}
