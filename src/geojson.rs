//! `trips.geojson`: a line per segment plus a point per endpoint.

use std::path::Path;

use serde::Serialize;

use crate::{
    error::ProcessingError,
    resolver::{Coordinate, Segment},
    timestamp::Timestamp,
};

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: [[f64; 2]; 2] },
    Point { coordinates: [f64; 2] },
}

fn position(coordinate: &Coordinate) -> [f64; 2] {
    [coordinate.lon, coordinate.lat]
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties<'a> {
    pub trip_group_key: &'a str,
    pub trip_name: &'a str,
    pub trip_key: &'a str,
    #[serde(rename = "type")]
    pub category: &'a str,
    pub year: Option<i32>,
    #[serde(flatten)]
    pub detail: Detail<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Detail<'a> {
    #[serde(rename_all = "camelCase")]
    Route {
        from_label: &'a str,
        to_label: &'a str,
        departure: Option<Timestamp>,
        arrival: Option<Timestamp>,
    },
    Place { label: &'a str },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature<'a> {
    pub geometry: Geometry,
    pub properties: Properties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection<'a> {
    pub features: Vec<Feature<'a>>,
}

impl<'a> FeatureCollection<'a> {
    pub fn from_segments(segments: &'a [Segment]) -> Self {
        let features = segments
            .iter()
            .flat_map(|segment| {
                let properties = |detail| Properties {
                    trip_group_key: &segment.trip_group_key,
                    trip_name: &segment.trip_name,
                    trip_key: &segment.trip_key,
                    category: &segment.category,
                    year: segment.year(),
                    detail,
                };

                [
                    Feature {
                        geometry: Geometry::LineString {
                            coordinates: [position(&segment.from), position(&segment.to)],
                        },
                        properties: properties(Detail::Route {
                            from_label: &segment.from_label,
                            to_label: &segment.to_label,
                            departure: segment.departure,
                            arrival: segment.arrival,
                        }),
                    },
                    Feature {
                        geometry: Geometry::Point {
                            coordinates: position(&segment.from),
                        },
                        properties: properties(Detail::Place {
                            label: &segment.from_label,
                        }),
                    },
                    Feature {
                        geometry: Geometry::Point {
                            coordinates: position(&segment.to),
                        },
                        properties: properties(Detail::Place {
                            label: &segment.to_label,
                        }),
                    },
                ]
            })
            .collect();

        Self { features }
    }

    pub fn write(&self, path: &Path) -> Result<(), ProcessingError> {
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content).map_err(|e| ProcessingError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment {
            trip_group_key: "g".to_string(),
            trip_name: "Weekend".to_string(),
            trip_key: "g:0".to_string(),
            category: "Flight".to_string(),
            from_label: "Berlin (BER)".to_string(),
            to_label: "London (LHR)".to_string(),
            departure: Timestamp::parse(Some("2024-03-01 08:15:00"), Some("Europe/Berlin")),
            arrival: None,
            from: Coordinate { lat: 52.36, lon: 13.5 },
            to: Coordinate { lat: 51.47, lon: -0.46 },
        }
    }

    #[test]
    fn test_feature_collection() {
        let segments = vec![segment()];
        let json = serde_json::to_value(FeatureCollection::from_segments(&segments)).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 3);

        let line = &features[0];
        assert_eq!(line["type"], "Feature");
        assert_eq!(line["geometry"]["type"], "LineString");
        assert_eq!(line["geometry"]["coordinates"][0][0], 13.5);
        assert_eq!(line["geometry"]["coordinates"][1][1], 51.47);
        assert_eq!(line["properties"]["fromLabel"], "Berlin (BER)");
        assert_eq!(line["properties"]["departure"], "2024-03-01T07:15:00+00:00");
        assert_eq!(line["properties"]["arrival"], serde_json::Value::Null);
        assert_eq!(line["properties"]["year"], 2024);
        assert_eq!(line["properties"]["type"], "Flight");

        let arrival_point = &features[2];
        assert_eq!(arrival_point["geometry"]["type"], "Point");
        assert_eq!(arrival_point["geometry"]["coordinates"][0], -0.46);
        assert_eq!(arrival_point["properties"]["label"], "London (LHR)");
        assert!(arrival_point["properties"].get("fromLabel").is_none());
    }
}
