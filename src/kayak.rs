//! Shapes of an exported itinerary document.
//!
//! Exports are loosely typed: ids may be numbers or strings, coordinates
//! may be numbers or numeric strings, and any list may be `null`. Fields are
//! therefore read leniently. Events and segments are kept as raw JSON so that
//! one malformed entry can be dropped on its own without shifting the
//! positions of the others.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct TripDocument {
    #[serde(rename = "tripID", deserialize_with = "text")]
    pub trip_id: Option<String>,
    #[serde(rename = "customName", deserialize_with = "text")]
    pub custom_name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(rename = "tripEvents", deserialize_with = "list")]
    pub trip_events: Vec<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct TripEvent {
    #[serde(rename = "UIDescription", deserialize_with = "text")]
    pub ui_description: Option<String>,
    #[serde(deserialize_with = "text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "object")]
    pub address: Option<Address>,
    #[serde(rename = "venueStartDate", deserialize_with = "text")]
    pub venue_start_date: Option<String>,
    #[serde(rename = "venueEndDate", deserialize_with = "text")]
    pub venue_end_date: Option<String>,
    #[serde(deserialize_with = "list")]
    pub legs: Vec<Leg>,
}

impl TripEvent {
    /// Venue dates live on the event in most exports and on the address in some.
    pub fn venue_start(&self) -> Option<&str> {
        self.venue_start_date
            .as_deref()
            .or_else(|| self.address.as_ref()?.venue_start_date.as_deref())
    }

    pub fn venue_end(&self) -> Option<&str> {
        self.venue_end_date
            .as_deref()
            .or_else(|| self.address.as_ref()?.venue_end_date.as_deref())
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Leg {
    #[serde(deserialize_with = "list")]
    pub segments: Vec<Value>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct RawSegment {
    #[serde(rename = "departureDate", deserialize_with = "text")]
    pub departure_date: Option<String>,
    #[serde(rename = "arrivalDate", deserialize_with = "text")]
    pub arrival_date: Option<String>,
    #[serde(rename = "departureTimeZoneID", deserialize_with = "text")]
    pub departure_time_zone_id: Option<String>,
    #[serde(rename = "arrivalTimeZoneID", deserialize_with = "text")]
    pub arrival_time_zone_id: Option<String>,
    #[serde(rename = "departureAddress", deserialize_with = "object")]
    pub departure_address: Option<Address>,
    #[serde(rename = "arrivalAddress", deserialize_with = "object")]
    pub arrival_address: Option<Address>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "number")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "number")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "text")]
    pub city: Option<String>,
    #[serde(rename = "rawAddress", deserialize_with = "text")]
    pub raw_address: Option<String>,
    #[serde(rename = "locationName", deserialize_with = "text")]
    pub location_name: Option<String>,
    #[serde(rename = "venueStartDate", deserialize_with = "text")]
    pub venue_start_date: Option<String>,
    #[serde(rename = "venueEndDate", deserialize_with = "text")]
    pub venue_end_date: Option<String>,
}

impl Address {
    /// Both coordinates, when the export carried them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Strings as-is, numbers and booleans as their JSON text; empty strings,
/// `null`, arrays and objects read as absent.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Finite numbers, or strings that parse as one.
fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// Objects only; anything else reads as absent.
fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// `null` and non-arrays read as empty; elements that fail to read are dropped.
fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    log::debug!("Dropping unreadable list entry: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let doc: TripDocument = serde_json::from_str(
            r#"{
                "tripID": 12345,
                "customName": "",
                "name": "Spring in Lisbon",
                "tripEvents": [
                    {
                        "UIDescription": "Flight",
                        "id": "ev-1",
                        "legs": [
                            {"segments": [{"departureDate": "2024-03-01 08:15:00.000000",
                                           "departureAddress": {"rawAddress": "BER"}}]}
                        ]
                    },
                    {"UIDescription": "Hotel", "legs": null,
                     "address": {"latitude": "38.7", "longitude": -9.1, "locationName": "Casa"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.trip_id.as_deref(), Some("12345"));
        assert_eq!(doc.custom_name, None);
        assert_eq!(doc.name.as_deref(), Some("Spring in Lisbon"));
        assert_eq!(doc.trip_events.len(), 2);

        let flight = TripEvent::deserialize(&doc.trip_events[0]).unwrap();
        assert_eq!(flight.id.as_deref(), Some("ev-1"));
        assert_eq!(flight.legs[0].segments.len(), 1);

        let hotel = TripEvent::deserialize(&doc.trip_events[1]).unwrap();
        assert!(hotel.legs.is_empty());
        assert_eq!(
            hotel.address.as_ref().unwrap().coordinates(),
            Some((38.7, -9.1))
        );
    }

    #[test]
    fn test_lenient_coordinates() {
        let addr: Address =
            serde_json::from_str(r#"{"latitude": "north", "longitude": 13.4}"#).unwrap();
        assert_eq!(addr.latitude, None);
        assert_eq!(addr.coordinates(), None);

        let addr: Address = serde_json::from_str(r#"{"latitude": null}"#).unwrap();
        assert_eq!(addr.coordinates(), None);
    }

    #[test]
    fn test_venue_dates_fall_back_to_address() {
        let event: TripEvent = serde_json::from_str(
            r#"{"address": {"venueStartDate": "2024-01-01 15:00:00", "venueEndDate": "2024-01-03 11:00:00"},
                "venueEndDate": "2024-01-04 11:00:00"}"#,
        )
        .unwrap();
        assert_eq!(event.venue_start(), Some("2024-01-01 15:00:00"));
        assert_eq!(event.venue_end(), Some("2024-01-04 11:00:00"));
    }

    #[test]
    fn test_wrongly_typed_lists_are_empty() {
        let doc: TripDocument =
            serde_json::from_str(r#"{"tripEvents": "nope", "name": ["x"]}"#).unwrap();
        assert!(doc.trip_events.is_empty());
        assert_eq!(doc.name, None);

        let doc: TripDocument =
            serde_json::from_str(r#"{"tripEvents": [null, {"UIDescription": "Flight"}]}"#).unwrap();
        assert_eq!(doc.trip_events.len(), 2);
        assert!(doc.trip_events[0].is_null());

        let event: TripEvent =
            serde_json::from_str(r#"{"address": "Main St 1", "legs": [7, {"segments": []}]}"#)
                .unwrap();
        assert_eq!(event.address, None);
        assert_eq!(event.legs.len(), 1);
    }
}
