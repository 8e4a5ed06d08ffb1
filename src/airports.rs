use std::{
    collections::HashMap,
    fmt,
    io::Read,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, SkipReason, SkipReport};

/// Airports missing from both datasets: code, lat, lon, name, country.
pub const MANUAL_AIRPORTS: &[(&str, f64, f64, &str, Option<&str>)] =
    &[("LGP", 13.1575, 123.7350, "Legazpi Airport", Some("PH"))];

/// Missing-value marker used by the OpenFlights format.
const OPENFLIGHTS_NULL: &str = "\\N";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    OurAirports,
    OpenFlights,
    Manual,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::OurAirports => write!(f, "OurAirports"),
            SourceKind::OpenFlights => write!(f, "OpenFlights"),
            SourceKind::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportRecord {
    pub code: String,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: Option<String>,
    pub source: SourceKind,
}

/// One row of OurAirports `airports.csv`. Columns we don't use are ignored.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct OurAirportsRow {
    pub iata_code: String,
    pub latitude_deg: String,
    pub longitude_deg: String,
    pub name: String,
    pub iso_country: String,
}

/// One row of OpenFlights `airports.dat`:
/// `Airport ID,Name,City,Country,IATA,ICAO,Latitude,Longitude,...`
#[derive(Debug)]
pub struct OpenFlightsRow {
    pub name: String,
    pub iata: String,
    pub latitude: String,
    pub longitude: String,
}

impl OpenFlightsRow {
    fn from_record(record: &csv::ByteRecord) -> Option<Self> {
        if record.len() < 8 {
            return None;
        }
        let field = |i: usize| String::from_utf8_lossy(&record[i]).into_owned();

        Some(Self {
            name: field(1),
            iata: field(4),
            latitude: field(6),
            longitude: field(7),
        })
    }
}

fn lossy(record: &csv::ByteRecord) -> csv::StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Normalizes a dataset code; `None` unless it is exactly three characters.
fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    (code.chars().count() == 3).then_some(code)
}

fn parse_coordinates(lat: &str, lon: &str) -> Result<(f64, f64), String> {
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("latitude {lat:?}: {e}"))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("longitude {lon:?}: {e}"))?;
    Ok((lat, lon))
}

/// Records from one dataset, keyed by code.
#[derive(Debug, Clone)]
pub struct AirportSource {
    pub kind: SourceKind,
    pub records: HashMap<String, AirportRecord>,
    pub skips: SkipReport,
}

impl AirportSource {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            records: HashMap::new(),
            skips: SkipReport::default(),
        }
    }

    fn skip(&mut self, code: &str, message: String) {
        self.skips.push(SkipReason::InvalidAirportRow {
            source_kind: self.kind,
            code: code.to_owned(),
            message,
        });
    }

    /// Reads an OurAirports-style CSV with a header row. A later row for the
    /// same code replaces an earlier one. Fields are decoded as lossy UTF-8.
    pub fn from_ourairports<R: Read>(reader: R) -> Result<Self, ProcessingError> {
        let csv_error = |source| ProcessingError::Csv {
            source_kind: SourceKind::OurAirports,
            source,
        };
        let mut source = Self::new(SourceKind::OurAirports);
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = lossy(csv_reader.byte_headers().map_err(csv_error)?);
        let code_column = headers.iter().position(|h| h == "iata_code");

        let mut record = csv::ByteRecord::new();
        while csv_reader.read_byte_record(&mut record).map_err(csv_error)? {
            let fields = lossy(&record);
            let row = match fields.deserialize::<OurAirportsRow>(Some(&headers)) {
                Ok(row) => row,
                Err(e) => {
                    let code = code_column.and_then(|i| fields.get(i)).unwrap_or_default();
                    source.skip(code.trim(), e.to_string());
                    continue;
                }
            };

            let Some(code) = normalize_code(&row.iata_code) else {
                continue;
            };
            match parse_coordinates(&row.latitude_deg, &row.longitude_deg) {
                Ok((lat, lon)) => {
                    let country = row.iso_country.trim().to_uppercase();
                    source.records.insert(
                        code.clone(),
                        AirportRecord {
                            code,
                            lat,
                            lon,
                            name: row.name.trim().to_owned(),
                            country: (!country.is_empty()).then_some(country),
                            source: SourceKind::OurAirports,
                        },
                    );
                }
                Err(message) => source.skip(&code, message),
            }
        }

        Ok(source)
    }

    /// Reads a headerless OpenFlights `airports.dat`. Only the first row for
    /// a code is kept; the format carries no country code we can use.
    pub fn from_openflights<R: Read>(reader: R) -> Result<Self, ProcessingError> {
        let mut source = Self::new(SourceKind::OpenFlights);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut record = csv::ByteRecord::new();
        loop {
            match csv_reader.read_byte_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(source_err) => {
                    return Err(ProcessingError::Csv {
                        source_kind: SourceKind::OpenFlights,
                        source: source_err,
                    })
                }
            }

            let Some(row) = OpenFlightsRow::from_record(&record) else {
                continue;
            };
            if row.iata.trim() == OPENFLIGHTS_NULL {
                continue;
            }
            let Some(code) = normalize_code(&row.iata) else {
                continue;
            };
            if source.records.contains_key(&code) {
                continue;
            }
            match parse_coordinates(&row.latitude, &row.longitude) {
                Ok((lat, lon)) => {
                    source.records.insert(
                        code.clone(),
                        AirportRecord {
                            code,
                            lat,
                            lon,
                            name: row.name.trim().to_owned(),
                            country: None,
                            source: SourceKind::OpenFlights,
                        },
                    );
                }
                Err(message) => source.skip(&code, message),
            }
        }

        Ok(source)
    }

    pub fn manual(entries: &[(&str, f64, f64, &str, Option<&str>)]) -> Self {
        let mut source = Self::new(SourceKind::Manual);
        for &(code, lat, lon, name, country) in entries {
            source.records.insert(
                code.to_owned(),
                AirportRecord {
                    code: code.to_owned(),
                    lat,
                    lon,
                    name: name.to_owned(),
                    country: country.map(str::to_owned),
                    source: SourceKind::Manual,
                },
            );
        }
        source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Merges sources in priority order; the first source holding a code wins.
#[derive(Debug, Default)]
pub struct AirportIndexBuilder {
    sources: Vec<AirportSource>,
}

impl AirportIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: AirportSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> AirportIndex {
        let mut index = AirportIndex::default();

        for source in self.sources {
            let before = index.records.len();
            let kind = source.kind;
            index.skips.extend(source.skips);
            for (code, record) in source.records {
                index.records.entry(code).or_insert(record);
            }
            log::info!(
                "Airport index: {} new codes from {} source",
                index.records.len() - before,
                kind
            );
        }

        index
    }
}

#[derive(Debug, Default, Clone)]
pub struct AirportIndex {
    records: HashMap<String, AirportRecord>,
    pub skips: SkipReport,
}

impl AirportIndex {
    /// Builds the standard index: OurAirports, then OpenFlights (if given),
    /// then [`MANUAL_AIRPORTS`].
    pub fn load(
        ourairports: &Path,
        openflights: Option<&Path>,
    ) -> Result<AirportIndex, ProcessingError> {
        let file = std::fs::File::open(ourairports)
            .map_err(|e| ProcessingError::io(ourairports, e))?;
        let mut builder = AirportIndexBuilder::new().source(AirportSource::from_ourairports(file)?);

        match openflights {
            Some(path) if path.exists() => {
                let file = std::fs::File::open(path).map_err(|e| ProcessingError::io(path, e))?;
                builder = builder.source(AirportSource::from_openflights(file)?);
            }
            Some(path) => log::warn!("OpenFlights dataset {:?} not found, skipping", path),
            None => {}
        }

        Ok(builder.source(AirportSource::manual(MANUAL_AIRPORTS)).build())
    }

    pub fn get(&self, code: &str) -> Option<&AirportRecord> {
        self.records.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.records.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<AirportRecord> for AirportIndex {
    fn from_iter<I: IntoIterator<Item = AirportRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.code.clone(), record))
                .collect(),
            skips: SkipReport::default(),
        }
    }
}
