//! Spatial queries over the merged station set and pilot reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metar;
use crate::models::{Airport, Pirep, StationReport};

/// Lat/lng query region, parsed from `minLng,minLat,maxLng,maxLat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Parse the first four comma-separated values of the query bounds
    /// string, ignoring any trailing values; `None` for anything malformed.
    pub fn parse(bounds: &str) -> Option<Self> {
        let mut coords = [0f64; 4];
        let mut parts = bounds.split(',');
        for coord in coords.iter_mut() {
            *coord = parts.next()?.trim().parse().ok()?;
        }
        Some(Self {
            min_lng: coords[0],
            min_lat: coords[1],
            max_lng: coords[2],
            max_lat: coords[3],
        })
    }

    /// Open-interval containment: boundary-exact coordinates are excluded.
    /// This matches the upstream consumer's expectations; do not widen to a
    /// closed interval.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng > self.min_lng && lng < self.max_lng && lat > self.min_lat && lat < self.max_lat
    }
}

/// One row of the spatial-query output.
///
/// Every field is a string and present even when unknown (empty), keeping
/// the schema stable for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StationRecord {
    #[serde(rename = "Lng")]
    pub lng: String,
    #[serde(rename = "Lat")]
    pub lat: String,
    #[serde(rename = "ICAO")]
    pub icao: String,
    #[serde(rename = "WindDir")]
    pub wind_dir: String,
    #[serde(rename = "WindSpeed")]
    pub wind_speed: String,
    #[serde(rename = "WindBarb")]
    pub wind_barb: String,
    #[serde(rename = "WindGust")]
    pub wind_gust: String,
    #[serde(rename = "Metar")]
    pub metar: String,
    #[serde(rename = "Cond")]
    pub cond: String,
    #[serde(rename = "CondColor")]
    pub cond_color: String,
    #[serde(rename = "Precip")]
    pub precip: String,
    #[serde(rename = "Temperature")]
    pub temperature: String,
    #[serde(rename = "TAF")]
    pub taf: String,
    #[serde(rename = "UpWinds")]
    pub up_winds: String,
    #[serde(rename = "Lightning")]
    pub lightning: String,
}

/// Build a display record for every station holding a METAR, in identifier
/// order. Coordinates come from the report itself when its source supplied
/// them, falling back to the airport reference list; a station with neither
/// still gets a record, with empty coordinates the spatial filter skips.
pub fn station_records(
    reports: &BTreeMap<String, StationReport>,
    airports: &[Airport],
) -> Vec<StationRecord> {
    let by_icao: BTreeMap<&str, &Airport> =
        airports.iter().map(|airport| (airport.icao.as_str(), airport)).collect();
    reports
        .values()
        .filter(|report| !report.metar.is_empty())
        .map(|report| {
            let (lng, lat) = if !report.lat.is_empty() && !report.lng.is_empty() {
                (report.lng.as_str(), report.lat.as_str())
            } else {
                by_icao
                    .get(report.location.as_str())
                    .map(|airport| (airport.lng.as_str(), airport.lat.as_str()))
                    .unwrap_or(("", ""))
            };
            build_record(report, lng, lat)
        })
        .collect()
}

fn build_record(report: &StationReport, lng: &str, lat: &str) -> StationRecord {
    let (direction, speed, gust) = metar::parse_wind(&report.metar);
    let barb = if speed == 0 { -1 } else { speed / 5 };
    StationRecord {
        lng: lng.to_string(),
        lat: lat.to_string(),
        icao: report.location.clone(),
        wind_dir: direction.to_string(),
        wind_speed: speed.to_string(),
        wind_barb: barb.to_string(),
        wind_gust: gust.to_string(),
        metar: report.metar.clone(),
        cond: report.cond.clone(),
        cond_color: metar::condition_color(&report.cond).to_string(),
        precip: metar::extract_precip(&report.metar),
        temperature: metar::extract_temperature(&report.metar),
        taf: report.taf.clone(),
        up_winds: report.winds.clone(),
        lightning: if metar::has_lightning(&report.metar) {
            "1".to_string()
        } else {
            "0".to_string()
        },
    }
}

/// Stations strictly inside the box. Records whose coordinates fail to parse
/// are skipped; input order is preserved.
pub fn filter_stations(records: &[StationRecord], bounds: &BoundingBox) -> Vec<StationRecord> {
    records
        .iter()
        .filter(|record| inside(bounds, &record.lng, &record.lat))
        .cloned()
        .collect()
}

/// Pilot reports strictly inside the box, same skip rule.
pub fn filter_pireps(pireps: &[Pirep], bounds: &BoundingBox) -> Vec<Pirep> {
    pireps
        .iter()
        .filter(|pirep| inside(bounds, &pirep.lng, &pirep.lat))
        .cloned()
        .collect()
}

fn inside(bounds: &BoundingBox, lng: &str, lat: &str) -> bool {
    match (lng.trim().parse::<f64>(), lat.trim().parse::<f64>()) {
        (Ok(lng), Ok(lat)) => bounds.contains(lng, lat),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(icao: &str, lng: &str, lat: &str) -> StationRecord {
        StationRecord {
            lng: lng.to_string(),
            lat: lat.to_string(),
            icao: icao.to_string(),
            ..StationRecord::default()
        }
    }

    #[test]
    fn parse_bounds() {
        let bounds = BoundingBox::parse("-88,41,-87,41.5").unwrap();
        assert_eq!(bounds.min_lng, -88.0);
        assert_eq!(bounds.min_lat, 41.0);
        assert_eq!(bounds.max_lng, -87.0);
        assert_eq!(bounds.max_lat, 41.5);
    }

    #[test]
    fn parse_bounds_rejects_malformed_input() {
        assert_eq!(BoundingBox::parse(""), None);
        assert_eq!(BoundingBox::parse("-88,41,-87"), None);
        assert_eq!(BoundingBox::parse("-88,41,-87,north"), None);
    }

    #[test]
    fn parse_bounds_ignores_trailing_values() {
        assert_eq!(
            BoundingBox::parse("-88,41,-87,41.5,9,zoom"),
            BoundingBox::parse("-88,41,-87,41.5")
        );
    }

    #[test]
    fn filter_excludes_boundary_exact_coordinates() {
        let bounds = BoundingBox::parse("-88,41,-87,41.5").unwrap();
        let records = vec![
            record("KXAA", "-88", "41.2"),
            record("KXAB", "-87.5", "41.2"),
            record("KXAC", "-87.5", "41.5"),
        ];

        let matched = filter_stations(&records, &bounds);
        let icaos: Vec<&str> = matched.iter().map(|r| r.icao.as_str()).collect();
        assert_eq!(icaos, vec!["KXAB"]);
    }

    #[test]
    fn filter_skips_unparsable_coordinates() {
        let bounds = BoundingBox::parse("-88,41,-87,41.5").unwrap();
        let records = vec![
            record("KXAA", "not-a-number", "41.2"),
            record("KXAB", "-87.5", ""),
            record("KXAC", "-87.5", "41.2"),
        ];

        let matched = filter_stations(&records, &bounds);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].icao, "KXAC");
    }

    #[test]
    fn filter_pireps_same_semantics() {
        let bounds = BoundingBox::parse("-88,41,-87,41.5").unwrap();
        let pireps = vec![
            Pirep {
                report: "UA inside".to_string(),
                lng: "-87.5".to_string(),
                lat: "41.2".to_string(),
            },
            Pirep {
                report: "UA outside".to_string(),
                lng: "-89.0".to_string(),
                lat: "41.2".to_string(),
            },
            Pirep {
                report: "UA unplaced".to_string(),
                lng: String::new(),
                lat: String::new(),
            },
        ];

        let matched = filter_pireps(&pireps, &bounds);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].report, "UA inside");
    }

    #[test]
    fn records_join_reports_with_airports() {
        let mut reports = BTreeMap::new();
        reports.insert(
            "KUGN".to_string(),
            StationReport {
                location: "KUGN".to_string(),
                metar: "KUGN 051251Z 18012G20KT 10SM TS 12/08 RMK LTG DSNT".to_string(),
                cond: "MVFR".to_string(),
                taf: "KUGN 051130Z 0512/0612".to_string(),
                ..StationReport::default()
            },
        );
        reports.insert(
            "KENW".to_string(),
            StationReport {
                location: "KENW".to_string(),
                // TAF only, no METAR: no record
                taf: "KENW 051130Z".to_string(),
                ..StationReport::default()
            },
        );
        let airports = vec![
            Airport {
                icao: "KUGN".to_string(),
                lat: "42.4221492".to_string(),
                lng: "-87.8679192".to_string(),
                alt: "727".to_string(),
            },
            Airport {
                icao: "KENW".to_string(),
                lat: "42.5956944".to_string(),
                lng: "-87.9278056".to_string(),
                alt: "742".to_string(),
            },
        ];

        let records = station_records(&reports, &airports);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.icao, "KUGN");
        assert_eq!(r.lng, "-87.8679192");
        assert_eq!(r.wind_dir, "180");
        assert_eq!(r.wind_speed, "12");
        assert_eq!(r.wind_barb, "2");
        assert_eq!(r.wind_gust, "20");
        assert_eq!(r.cond, "MVFR");
        assert_eq!(r.cond_color, "#4040FF");
        assert_eq!(r.precip, "TS");
        assert_eq!(r.temperature, "54");
        assert_eq!(r.lightning, "1");
        assert_eq!(r.taf, "KUGN 051130Z 0512/0612");
    }

    #[test]
    fn report_coordinates_outrank_the_airport_join() {
        let mut reports = BTreeMap::new();
        reports.insert(
            "KUGN".to_string(),
            StationReport {
                location: "KUGN".to_string(),
                metar: "KUGN 051251Z 18012KT".to_string(),
                lat: "42.42".to_string(),
                lng: "-87.87".to_string(),
                ..StationReport::default()
            },
        );
        let airports = vec![Airport {
            icao: "KUGN".to_string(),
            lat: "0.0".to_string(),
            lng: "0.0".to_string(),
            alt: "727".to_string(),
        }];

        let records = station_records(&reports, &airports);
        assert_eq!(records[0].lat, "42.42");
        assert_eq!(records[0].lng, "-87.87");
    }

    #[test]
    fn station_without_reference_airport_keeps_its_own_coordinates() {
        let mut reports = BTreeMap::new();
        reports.insert(
            "KUGN".to_string(),
            StationReport {
                location: "KUGN".to_string(),
                metar: "KUGN 051251Z 18012KT".to_string(),
                lat: "42.42".to_string(),
                lng: "-87.87".to_string(),
                ..StationReport::default()
            },
        );

        let records = station_records(&reports, &[]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].icao, "KUGN");
        assert_eq!(records[0].lng, "-87.87");
    }

    #[test]
    fn unknown_fields_render_empty_not_absent() {
        let mut reports = BTreeMap::new();
        reports.insert(
            "KUGN".to_string(),
            StationReport {
                location: "KUGN".to_string(),
                metar: "KUGN 051251Z".to_string(),
                ..StationReport::default()
            },
        );
        let airports = vec![Airport {
            icao: "KUGN".to_string(),
            lat: "42.4".to_string(),
            lng: "-87.8".to_string(),
            alt: "727".to_string(),
        }];

        let records = station_records(&reports, &airports);
        let json = serde_json::to_string(&records[0]).unwrap();
        // stable schema: unknown values are empty strings, keys never omitted
        assert!(json.contains("\"TAF\":\"\""));
        assert!(json.contains("\"Precip\":\"\""));
        assert!(json.contains("\"Temperature\":\"\""));
        assert!(json.contains("\"CondColor\":\"white\""));
        assert!(json.contains("\"Lightning\":\"0\""));
    }
}
