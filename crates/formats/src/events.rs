use std::collections::BTreeMap;

use crate::error::FormatError;
use crate::table::{Table, parse_number};

/// One disaster event record for the point layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisasterEvent {
    pub category: String,
    pub year: Option<i32>,
    pub lon_deg: f64,
    pub lat_deg: f64,
    /// Every non-empty source cell, keyed by header, for tooltips.
    pub fields: BTreeMap<String, String>,
}

impl DisasterEvent {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventsParse {
    pub events: Vec<DisasterEvent>,
    /// Rows dropped for missing or invalid coordinates.
    pub skipped: usize,
}

pub const UNKNOWN_CATEGORY: &str = "Unknown";

const CATEGORY_COLUMNS: &[&str] = &[
    "disaster type",
    "disaster_type",
    "hazard",
    "category",
    "type",
];
const EVENT_YEAR_COLUMNS: &[&str] = &["year", "start year", "start_year"];
const LAT_COLUMNS: &[&str] = &["latitude", "lat"];
const LON_COLUMNS: &[&str] = &["longitude", "lon", "lng", "long"];

pub fn events_from_table(table: &Table) -> Result<EventsParse, FormatError> {
    let lat_col = table
        .column(LAT_COLUMNS)
        .ok_or_else(|| FormatError::MissingColumn("latitude".to_string()))?;
    let lon_col = table
        .column(LON_COLUMNS)
        .ok_or_else(|| FormatError::MissingColumn("longitude".to_string()))?;
    let category_col = table.column(CATEGORY_COLUMNS);
    let year_col = table.column(EVENT_YEAR_COLUMNS);

    let mut out = EventsParse::default();
    for (row, cells) in table.rows.iter().enumerate() {
        let lat = table.cell(row, lat_col).and_then(parse_number);
        let lon = table.cell(row, lon_col).and_then(parse_number);
        let (Some(lat_deg), Some(lon_deg)) = (lat, lon) else {
            out.skipped += 1;
            continue;
        };
        if !(-90.0..=90.0).contains(&lat_deg) || !(-180.0..=180.0).contains(&lon_deg) {
            out.skipped += 1;
            continue;
        }

        let category = category_col
            .and_then(|c| table.cell(row, c))
            .unwrap_or(UNKNOWN_CATEGORY)
            .to_string();
        let year = year_col
            .and_then(|c| table.cell(row, c))
            .and_then(parse_number)
            .map(|y| y as i32);

        let fields = table
            .headers
            .iter()
            .zip(cells.iter())
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();

        out.events.push(DisasterEvent {
            category,
            year,
            lon_deg,
            lat_deg,
            fields,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{UNKNOWN_CATEGORY, events_from_table};
    use crate::table::Table;

    #[test]
    fn parses_events_and_counts_skips() {
        let t = Table::parse(
            "Disaster Type,Year,Latitude,Longitude,Location\n\
             Flood,1998,35.1,139.2,Kanto\n\
             ,2001,10,20,\n\
             Storm,2003,,140\n\
             Quake,2004,95,10,Nowhere\n",
        )
        .unwrap();
        let parsed = events_from_table(&t).unwrap();
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.skipped, 2);

        let flood = &parsed.events[0];
        assert_eq!(flood.category, "Flood");
        assert_eq!(flood.year, Some(1998));
        assert_eq!(flood.field("Location"), Some("Kanto"));

        let unknown = &parsed.events[1];
        assert_eq!(unknown.category, UNKNOWN_CATEGORY);
        assert_eq!(unknown.field("Location"), None);
    }

    #[test]
    fn coordinates_are_required() {
        let t = Table::parse("type,year\nFlood,2000\n").unwrap();
        assert!(events_from_table(&t).is_err());
    }
}
