use crate::error::FormatError;
use crate::table::{Table, parse_number};

/// One `(region, year)` observation as read from a source file.
///
/// `region` is the raw code or name; canonicalization happens at join time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub region: String,
    pub name: Option<String>,
    pub year: i32,
    pub value: f64,
}

pub const REGION_COLUMNS: &[&str] = &[
    "iso3",
    "iso_a3",
    "country code",
    "country_code",
    "code",
    "region",
    "pref_code",
];
pub const NAME_COLUMNS: &[&str] = &[
    "name",
    "country name",
    "country",
    "prefecture",
    "pref",
    "pref_name",
];
pub const YEAR_COLUMNS: &[&str] = &["year", "yr", "date"];
pub const VALUE_COLUMNS: &[&str] = &[
    "value",
    "population",
    "pop",
    "risk",
    "risk score",
    "score",
    "count",
    "events",
];

/// Extracts observations from a long (`region,year,value`) or wide
/// (`region,1960,1961,...`) table.
///
/// Rows with a missing key or non-numeric value are skipped, not fatal.
pub fn rows_from_table(table: &Table) -> Result<Vec<TimeSeriesRow>, FormatError> {
    let region_col = table.column(REGION_COLUMNS);
    let name_col = table.column(NAME_COLUMNS);
    if region_col.is_none() && name_col.is_none() {
        return Err(FormatError::MissingColumn("region code or name".to_string()));
    }

    match table.column(YEAR_COLUMNS) {
        Some(year_col) => long_rows(table, region_col, name_col, year_col),
        None => wide_rows(table, region_col, name_col),
    }
}

fn row_key(
    table: &Table,
    row: usize,
    region_col: Option<usize>,
    name_col: Option<usize>,
) -> Option<(String, Option<String>)> {
    let name = name_col
        .and_then(|c| table.cell(row, c))
        .map(str::to_string);
    let region = region_col
        .and_then(|c| table.cell(row, c))
        .map(str::to_string)
        .or_else(|| name.clone())?;
    Some((region, name))
}

fn parse_year(cell: &str) -> Option<i32> {
    // Accept "1965", "1965.0" and ISO dates such as "1965-04-01".
    let head: String = cell.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if head.len() != 4 {
        return None;
    }
    head.parse().ok()
}

fn long_rows(
    table: &Table,
    region_col: Option<usize>,
    name_col: Option<usize>,
    year_col: usize,
) -> Result<Vec<TimeSeriesRow>, FormatError> {
    let value_col = table
        .column(VALUE_COLUMNS)
        .ok_or_else(|| FormatError::MissingColumn("value".to_string()))?;

    let mut out = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let Some((region, name)) = row_key(table, row, region_col, name_col) else {
            continue;
        };
        let Some(year) = table.cell(row, year_col).and_then(parse_year) else {
            continue;
        };
        let Some(value) = table.cell(row, value_col).and_then(parse_number) else {
            continue;
        };
        out.push(TimeSeriesRow {
            region,
            name,
            year,
            value,
        });
    }
    Ok(out)
}

fn wide_rows(
    table: &Table,
    region_col: Option<usize>,
    name_col: Option<usize>,
) -> Result<Vec<TimeSeriesRow>, FormatError> {
    let year_cols: Vec<(usize, i32)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| {
            let year = h.trim().parse::<i32>().ok()?;
            crate::manifest::YEAR_WINDOW.contains(&year).then_some((i, year))
        })
        .collect();
    if year_cols.is_empty() {
        return Err(FormatError::MissingColumn("year".to_string()));
    }

    let mut out = Vec::new();
    for row in 0..table.len() {
        let Some((region, name)) = row_key(table, row, region_col, name_col) else {
            continue;
        };
        for &(col, year) in &year_cols {
            if let Some(value) = table.cell(row, col).and_then(parse_number) {
                out.push(TimeSeriesRow {
                    region: region.clone(),
                    name: name.clone(),
                    year,
                    value,
                });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{TimeSeriesRow, rows_from_table};
    use crate::error::FormatError;
    use crate::table::Table;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_long_format() {
        let t = Table::parse("iso3,name,year,population\nJPN,Japan,1965,98.9\nJPN,Japan,1970,..\n")
            .unwrap();
        let rows = rows_from_table(&t).unwrap();
        assert_eq!(
            rows,
            vec![TimeSeriesRow {
                region: "JPN".to_string(),
                name: Some("Japan".to_string()),
                year: 1965,
                value: 98.9,
            }]
        );
    }

    #[test]
    fn reads_wide_format() {
        let t = Table::parse("Country Name,Country Code,1960,1961\nJapan,JPN,92.5,\nChile,CHL,8.1,8.3\n")
            .unwrap();
        let rows = rows_from_table(&t).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].region, "JPN");
        assert_eq!(rows[2].year, 1961);
        assert_eq!(rows[2].value, 8.3);
    }

    #[test]
    fn name_only_tables_key_by_name() {
        let t = Table::parse("prefecture,year,risk\nTokyo,2000-01-01,3.5\n").unwrap();
        let rows = rows_from_table(&t).unwrap();
        assert_eq!(rows[0].region, "Tokyo");
        assert_eq!(rows[0].year, 2000);
    }

    #[test]
    fn missing_key_columns_are_reported() {
        let t = Table::parse("foo,bar\n1,2\n").unwrap();
        assert!(matches!(
            rows_from_table(&t),
            Err(FormatError::MissingColumn(_))
        ));
    }
}
