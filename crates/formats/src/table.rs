use crate::error::FormatError;

/// A parsed CSV document: one header row plus string cells.
///
/// Column lookup is by best-effort name sniffing, since the source files use
/// inconsistent header spellings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = split_records(text).into_iter();
        let headers: Vec<String> = records
            .next()
            .ok_or(FormatError::EmptyTable)?
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(FormatError::EmptyTable);
        }

        let rows = records
            .filter(|r| !(r.len() == 1 && r[0].trim().is_empty()))
            .collect();
        Ok(Self { headers, rows })
    }

    /// First header matching any candidate, compared case-insensitively and
    /// ignoring `_`, `-` and spaces. Candidates are tried in order.
    pub fn column(&self, candidates: &[&str]) -> Option<usize> {
        let keys: Vec<String> = self.headers.iter().map(|h| header_key(h)).collect();
        candidates.iter().find_map(|c| {
            let want = header_key(c);
            keys.iter().position(|k| *k == want)
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn header_key(h: &str) -> String {
    h.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parses a numeric cell. Accepts thousands separators; placeholders such as
/// `..`, `NA` or `N/A` yield `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let v = cleaned.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// RFC 4180 splitting: quoted fields, doubled quotes, CRLF, and line breaks
/// inside quotes.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::{Table, parse_number};
    use crate::error::FormatError;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_quotes_and_crlf() {
        let t = Table::parse("name,value\r\n\"Korea, Rep.\",\"1,234\"\r\n\"say \"\"hi\"\"\",2\r\n")
            .unwrap();
        assert_eq!(t.headers, vec!["name", "value"]);
        assert_eq!(t.rows[0], vec!["Korea, Rep.", "1,234"]);
        assert_eq!(t.rows[1][0], "say \"hi\"");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn sniffs_columns_loosely() {
        let t = Table::parse("\u{feff}Country Code,Disaster_Type\nJPN,Flood\n").unwrap();
        assert_eq!(t.column(&["iso3", "country code"]), Some(0));
        assert_eq!(t.column(&["disaster type"]), Some(1));
        assert_eq!(t.column(&["missing"]), None);
        assert_eq!(t.cell(0, 1), Some("Flood"));
    }

    #[test]
    fn skips_blank_lines_and_rejects_empty_input() {
        let t = Table::parse("a,b\n\n1,2").unwrap();
        assert_eq!(t.rows, vec![vec!["1".to_string(), "2".to_string()]]);
        assert_eq!(Table::parse(""), Err(FormatError::EmptyTable));
    }

    #[test]
    fn number_parsing_handles_placeholders() {
        assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_number(".."), None);
        assert_eq!(parse_number("NA"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
