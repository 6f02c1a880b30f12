use formats::DisasterEvent;
use foundation::math::Vec2;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// Gap between the cursor and the tooltip's top-left corner.
const CURSOR_OFFSET: f64 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Tooltip {
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];
        out.extend(self.rows.iter().map(|(k, v)| format!("{k}: {v}")));
        out
    }
}

pub fn region_tooltip(name: &str, value: Option<f64>, year: i32, value_label: &str) -> Tooltip {
    let title = if name.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        name.trim().to_string()
    };
    let value = value
        .map(format_value)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    Tooltip {
        title,
        rows: vec![
            ("Year".to_string(), year.to_string()),
            (value_label.to_string(), value),
        ],
    }
}

pub fn point_tooltip(event: &DisasterEvent) -> Tooltip {
    let year = event
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let location = field_ci(event, &["location", "country", "region"]).unwrap_or(UNKNOWN);
    let deaths = field_ci(event, &["deaths", "total deaths", "fatalities"]).unwrap_or(NOT_AVAILABLE);
    let magnitude = field_ci(event, &["magnitude", "dis mag value"]).unwrap_or(NOT_AVAILABLE);
    Tooltip {
        title: event.category.clone(),
        rows: vec![
            ("Year".to_string(), year),
            ("Location".to_string(), location.to_string()),
            ("Deaths".to_string(), deaths.to_string()),
            ("Magnitude".to_string(), magnitude.to_string()),
        ],
    }
}

fn field_ci<'a>(event: &'a DisasterEvent, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|want| {
        event
            .fields
            .iter()
            .find(|(k, v)| k.trim().eq_ignore_ascii_case(want) && !v.is_empty())
            .map(|(_, v)| v.as_str())
    })
}

/// Thousands separators, up to two decimals, trailing zeros dropped.
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let rounded = (v * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let frac = frac_part.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

/// Top-left corner for a tooltip of `size` near `cursor`, flipped to the
/// other side of the cursor when it would overflow, then clamped inside.
pub fn place_tooltip(cursor: Vec2, size: Vec2, viewport: Vec2) -> Vec2 {
    let mut x = cursor.x + CURSOR_OFFSET;
    let mut y = cursor.y + CURSOR_OFFSET;
    if x + size.x > viewport.x {
        x = cursor.x - CURSOR_OFFSET - size.x;
    }
    if y + size.y > viewport.y {
        y = cursor.y - CURSOR_OFFSET - size.y;
    }
    let max_x = (viewport.x - size.x).max(0.0);
    let max_y = (viewport.y - size.y).max(0.0);
    Vec2::new(x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}

#[cfg(test)]
mod tests {
    use super::{NOT_AVAILABLE, UNKNOWN, format_value, place_tooltip, point_tooltip, region_tooltip};
    use formats::DisasterEvent;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn formats_numbers() {
        assert_eq!(format_value(1234567.0), "1,234,567");
        assert_eq!(format_value(64.8), "64.8");
        assert_eq!(format_value(-1000.456), "-1,000.46");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(f64::NAN), NOT_AVAILABLE);
    }

    #[test]
    fn region_tooltip_falls_back() {
        let t = region_tooltip("", None, 1999, "Risk");
        assert_eq!(t.title, UNKNOWN);
        assert_eq!(t.lines(), vec!["Unknown", "Year: 1999", "Risk: N/A"]);
    }

    #[test]
    fn point_tooltip_reads_fields_case_insensitively() {
        let mut fields = BTreeMap::new();
        fields.insert("LOCATION".to_string(), "Kobe".to_string());
        fields.insert("Magnitude".to_string(), "6.9".to_string());
        let event = DisasterEvent {
            category: "Earthquake".to_string(),
            year: None,
            lon_deg: 135.0,
            lat_deg: 34.6,
            fields,
        };
        let t = point_tooltip(&event);
        assert_eq!(t.title, "Earthquake");
        assert_eq!(
            t.rows,
            vec![
                ("Year".to_string(), "N/A".to_string()),
                ("Location".to_string(), "Kobe".to_string()),
                ("Deaths".to_string(), "N/A".to_string()),
                ("Magnitude".to_string(), "6.9".to_string()),
            ]
        );
    }

    #[test]
    fn tooltip_stays_inside_viewport() {
        let viewport = Vec2::new(800.0, 600.0);
        let size = Vec2::new(200.0, 80.0);
        assert_eq!(place_tooltip(Vec2::new(10.0, 10.0), size, viewport), Vec2::new(22.0, 22.0));
        assert_eq!(
            place_tooltip(Vec2::new(790.0, 590.0), size, viewport),
            Vec2::new(578.0, 498.0)
        );
        let huge = Vec2::new(1000.0, 1000.0);
        assert_eq!(place_tooltip(Vec2::new(400.0, 300.0), huge, viewport), Vec2::new(0.0, 0.0));
    }
}
