use std::collections::BTreeMap;

use foundation::color::Rgb;

/// Stroke/visibility style shared by the canvas layers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub stroke: Rgb,
    /// Screen pixels; divided by the zoom scale when drawing.
    pub stroke_width: f64,
    pub opacity: f64,
}

impl LayerStyle {
    pub const fn new(visible: bool, stroke: Rgb, stroke_width: f64, opacity: f64) -> Self {
        Self {
            visible,
            stroke,
            stroke_width,
            opacity,
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            stroke: Rgb::new(255, 255, 255),
            stroke_width: 0.5,
            opacity: 1.0,
        }
    }
}

pub const NO_DATA_COLOR: Rgb = Rgb::new(0xd9, 0xd9, 0xd9);
pub const HIGHLIGHT_COLOR: Rgb = Rgb::new(0xff, 0xd7, 0x00);
pub const ARC_COLOR: Rgb = Rgb::new(0x33, 0x33, 0x33);

pub const DEFAULT_PALETTE: &str = "YlOrRd";

// ColorBrewer sequential schemes, 9 classes.
const YL_OR_RD: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];
const OR_RD: [&str; 9] = [
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59", "#ef6548", "#d7301f", "#b30000",
    "#7f0000",
];
const REDS: [&str; 9] = [
    "#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15",
    "#67000d",
];
const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];
const PURPLES: [&str; 9] = [
    "#fcfbfd", "#efedf5", "#dadaeb", "#bcbddc", "#9e9ac8", "#807dba", "#6a51a3", "#54278f",
    "#3f007d",
];

const CATEGORICAL: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

fn parse_all(hex: &[&str]) -> Vec<Rgb> {
    hex.iter().filter_map(|h| Rgb::from_hex(h)).collect()
}

/// Named sequential palette, case-insensitive. Unknown names fall back to
/// the default palette.
pub fn sequential_palette(name: &str) -> Vec<Rgb> {
    let scheme: &[&str] = match name.to_ascii_lowercase().as_str() {
        "ylorrd" => &YL_OR_RD,
        "orrd" => &OR_RD,
        "reds" => &REDS,
        "blues" => &BLUES,
        "purples" => &PURPLES,
        other => {
            tracing::warn!("unknown palette {other:?}; using {DEFAULT_PALETTE}");
            &YL_OR_RD
        }
    };
    parse_all(scheme)
}

/// Resamples a palette to exactly `n` colors by linear interpolation.
pub fn resample(palette: &[Rgb], n: usize) -> Vec<Rgb> {
    match (palette.len(), n) {
        (_, 0) | (0, _) => Vec::new(),
        (1, _) => vec![palette[0]; n],
        (len, 1) => vec![palette[len - 1]],
        (len, n) if len == n => palette.to_vec(),
        (len, n) => (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64 * (len - 1) as f64;
                let lo = (t.floor() as usize).min(len - 1);
                let hi = (lo + 1).min(len - 1);
                palette[lo].mix(palette[hi], t - lo as f64)
            })
            .collect(),
    }
}

/// Stable category → color assignment in sorted category order.
pub fn category_colors<'a>(categories: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, Rgb> {
    let scheme = parse_all(&CATEGORICAL);
    let mut sorted: Vec<&str> = categories.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, c)| (c.to_string(), scheme[i % scheme.len()]))
        .collect()
}
