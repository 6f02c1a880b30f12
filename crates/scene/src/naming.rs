//! Canonical region identifiers from heterogeneous GeoJSON property bags.
//!
//! Country maps resolve to ISO-3166 alpha-3 codes; prefecture maps resolve to
//! a cleaned romanized prefecture name. Both consult an alias table for known
//! source/target spelling mismatches.

use std::collections::{BTreeMap, BTreeSet};

use formats::MapKind;
use foundation::ids::RegionId;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// `None` when no candidate property held a usable value.
    pub id: Option<RegionId>,
    pub display_name: String,
    /// `false` for best-effort guesses (id not present in the known set).
    pub matched: bool,
}

const COUNTRY_CODE_PROPS: &[&str] = &[
    "ISO_A3", "iso_a3", "ISO3", "iso3", "ADM0_A3", "adm0_a3", "SOV_A3", "GU_A3", "id",
];
const COUNTRY_NAME_PROPS: &[&str] = &["NAME", "name", "NAME_EN", "ADMIN", "admin", "NAME_LONG"];
const PREFECTURE_NAME_PROPS: &[&str] = &[
    "nam", "name", "NAME_1", "name_en", "nam_ja", "N03_001", "pref", "prefecture",
];

/// Source code → canonical code.
const COUNTRY_CODE_ALIASES: &[(&str, &str)] = &[
    ("KOS", "XKX"),
    ("SDS", "SSD"),
    ("SAH", "ESH"),
    ("PSX", "PSE"),
    ("ROM", "ROU"),
    ("ZAR", "COD"),
    ("TMP", "TLS"),
];

/// Cleaned country name → canonical code, for sources without codes.
const COUNTRY_NAME_ALIASES: &[(&str, &str)] = &[
    ("united states of america", "USA"),
    ("united states", "USA"),
    ("japan", "JPN"),
    ("russia", "RUS"),
    ("russian federation", "RUS"),
    ("south korea", "KOR"),
    ("korea rep", "KOR"),
    ("republic of korea", "KOR"),
    ("north korea", "PRK"),
    ("korea dem peoples rep", "PRK"),
    ("democratic republic of the congo", "COD"),
    ("congo dem rep", "COD"),
    ("ivory coast", "CIV"),
    ("cote divoire", "CIV"),
    ("czechia", "CZE"),
    ("czech republic", "CZE"),
    ("china", "CHN"),
    ("india", "IND"),
    ("indonesia", "IDN"),
    ("philippines", "PHL"),
    ("iran", "IRN"),
    ("iran islamic rep", "IRN"),
    ("turkey", "TUR"),
    ("turkiye", "TUR"),
    ("vietnam", "VNM"),
    ("viet nam", "VNM"),
];

/// Kanji prefecture names (suffix stripped) and common romanization variants
/// → canonical romanized name.
const PREFECTURE_ALIASES: &[(&str, &str)] = &[
    ("北海道", "hokkaido"),
    ("青森", "aomori"),
    ("岩手", "iwate"),
    ("宮城", "miyagi"),
    ("秋田", "akita"),
    ("山形", "yamagata"),
    ("福島", "fukushima"),
    ("茨城", "ibaraki"),
    ("栃木", "tochigi"),
    ("群馬", "gunma"),
    ("埼玉", "saitama"),
    ("千葉", "chiba"),
    ("東京", "tokyo"),
    ("神奈川", "kanagawa"),
    ("新潟", "niigata"),
    ("富山", "toyama"),
    ("石川", "ishikawa"),
    ("福井", "fukui"),
    ("山梨", "yamanashi"),
    ("長野", "nagano"),
    ("岐阜", "gifu"),
    ("静岡", "shizuoka"),
    ("愛知", "aichi"),
    ("三重", "mie"),
    ("滋賀", "shiga"),
    ("京都", "kyoto"),
    ("大阪", "osaka"),
    ("兵庫", "hyogo"),
    ("奈良", "nara"),
    ("和歌山", "wakayama"),
    ("鳥取", "tottori"),
    ("島根", "shimane"),
    ("岡山", "okayama"),
    ("広島", "hiroshima"),
    ("山口", "yamaguchi"),
    ("徳島", "tokushima"),
    ("香川", "kagawa"),
    ("愛媛", "ehime"),
    ("高知", "kochi"),
    ("福岡", "fukuoka"),
    ("佐賀", "saga"),
    ("長崎", "nagasaki"),
    ("熊本", "kumamoto"),
    ("大分", "oita"),
    ("宮崎", "miyazaki"),
    ("鹿児島", "kagoshima"),
    ("沖縄", "okinawa"),
    ("hokkai do", "hokkaido"),
    ("gumma", "gunma"),
    ("hyougo", "hyogo"),
    ("ooita", "oita"),
    ("kouchi", "kochi"),
];

/// Romanized administrative suffixes, longest first.
const ROMAJI_SUFFIXES: &[&str] = &[" prefecture", " pref", " ken", " fu", " to"];
const KANJI_SUFFIXES: &[char] = &['県', '府', '都'];

#[derive(Debug, Clone)]
pub struct NameResolver {
    kind: MapKind,
    aliases: BTreeMap<String, String>,
    known: Option<BTreeSet<RegionId>>,
}

impl NameResolver {
    pub fn new(kind: MapKind) -> Self {
        let table: &[(&str, &str)] = match kind {
            MapKind::World => COUNTRY_CODE_ALIASES,
            MapKind::Japan => PREFECTURE_ALIASES,
        };
        let mut aliases: BTreeMap<String, String> = table
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if kind == MapKind::World {
            aliases.extend(
                COUNTRY_NAME_ALIASES
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            );
        }
        Self {
            kind,
            aliases,
            known: None,
        }
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// Adds or replaces an alias. Keys are cleaned like any other input.
    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        let key = match self.kind {
            MapKind::World if is_alpha3(from) => from.trim().to_ascii_uppercase(),
            _ => clean_name(from),
        };
        self.aliases.insert(key, to.to_string());
        self
    }

    /// Restricts `matched` to ids present in the loaded data.
    pub fn with_known_ids(mut self, known: impl IntoIterator<Item = RegionId>) -> Self {
        self.known = Some(known.into_iter().collect());
        self
    }

    pub fn resolve(&self, feature_id: Option<&str>, props: &Map<String, Value>) -> Resolution {
        let display_name = first_text(props, self.display_props())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let id = match self.kind {
            MapKind::World => {
                let from_props = COUNTRY_CODE_PROPS
                    .iter()
                    .filter_map(|k| prop_text(props, k))
                    .find(|v| is_alpha3(v));
                from_props
                    .or_else(|| feature_id.filter(|v| is_alpha3(v)).map(str::to_string))
                    .and_then(|code| self.canonicalize(&code))
                    .or_else(|| self.canonicalize(&display_name))
            }
            MapKind::Japan => first_text(props, PREFECTURE_NAME_PROPS)
                .and_then(|name| self.canonicalize(&name)),
        };

        let matched = match (&id, &self.known) {
            (None, _) => false,
            (Some(id), Some(known)) => known.contains(id),
            (Some(_), None) => true,
        };
        Resolution {
            id,
            display_name,
            matched,
        }
    }

    /// Canonical id for a raw code or name as it appears in a data table.
    pub fn canonicalize(&self, raw: &str) -> Option<RegionId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self.kind {
            MapKind::World => {
                if is_alpha3(raw) {
                    let code = raw.to_ascii_uppercase();
                    let code = self.aliases.get(&code).cloned().unwrap_or(code);
                    return Some(RegionId::new(code));
                }
                let cleaned = clean_name(raw);
                self.aliases.get(&cleaned).map(|c| RegionId::new(c.clone()))
            }
            MapKind::Japan => {
                let cleaned = strip_prefecture_suffix(&clean_name(raw));
                if cleaned.is_empty() {
                    return None;
                }
                let canonical = self.aliases.get(&cleaned).cloned().unwrap_or(cleaned);
                Some(RegionId::new(canonical))
            }
        }
    }

    fn display_props(&self) -> &'static [&'static str] {
        match self.kind {
            MapKind::World => COUNTRY_NAME_PROPS,
            MapKind::Japan => PREFECTURE_NAME_PROPS,
        }
    }
}

fn prop_text(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| prop_text(props, k))
}

/// Exactly three ASCII letters; rejects placeholders such as `-99`.
pub fn is_alpha3(s: &str) -> bool {
    let s = s.trim();
    s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// Width-folds, lowercases, strips punctuation and collapses whitespace.
///
/// Latin letters with macrons or accents common in Japanese romanization
/// lose their diacritics (`Kōchi` → `kochi`). Half-width katakana become
/// full-width with voiced sound marks composed (`ｶﾞ` → `ガ`). Other
/// compatibility forms such as ligatures or circled digits pass through.
pub fn clean_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in fold_compat(s).into_iter().map(fold_diacritic) {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || matches!(c, '-' | '_' | '/') {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_prefecture_suffix(cleaned: &str) -> String {
    for suffix in ROMAJI_SUFFIXES {
        if let Some(stem) = cleaned.strip_suffix(suffix) {
            if !stem.is_empty() {
                return stem.to_string();
            }
        }
    }
    if let Some(last) = cleaned.chars().last() {
        if KANJI_SUFFIXES.contains(&last) && cleaned.chars().count() > 2 {
            let mut chars = cleaned.chars();
            chars.next_back();
            return chars.as_str().to_string();
        }
    }
    cleaned.to_string()
}

/// Full-width forms of U+FF61..=U+FF9D, in code point order.
const HALFWIDTH_KATAKANA: &str = "。「」、・ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン";

/// Width-folds every char and joins voiced sound marks onto the kana
/// before them. Marks with nothing to join are dropped.
fn fold_compat(s: &str) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(s.len());
    for c in s.chars() {
        let step = match c {
            '\u{ff9e}' | '\u{3099}' | '\u{309b}' => 1,
            '\u{ff9f}' | '\u{309a}' | '\u{309c}' => 2,
            _ => {
                out.push(fold_width(c));
                continue;
            }
        };
        if let Some(last) = out.last_mut() {
            if let Some(voiced) = voice(*last, step) {
                *last = voiced;
            }
        }
    }
    out
}

/// Full-width ASCII, the ideographic space and half-width katakana to their
/// canonical forms.
fn fold_width(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{ff01}'..='\u{ff5e}' => char::from_u32(c as u32 - 0xfee0).unwrap_or(c),
        '\u{ff61}'..='\u{ff9d}' => HALFWIDTH_KATAKANA
            .chars()
            .nth((c as u32 - 0xff61) as usize)
            .unwrap_or(c),
        _ => c,
    }
}

/// Kana with a dakuten (`step` 1) or handakuten (`step` 2) applied.
fn voice(c: char, step: u32) -> Option<char> {
    let code = c as u32;
    // Hiragana share the katakana layout 0x60 code points lower.
    let shift = if (0x3041..=0x3096).contains(&code) { 0x60 } else { 0 };
    let kana = code + shift;
    let voiced = match (kana, step) {
        (0x30ab..=0x30c1, 1) if kana % 2 == 1 => kana + 1,
        (0x30c4 | 0x30c6 | 0x30c8, 1) => kana + 1,
        (0x30cf..=0x30db, _) if (kana - 0x30cf) % 3 == 0 => kana + step,
        (0x30a6, 1) => 0x30f4,
        _ => return None,
    };
    char::from_u32(voiced - shift)
}

fn fold_diacritic(c: char) -> char {
    match c {
        'ā' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Ā' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'ē' | 'é' | 'è' | 'ê' | 'ë' => 'e',
        'Ē' | 'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'ī' | 'í' | 'ì' | 'î' | 'ï' => 'i',
        'Ī' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ō' | 'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ō' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ū' | 'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ū' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => c,
    }
}
