//! DOM side panels: timeline controls, legend, category filters, formula
//! panel, tooltip and the inline error box. Markup builders are pure so they
//! can be tested off-browser.

use formats::{DomIds, FormulaSheet};
use foundation::color::Rgb;
use foundation::math::Vec2;
use foundation::time::YearRange;
use layers::LegendEntry;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::tooltip::{NOT_AVAILABLE, Tooltip, format_value, place_tooltip};

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn element(doc: &Document, id: &str) -> Result<Element, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))
}

fn optional(doc: &Document, id: &str) -> Option<Element> {
    let el = doc.get_element_by_id(id);
    if el.is_none() {
        tracing::debug!("optional element #{id} not on page");
    }
    el
}

/// Shows `message` in the error box, falling back to the console.
pub fn show_error(ids: &DomIds, message: &str) {
    tracing::error!("{message}");
    let Ok(doc) = document() else {
        return;
    };
    if let Some(el) = optional(&doc, &ids.error) {
        el.set_text_content(Some(message));
        let _ = el.set_attribute("role", "alert");
        if let Ok(html) = el.dyn_into::<HtmlElement>() {
            html.set_hidden(false);
        }
    }
}

pub fn update_timeline(ids: &DomIds, range: YearRange, year: i32, playing: bool) -> Result<(), JsValue> {
    let doc = document()?;
    if let Some(el) = optional(&doc, &ids.slider) {
        let slider = el.dyn_into::<HtmlInputElement>()?;
        slider.set_min(&range.min.to_string());
        slider.set_max(&range.max.to_string());
        slider.set_value(&year.to_string());
        slider.set_disabled(playing);
    }
    if let Some(el) = optional(&doc, &ids.year_label) {
        el.set_text_content(Some(&year.to_string()));
    }
    if let Some(el) = optional(&doc, &ids.play_button) {
        el.set_text_content(Some(if playing { "Pause" } else { "Play" }));
        el.set_attribute("aria-pressed", if playing { "true" } else { "false" })?;
    }
    Ok(())
}

pub fn render_legend(ids: &DomIds, entries: &[LegendEntry]) -> Result<(), JsValue> {
    let doc = document()?;
    if let Some(el) = optional(&doc, &ids.legend) {
        el.set_inner_html(&legend_html(entries));
    }
    Ok(())
}

pub fn render_filters(ids: &DomIds, categories: &[(String, Rgb, bool)]) -> Result<(), JsValue> {
    let doc = document()?;
    if let Some(el) = optional(&doc, &ids.filters) {
        el.set_inner_html(&filters_html(categories));
    }
    Ok(())
}

pub fn render_formula(ids: &DomIds, sheet: Option<&FormulaSheet>) -> Result<(), JsValue> {
    let doc = document()?;
    let Some(el) = optional(&doc, &ids.formula) else {
        return Ok(());
    };
    match sheet {
        Some(sheet) => el.set_inner_html(&formula_html(sheet)),
        None => el.set_inner_html(""),
    }
    Ok(())
}

/// Shows, fills and positions the tooltip, or hides it for `None`.
pub fn update_tooltip(ids: &DomIds, tooltip: Option<&(Tooltip, Vec2)>, viewport: Vec2) -> Result<(), JsValue> {
    let doc = document()?;
    let Some(el) = optional(&doc, &ids.tooltip) else {
        return Ok(());
    };
    let el = el.dyn_into::<HtmlElement>()?;
    let Some((tip, cursor)) = tooltip else {
        el.set_hidden(true);
        return Ok(());
    };
    el.set_inner_html(&tooltip_html(tip));
    el.set_hidden(false);
    let size = Vec2::new(el.offset_width() as f64, el.offset_height() as f64);
    let pos = place_tooltip(*cursor, size, viewport);
    let style = el.style();
    style.set_property("left", &format!("{:.0}px", pos.x))?;
    style.set_property("top", &format!("{:.0}px", pos.y))?;
    Ok(())
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn bound(v: Option<f64>) -> String {
    v.map(format_value).unwrap_or_default()
}

pub fn legend_html(entries: &[LegendEntry]) -> String {
    let mut html = String::new();
    for e in entries {
        let label = match (e.lo, e.hi) {
            (None, None) => NOT_AVAILABLE.to_string(),
            (Some(lo), None) => format!("&ge; {}", format_value(lo)),
            (None, Some(hi)) => format!("&lt; {}", format_value(hi)),
            (lo, hi) => format!("{} &ndash; {}", bound(lo), bound(hi)),
        };
        html.push_str(&format!(
            r#"<div class="legend-row"><span class="swatch" style="background:{}"></span>{}</div>"#,
            e.color.to_hex(),
            label
        ));
    }
    html
}

pub fn filters_html(categories: &[(String, Rgb, bool)]) -> String {
    let mut html = String::new();
    for (category, color, enabled) in categories {
        let name = escape_html(category);
        html.push_str(&format!(
            r#"<label class="filter"><input type="checkbox" data-category="{name}"{}><span class="swatch" style="background:{}"></span>{name}</label>"#,
            if *enabled { " checked" } else { "" },
            color.to_hex(),
        ));
    }
    html
}

pub fn formula_html(sheet: &FormulaSheet) -> String {
    let mut lines = sheet.lines().into_iter();
    let mut html = String::new();
    if let Some(title) = lines.next() {
        html.push_str(&format!("<h3>{}</h3>", escape_html(&title)));
    }
    for line in lines {
        html.push_str(&format!("<p>{}</p>", escape_html(&line)));
    }
    html
}

pub fn tooltip_html(tip: &Tooltip) -> String {
    let mut html = format!("<strong>{}</strong>", escape_html(&tip.title));
    for (k, v) in &tip.rows {
        html.push_str(&format!("<br>{}: {}", escape_html(k), escape_html(v)));
    }
    html
}
