use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use super::service::LookupResponse;

/// One selectable row: what the user sees and the identifier behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupItem {
    pub label: String,
    pub value: String,
}

impl LookupItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    /// The bound text input.
    Input,
    /// The target field; the bound input when no separate target exists.
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWrite {
    pub slot: FieldSlot,
    pub value: String,
}

/// Adapts a lookup endpoint's response shape to the generic widget.
pub trait ResultAdapter {
    /// Search term sent for the current input value.
    fn query(&self, input_value: &str) -> String {
        normalize_query(input_value)
    }

    fn records(&self, response: &LookupResponse) -> Vec<LookupItem>;

    /// Writes performed when `item` is selected, applied in order.
    fn distribute(&self, item: &LookupItem) -> Vec<FieldWrite> {
        vec![
            FieldWrite {
                slot: FieldSlot::Input,
                value: item.label.clone(),
            },
            FieldWrite {
                slot: FieldSlot::Target,
                value: item.value.clone(),
            },
        ]
    }
}

/// NFKC-normalised, whitespace collapsed and trimmed.
pub fn normalize_query(input: &str) -> String {
    let normalized = input.nfkc().collect::<String>();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reads `text` and `value` fields from each record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextValueAdapter;

impl ResultAdapter for TextValueAdapter {
    fn records(&self, response: &LookupResponse) -> Vec<LookupItem> {
        response
            .records()
            .iter()
            .filter_map(|record| {
                let label = scalar_text(record.get("text")?)?;
                let value = record
                    .get("value")
                    .and_then(scalar_text)
                    .unwrap_or_else(|| label.clone());
                Some(LookupItem { label, value })
            })
            .collect()
    }
}

/// Company search results: `title` is shown, `company_number` is stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyLookupAdapter {
    pad_width: Option<usize>,
}

/// Width of a Companies House registration number.
pub const COMPANY_NUMBER_WIDTH: usize = 8;

impl CompanyLookupAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left-pads numbers with `0` up to `width` characters.
    pub fn padded(width: usize) -> Self {
        Self {
            pad_width: Some(width),
        }
    }

    fn company_number(&self, raw: &Value) -> Option<String> {
        let number = scalar_text(raw)?;
        let number = number.trim();
        if number.is_empty() {
            return None;
        }
        Some(match self.pad_width {
            Some(width) if number.chars().count() < width => {
                format!("{number:0>width$}")
            }
            _ => number.to_string(),
        })
    }
}

impl ResultAdapter for CompanyLookupAdapter {
    fn records(&self, response: &LookupResponse) -> Vec<LookupItem> {
        response
            .records()
            .iter()
            .filter_map(|record| {
                let label = scalar_text(record.get("title")?)?;
                let value = self.company_number(record.get("company_number")?)?;
                Some(LookupItem { label, value })
            })
            .collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
