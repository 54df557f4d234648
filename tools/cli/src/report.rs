//! Listing statistics and plain-text table rendering.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Columns shown by `search --format table` when `--fields` is not given.
pub const DEFAULT_FIELDS: [&str; 9] = [
    "price",
    "priceByArea",
    "size",
    "rooms",
    "bathrooms",
    "propertyType",
    "municipality",
    "district",
    "url",
];

/// Group name for listings without a value in the group-by field.
pub const UNKNOWN_GROUP: &str = "unknown";
/// Group name when no group-by field is given.
pub const ALL_GROUP: &str = "all";

const AVG_HEADERS: [&str; 6] = [
    "group",
    "count",
    "avg_price",
    "median_price",
    "avg_price_m2",
    "median_price_m2",
];

/// Summary statistics over a set of numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub avg: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Statistics over the present values, or `None` if there are none.
    pub fn compute<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut values: Vec<f64> = values.into_iter().flatten().collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        Some(Self {
            count,
            avg: values.iter().sum::<f64>() / count as f64,
            median,
            min: values[0],
            max: values[count - 1],
        })
    }
}

/// Price statistics of one group of listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub price: Option<Stats>,
    #[serde(rename = "priceByArea")]
    pub price_by_area: Option<Stats>,
}

/// Price statistics per group, ordered by group name.
pub fn group_stats(elements: &[Value], group_by: Option<&str>) -> BTreeMap<String, GroupStats> {
    let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for element in elements {
        let key = match group_by {
            Some(field) => group_key(element.get(field)),
            None => ALL_GROUP.to_string(),
        };
        groups.entry(key).or_default().push(element);
    }

    groups
        .into_iter()
        .map(|(key, items)| {
            let stats = GroupStats {
                price: Stats::compute(items.iter().map(|e| number(e, "price"))),
                price_by_area: Stats::compute(items.iter().map(|e| number(e, "priceByArea"))),
            };
            (key, stats)
        })
        .collect()
}

/// Group for a listing. Blank values (null, `false`, zero, empty string,
/// array or object) all fall into [`UNKNOWN_GROUP`].
fn group_key(value: Option<&Value>) -> String {
    match value {
        Some(value) if !is_blank(value) => cell(Some(value)),
        _ => UNKNOWN_GROUP.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn number(element: &Value, field: &str) -> Option<f64> {
    element.get(field).and_then(Value::as_f64)
}

/// Table of per-group averages and medians.
pub fn render_group_table(groups: &BTreeMap<String, GroupStats>) -> String {
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|(key, stats)| {
            let price = stats.price.as_ref();
            let price_m2 = stats.price_by_area.as_ref();
            vec![
                key.clone(),
                price.map_or(0, |s| s.count).to_string(),
                format_number(price.map(|s| s.avg), 0),
                format_number(price.map(|s| s.median), 0),
                format_number(price_m2.map(|s| s.avg), 0),
                format_number(price_m2.map(|s| s.median), 0),
            ]
        })
        .collect();
    render_table(&AVG_HEADERS, &rows)
}

/// Table of the first `limit` listings, one column per field.
pub fn render_listing_table<S: AsRef<str>>(
    elements: &[Value],
    fields: &[S],
    limit: Option<usize>,
) -> String {
    let limit = limit.unwrap_or(elements.len());
    let rows: Vec<Vec<String>> = elements
        .iter()
        .take(limit)
        .map(|element| {
            fields
                .iter()
                .map(|field| cell(element.get(field.as_ref())))
                .collect()
        })
        .collect();
    render_table(fields, &rows)
}

/// Text of one table cell. Strings are shown without quotes, booleans as
/// `True`/`False`, absent values as `-`.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Fixed-point number, or `-` when absent.
pub fn format_number(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", digits, v),
        None => "-".to_string(),
    }
}

/// Left-aligned columns padded to the widest cell, separated by two spaces,
/// with a dashed rule under the header.
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(pad_row(headers.iter().map(|h| h.as_ref()), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(pad_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
}
