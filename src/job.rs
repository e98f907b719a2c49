use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tiny_bail::prelude::*;

/// A job posting as served by the recruiting API.
///
/// Only `id` is guaranteed. Everything else comes from an upstream that
/// regularly sends `null`, numbers in string fields, or nothing at all.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Debug)]
pub struct JobRecord {
    /// Unique within a fetched batch. Numeric ids are stringified.
    pub id: String,
    pub title: Option<String>,
    /// Rich-text (HTML) description.
    pub description: Option<String>,
    pub category_name: Option<String>,
    pub organization: Option<String>,
    pub organization_logo: Option<String>,
    /// Possibly a delimited list, e.g. `"Lahore, Karachi & Islamabad"`.
    pub city: Option<String>,
    pub country: Option<String>,
    pub salary: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Public identifier used in outbound links.
    pub encrypted_id: Option<String>,
    pub positions: Option<String>,
    /// The organization's profile URL.
    pub url: Option<String>,
}

impl Display for JobRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title.as_deref().unwrap_or("Untitled"))
    }
}

impl JobRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Reads a record out of an upstream JSON object. Returns `None` when
    /// the value is not an object or carries no usable `id`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let id = text_field(fields, "id")?;

        Some(Self {
            id,
            title: text_field(fields, "title"),
            description: text_field(fields, "description"),
            category_name: text_field(fields, "category_name"),
            organization: text_field(fields, "organization"),
            organization_logo: text_field(fields, "organization_logo"),
            city: text_field(fields, "city"),
            country: text_field(fields, "country"),
            salary: number_field(fields, "salary").or_else(|| number_field(fields, "Salary")),
            start_date: text_field(fields, "start_date"),
            end_date: text_field(fields, "end_date"),
            encrypted_id: text_field(fields, "encrypted_id"),
            positions: text_field(fields, "positions"),
            url: text_field(fields, "url"),
        })
    }

    pub fn started(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(parse_date)
    }

    pub fn ends(&self) -> Option<NaiveDate> {
        self.end_date.as_deref().and_then(parse_date)
    }

    /// Whole days between the start date and `today`, if the start date parses.
    pub fn days_since_start(&self, today: NaiveDate) -> Option<i64> {
        self.started().map(|date| days_ago(date, today))
    }
}

/// A hiring organization as served by the recruiting API.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Debug)]
pub struct Company {
    pub id: Option<String>,
    pub encrypted_id: Option<String>,
    pub organization: Option<String>,
    pub organization_logo: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub positions: Option<String>,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl Display for Company {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.organization.as_deref().unwrap_or("Unknown"))
    }
}

impl Company {
    pub fn from_json(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;

        Some(Self {
            id: text_field(fields, "id"),
            encrypted_id: text_field(fields, "encrypted_id"),
            organization: text_field(fields, "organization"),
            organization_logo: text_field(fields, "organization_logo"),
            city: text_field(fields, "city"),
            country: text_field(fields, "country"),
            positions: text_field(fields, "positions"),
            category_name: text_field(fields, "category_name"),
            description: text_field(fields, "description"),
            url: text_field(fields, "url"),
        })
    }
}

/// Extracts the items of a listing payload, either `{ "results": [...] }` or
/// a bare array. Items that `parse` rejects are skipped, with one warning
/// summarizing how many.
pub fn decode_listing<T>(body: &Value, parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    let items = match body.get("results").unwrap_or(body) {
        Value::Array(items) => items,
        _ => {
            log::warn!("Listing payload has no results array");
            return Vec::new();
        }
    };

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        parsed.push(cq!(parse(item)));
    }
    if parsed.len() < items.len() {
        log::warn!(
            "Skipped {} malformed listing items ({} kept)",
            items.len() - parsed.len(),
            parsed.len(),
        );
    }

    parsed
}

/// Parses an upstream date.
///
/// Accepted formats, tried in order: RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD`, `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// Whole days from `date` to `today`. Negative when `date` is in the future.
pub fn days_ago(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match fields.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn number_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let number = match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_json_tolerates_messy_fields() {
        let job = JobRecord::from_json(&json!({
            "id": 42,
            "title": "  Backend Engineer ",
            "description": null,
            "city": "",
            "country": "Pakistan",
            "Salary": "150,000",
            "start_date": "12/03/2024",
            "unexpected": { "nested": true },
        }))
        .unwrap();

        assert_eq!(job.id, "42");
        assert_eq!(job.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(job.description, None);
        assert_eq!(job.city, None);
        assert_eq!(job.salary, Some(150_000.0));
        assert_eq!(job.started(), NaiveDate::from_ymd_opt(2024, 3, 12));
    }

    #[test]
    fn from_json_requires_id() {
        assert_eq!(JobRecord::from_json(&json!({ "title": "No id" })), None);
        assert_eq!(JobRecord::from_json(&json!({ "id": "  " })), None);
        assert_eq!(JobRecord::from_json(&json!(["not", "an", "object"])), None);
    }

    #[test]
    fn listing_shapes() {
        let wrapped = json!({ "results": [{ "id": 1 }, { "title": "broken" }, { "id": "b" }] });
        let ids = decode_listing(&wrapped, JobRecord::from_json)
            .into_iter()
            .map(|job| job.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, ["1", "b"]);

        let bare = json!([{ "organization": "Acme" }]);
        let companies = decode_listing(&bare, Company::from_json);
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].to_string(), "Acme");

        assert!(decode_listing(&json!({ "message": "nope" }), JobRecord::from_json).is_empty());
        assert!(decode_listing(&json!([null, 3, {}]), JobRecord::from_json).is_empty());
    }

    #[test]
    fn dates() {
        let march_12 = NaiveDate::from_ymd_opt(2024, 3, 12);
        for (raw, expected) in [
            ("2024-03-12", march_12),
            ("2024-03-12T08:30:00Z", march_12),
            ("2024-03-12T23:30:00+05:00", march_12),
            ("2024-03-12 08:30:00", march_12),
            ("12/03/2024", march_12),
            (" 12/03/2024 ", march_12),
            ("31/02/2024", None),
            ("next week", None),
            ("", None),
        ] {
            assert_eq!(parse_date(raw), expected, "{}", raw);
        }
    }

    #[test]
    fn days_since_start() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut job = JobRecord::new("1");
        assert_eq!(job.days_since_start(today), None);

        job.start_date = Some("2024-03-12".into());
        assert_eq!(job.days_since_start(today), Some(3));

        job.start_date = Some("2024-03-20".into());
        assert_eq!(job.days_since_start(today), Some(-5));
    }
}
