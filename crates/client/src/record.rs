// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured records decoded from provider JSON.
//!
//! Every string leaf is inspected once: `YYYY-MM-DD` becomes a [`Value::Date`],
//! `YYYY-MM-DD[T ]HH:MM:SS[.mmm][ZONE]` a [`Value::Timestamp`], and a lowercase
//! hyphenated UUID a [`Value::Uuid`]. Everything else passes through.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use uuid::Uuid;

struct Patterns {
    date: Regex,
    datetime: Regex,
    uuid: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            date: Regex::new(r"^[0-9]{4}-[0-9][0-9]-[0-9][0-9]$")?,
            datetime: Regex::new(concat!(
                r"^([0-9]{4}-[0-9][0-9]-[0-9][0-9])[T ]",
                r"([0-9][0-9]:[0-9][0-9]:[0-9][0-9](?:\.[0-9]{3})?)",
                r"([A-Z]{1,5}|GMT[+-][0-9]+)?$",
            ))?,
            uuid: Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")?,
        })
    }
}

/// `None` only if a pattern fails to compile; leaves then pass through.
static PATTERNS: LazyLock<Option<Patterns>> = LazyLock::new(|| Patterns::compile().ok());

/// A timestamp leaf. The offset is known only for `Z`, `UTC`, `GMT` and
/// `GMT±N` suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl Timestamp {
    pub fn to_fixed(&self) -> Option<DateTime<FixedOffset>> {
        let offset = self.offset?;
        offset.from_local_datetime(&self.local).single()
    }

    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        self.to_fixed().map(|t| t.with_timezone(&Utc))
    }
}

/// A decoded JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Date(NaiveDate),
    Timestamp(Timestamp),
    Uuid(Uuid),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => decode_str(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => Self::Record(Record::from(map)),
        }
    }
}

/// Apply the scalar decoding rules to one string.
pub fn decode_str(s: String) -> Value {
    let Some(patterns) = PATTERNS.as_ref() else {
        return Value::String(s);
    };
    if patterns.date.is_match(&s) {
        if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            return Value::Date(date);
        }
    } else if let Some(caps) = patterns.datetime.captures(&s) {
        let text = format!("{} {}", &caps[1], &caps[2]);
        if let Ok(local) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f") {
            let offset = caps.get(3).and_then(|zone| zone_offset(zone.as_str()));
            return Value::Timestamp(Timestamp { local, offset });
        }
    } else if patterns.uuid.is_match(&s) {
        if let Ok(uuid) = Uuid::parse_str(&s) {
            return Value::Uuid(uuid);
        }
    }
    Value::String(s)
}

fn zone_offset(zone: &str) -> Option<FixedOffset> {
    match zone {
        "Z" | "UTC" | "GMT" => return FixedOffset::east_opt(0),
        _ => {}
    }
    let rest = zone.strip_prefix("GMT")?;
    let (sign, digits) = match rest.split_at_checked(1)? {
        ("+", d) => (1, d),
        ("-", d) => (-1, d),
        _ => return None,
    };
    // `GMT-3` is hours, `GMT-0300` is hours and minutes.
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Ordered field-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect() }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(Value::as_date)
    }

    pub fn timestamp(&self, name: &str) -> Option<Timestamp> {
        self.get(name).and_then(Value::as_timestamp)
    }

    pub fn uuid(&self, name: &str) -> Option<Uuid> {
        self.get(name).and_then(Value::as_uuid)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Value::as_record)
    }

    /// String items of a list field, skipping anything that is not a string.
    pub fn strings(&self, name: &str) -> Vec<&str> {
        self.list(name).unwrap_or_default().iter().filter_map(Value::as_str).collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Self::Timestamp(t) => match t.to_fixed() {
                Some(fixed) => serializer.collect_str(&fixed.to_rfc3339()),
                None => serializer.collect_str(&t.local.format("%Y-%m-%dT%H:%M:%S%.f")),
            },
            Self::Uuid(u) => serializer.collect_str(&u.hyphenated()),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(r) => r.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
