use serde::Deserialize;
use serde_json::Value;
use time::PrimitiveDateTime;

use crate::parse_obs_time;

/// API convention for "no data".
pub const SENTINEL: &str = "-999";
const SENTINEL_VALUE: f64 = -999.0;

pub const AIR_TEMPERATURE: &str = "AirTemperature";
pub const AIR_PRESSURE: &str = "AirPressure";

/// Response body as returned by the API, untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawResponse(pub Value);

impl RawResponse {
    /// Station records, found under `records.location` or `records.Station`
    /// depending on the API version.
    pub fn records(&self) -> &[Value] {
        let Some(records) = self.0.get("records") else {
            return &[];
        };
        ["location", "Station"]
            .iter()
            .find_map(|key| {
                records
                    .get(*key)
                    .and_then(Value::as_array)
                    .filter(|list| !list.is_empty())
            })
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StationRecord {
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub obs_time: Option<ObsTime>,
    #[serde(default)]
    pub weather_element: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObsTime {
    #[serde(default)]
    pub date_time: Option<String>,
}

impl StationRecord {
    pub fn station_id(&self) -> Option<&str> {
        non_blank(self.station_id.as_deref())
    }

    pub fn station_name(&self) -> Option<&str> {
        non_blank(self.station_name.as_deref())
    }

    pub fn observed_at(&self) -> Option<&str> {
        non_blank(self.obs_time.as_ref().and_then(|t| t.date_time.as_deref()))
    }

    pub fn elements(&self) -> Elements {
        Elements::from_value(self.weather_element.as_ref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Which layout `WeatherElement` arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    /// `{"AirTemperature": .., "AirPressure": ..}`
    Flat,
    /// `[{"ElementName": .., "ElementValue": ..}, ..]`
    Pairs,
    /// Missing or neither of the above
    Absent,
}

/// Canonical form of a record's weather elements, prior to validation.
///
/// `None` means the element is not defined at all; a pair without a value
/// is `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Elements {
    pub shape: ElementShape,
    pub temperature: Option<Value>,
    pub pressure: Option<Value>,
}

impl Elements {
    /// The flat layout always carries pressure. A pair list only has to once
    /// it lists an `AirPressure` entry; without one pressure is stored as NULL.
    pub fn requires_pressure(&self) -> bool {
        match self.shape {
            ElementShape::Flat => true,
            ElementShape::Pairs => self.pressure.is_some(),
            ElementShape::Absent => false,
        }
    }

    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(fields)) => Elements {
                shape: ElementShape::Flat,
                temperature: fields.get(AIR_TEMPERATURE).cloned(),
                pressure: fields.get(AIR_PRESSURE).cloned(),
            },
            Some(Value::Array(pairs)) => Elements {
                shape: ElementShape::Pairs,
                temperature: find_pair(pairs, AIR_TEMPERATURE),
                pressure: find_pair(pairs, AIR_PRESSURE),
            },
            _ => Elements {
                shape: ElementShape::Absent,
                temperature: None,
                pressure: None,
            },
        }
    }
}

fn find_pair(pairs: &[Value], name: &str) -> Option<Value> {
    pairs
        .iter()
        .find(|pair| pair.get("ElementName").and_then(Value::as_str) == Some(name))
        .map(|pair| pair.get("ElementValue").cloned().unwrap_or(Value::Null))
}

/// A single element value after sentinel and type checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Missing,
    Sentinel,
    Value(f64),
    Invalid(String),
}

impl Reading {
    pub fn classify(value: Option<&Value>) -> Reading {
        match value {
            None | Some(Value::Null) => Reading::Missing,
            Some(Value::String(raw)) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    Reading::Missing
                } else if raw == SENTINEL {
                    Reading::Sentinel
                } else {
                    match raw.parse::<f64>() {
                        Ok(v) if v == SENTINEL_VALUE => Reading::Sentinel,
                        Ok(v) if v.is_finite() => Reading::Value(v),
                        _ => Reading::Invalid(raw.to_string()),
                    }
                }
            }
            Some(Value::Number(number)) => match number.as_f64() {
                Some(v) if v == SENTINEL_VALUE => Reading::Sentinel,
                Some(v) => Reading::Value(v),
                None => Reading::Invalid(number.to_string()),
            },
            Some(other) => Reading::Invalid(other.to_string()),
        }
    }

    /// Absent or flagged as no-data.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Reading::Missing | Reading::Sentinel)
    }
}

/// Accepts `2024-05-01 12:30:00` and `2024-05-01T12:30:00+08:00`.
///
/// Anything after a `+` and a trailing `Z` are dropped; the result is naive.
pub fn parse_observation_time(raw: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let trimmed = raw.trim();
    let local = trimmed.split('+').next().unwrap_or(trimmed);
    let local = local.strip_suffix('Z').unwrap_or(local);
    parse_obs_time(&local.replacen('T', " ", 1))
}
