#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized record types shared by the fetchers, the snapshot store, and
//! the API server.
//!
//! Upstream payloads arrive as loosely-typed [`serde_json::Value`] trees.
//! The types in this crate are the stable shapes those trees are mapped
//! into before they are cached or served.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the upstream feeds polled by the refresher.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceId {
    /// GDACS XML/RSS alert feed.
    Gdacs,
    /// `ReliefWeb` JSON disaster catalog.
    ReliefWeb,
    /// Weather provider (server location).
    Weather,
}

impl SourceId {
    /// All sources, in refresh order.
    pub const ALL: &[Self] = &[Self::Weather, Self::Gdacs, Self::ReliefWeb];
}

/// Coarse severity attached to every combined disaster event.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Severity {
    /// GDACS green alerts.
    Low,
    /// GDACS orange alerts, unknown levels, and every `ReliefWeb` record.
    Medium,
    /// GDACS red alerts.
    High,
}

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// A GDACS alert reduced to the configured field list.
///
/// Keys are exactly the configured field names, in configured order. A
/// field the upstream item lacked is present with a `null` value rather
/// than dropped. Serializes as a JSON object preserving that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedAlert {
    fields: Vec<(String, serde_json::Value)>,
}

impl NormalizedAlert {
    /// Creates an alert from ordered `(field, value)` pairs.
    #[must_use]
    pub const fn new(fields: Vec<(String, serde_json::Value)>) -> Self {
        Self { fields }
    }

    /// Returns the value for `field`, or `None` if the field was not
    /// configured. A configured-but-missing field returns `Some(Null)`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Returns the value for `field` as a string slice when it is one.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(serde_json::Value::as_str)
    }

    /// Field names in configured order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Ordered `(field, value)` pairs.
    #[must_use]
    pub fn fields(&self) -> &[(String, serde_json::Value)] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields were configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for NormalizedAlert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NormalizedAlert {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AlertVisitor;

        impl<'de> Visitor<'de> for AlertVisitor {
            type Value = NormalizedAlert;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of alert fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, serde_json::Value>()? {
                    fields.push((name, value));
                }
                Ok(NormalizedAlert { fields })
            }
        }

        deserializer.deserialize_map(AlertVisitor)
    }
}

/// A `ReliefWeb` disaster record, passed through as the upstream sent it.
///
/// `ReliefWeb` already returns a near-normalized shape (`id`, `fields`,
/// `href`), so the record is kept verbatim and only read through the
/// accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDisaster(pub serde_json::Value);

impl NormalizedDisaster {
    /// The upstream `id`, rendered as a string (`ReliefWeb` ids may be
    /// numeric or textual).
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The `fields` sub-mapping, if the record has one.
    #[must_use]
    pub fn fields(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.0.get("fields").and_then(serde_json::Value::as_object)
    }

    /// A string-valued entry of `fields`.
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields()?.get(name)?.as_str()
    }

    /// The `name` of the first element of a list-of-objects field such as
    /// `type` or `country`.
    #[must_use]
    pub fn first_name_of(&self, name: &str) -> Option<&str> {
        self.fields()?
            .get(name)?
            .as_array()?
            .first()?
            .get("name")?
            .as_str()
    }

    /// The raw upstream record.
    #[must_use]
    pub const fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for NormalizedDisaster {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Current weather conditions at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Air temperature as reported by the provider.
    pub temperature: f64,
    /// Relative humidity.
    pub humidity: f64,
    /// Wind speed.
    pub wind_speed: f64,
    /// Free-text summary (e.g. `"Partly Cloudy"`).
    pub conditions: String,
    /// Atmospheric pressure.
    pub pressure: f64,
    /// Visibility.
    pub visibility: f64,
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            wind_speed: 0.0,
            conditions: "Unknown".to_string(),
            pressure: 0.0,
            visibility: 0.0,
        }
    }
}
