//! Caller-pinned values that must appear verbatim in every generated case

use std::sync::LazyLock;

use serde_json::Value;

use crate::case::ParameterMap;
use crate::operation::Location;

static NO_ENTRIES: LazyLock<ParameterMap> = LazyLock::new(ParameterMap::new);
static ABSENT: LocationOverride = LocationOverride::Absent;

/// Explicit value for one keyed location.
///
/// - `Absent`: generate the whole location from its schema
/// - `Empty`: generate required fields only, nothing pinned
/// - `Entries`: keep these entries verbatim, generate the remaining required fields
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocationOverride {
    #[default]
    Absent,
    Empty,
    Entries(ParameterMap),
}

impl LocationOverride {
    /// Pinned entries, or `None` when the location is fully generated.
    ///
    /// `Empty` yields an empty map: the caller asked for merging with nothing pinned.
    #[must_use]
    pub fn entries(&self) -> Option<&ParameterMap> {
        match self {
            Self::Absent => None,
            Self::Empty => Some(&NO_ENTRIES),
            Self::Entries(map) => Some(map),
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Short name of the override mode, used in log output.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Absent => "generated",
            Self::Empty => "required-only",
            Self::Entries(_) => "pinned",
        }
    }
}

impl From<ParameterMap> for LocationOverride {
    fn from(map: ParameterMap) -> Self {
        if map.is_empty() {
            Self::Empty
        } else {
            Self::Entries(map)
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for LocationOverride {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<ParameterMap>()
            .into()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("explicit overrides must be a JSON object, got {0}")]
    NotAMapping(&'static str),
    #[error("unknown location '{0}' (expected body, path_parameters, headers, cookies or query)")]
    UnknownLocation(String),
    #[error("explicit {location} must be an object mapping names to values, got {found}")]
    NotAnObject {
        location: Location,
        found: &'static str,
    },
}

/// Caller-supplied overrides, mirroring the shape of a `Case`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExplicitOverrides {
    /// Explicit body. `Some(Value::Null)` pins a JSON `null` body.
    pub body: Option<Value>,
    pub path_parameters: LocationOverride,
    pub headers: LocationOverride,
    pub cookies: LocationOverride,
    pub query: LocationOverride,
}

impl ExplicitOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Pin a keyed location. An empty map selects [`LocationOverride::Empty`].
    ///
    /// Passing [`Location::Body`] stores the map as an object body.
    #[must_use]
    pub fn with_location(mut self, location: Location, map: ParameterMap) -> Self {
        match self.location_mut(location) {
            Some(slot) => *slot = LocationOverride::from(map),
            None => self.body = Some(Value::Object(map)),
        }
        self
    }

    /// Override of a keyed location. `Absent` for [`Location::Body`].
    #[must_use]
    pub fn location(&self, location: Location) -> &LocationOverride {
        match location {
            Location::Body => &ABSENT,
            Location::PathParameters => &self.path_parameters,
            Location::Headers => &self.headers,
            Location::Cookies => &self.cookies,
            Location::Query => &self.query,
        }
    }

    fn location_mut(&mut self, location: Location) -> Option<&mut LocationOverride> {
        match location {
            Location::Body => None,
            Location::PathParameters => Some(&mut self.path_parameters),
            Location::Headers => Some(&mut self.headers),
            Location::Cookies => Some(&mut self.cookies),
            Location::Query => Some(&mut self.query),
        }
    }

    /// Build overrides from a loosely-typed JSON object such as
    /// `{"body": "TEST", "headers": {"X-Id": "1"}}`.
    ///
    /// Shape errors are reported here rather than when cases are drawn.
    /// Values inside the maps are never checked against any schema.
    ///
    /// # Errors
    ///
    /// Returns error if `value` is not an object, names an unknown location,
    /// or gives a non-object value for a keyed location.
    pub fn from_value(value: &Value) -> Result<Self, OverrideError> {
        let obj = value
            .as_object()
            .ok_or(OverrideError::NotAMapping(json_type_name(value)))?;

        let mut overrides = Self::default();
        for (key, val) in obj {
            let location =
                Location::from_name(key).ok_or_else(|| OverrideError::UnknownLocation(key.clone()))?;
            if location == Location::Body {
                overrides.body = Some(val.clone());
                continue;
            }
            let map = val.as_object().ok_or(OverrideError::NotAnObject {
                location,
                found: json_type_name(val),
            })?;
            overrides = overrides.with_location(location, map.clone());
        }
        Ok(overrides)
    }

    /// True when nothing is pinned at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && Location::KEYED.iter().all(|l| self.location(*l).is_absent())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
