//! Domain data structures for regions, categories, and collection points.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Two-letter federative unit code such as `SP`.
pub struct StateCode(pub String);

impl StateCode {
    /// Build a state code, rejecting blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Municipality name as published by the geographic reference service.
pub struct CityName(pub String);

impl CityName {
    /// Borrow the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a material category.
pub struct CategoryId(pub u32);

impl fmt::Display for CategoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a collection point, valid as a key for the detail lookup.
pub struct PointId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Material type a collection point accepts, e.g. glass or paper.
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Display label.
    pub label: String,
    /// Icon location on the backend.
    pub icon_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Validated WGS84 position.
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, returning `None` for non-finite or out-of-range values.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Span used when centering the map on the device position.
pub const DEFAULT_VIEWPORT_DELTA: f64 = 0.014;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Initial map region: a center and the visible span in degrees.
pub struct MapViewport {
    /// Center of the visible region.
    pub center: Coordinate,
    /// Visible latitude span.
    pub latitude_delta: f64,
    /// Visible longitude span.
    pub longitude_delta: f64,
}

impl MapViewport {
    /// Viewport centered on `center` with the default span.
    #[must_use]
    pub fn centered_on(center: Coordinate) -> Self {
        Self {
            center,
            latitude_delta: DEFAULT_VIEWPORT_DELTA,
            longitude_delta: DEFAULT_VIEWPORT_DELTA,
        }
    }

    /// Whether a coordinate falls inside the visible region.
    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        (coordinate.latitude() - self.center.latitude()).abs() <= self.latitude_delta / 2.0
            && (coordinate.longitude() - self.center.longitude()).abs()
                <= self.longitude_delta / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Collection point as returned by a filtered point query.
pub struct CollectionPoint {
    /// Unique identifier.
    pub id: PointId,
    /// Establishment name.
    pub name: String,
    /// Photo location on the backend.
    pub image_uri: String,
    /// Map position.
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Full record of a collection point, shown on the detail screen.
pub struct PointDetail {
    /// Unique identifier.
    pub id: PointId,
    /// Establishment name.
    pub name: String,
    /// Photo location on the backend.
    pub image_uri: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact WhatsApp number.
    pub whatsapp: String,
    /// City the point is located in.
    pub city: String,
    /// State code the point is located in.
    pub state: String,
    /// Labels of the accepted categories.
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Selected category ids. Empty means no category restriction.
pub struct FilterSet(BTreeSet<CategoryId>);

impl FilterSet {
    /// Empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: CategoryId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        self.0.contains(&id)
    }

    /// Whether no category is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of selected categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.0.iter().copied()
    }

    /// Comma separated ids for the `items` query parameter.
    ///
    /// Returns `None` for an empty set so callers omit the parameter and the
    /// backend applies no category restriction.
    #[must_use]
    pub fn query_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let ids: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        Some(ids.join(","))
    }
}

impl FromIterator<CategoryId> for FilterSet {
    fn from_iter<I: IntoIterator<Item = CategoryId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Home to points hand-off: the region the points screen searches in.
pub struct RegionHandoff {
    /// Selected state.
    pub state: StateCode,
    /// Selected city within `state`.
    pub city: CityName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Points to detail hand-off.
pub struct PointHandoff {
    /// Point whose full record the detail screen loads.
    pub point_id: PointId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Key of a point query: region plus category filter.
pub struct PointQuery {
    /// State to search in.
    pub state: StateCode,
    /// City to search in.
    pub city: CityName,
    /// Category restriction; empty means all categories.
    pub items: FilterSet,
}
