//! Traits describing provider capabilities and shared helper types.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{
    Category, CityName, CollectionPoint, Coordinate, PointDetail, PointId, PointQuery, StateCode,
};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Network layer failed or the response body could not be decoded.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Provider answered with data that does not fit the domain model.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Requested record does not exist.
    #[error("Not found")]
    NotFound,
    /// Provider did not answer in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
/// Geographic reference service resolving states and their cities.
pub trait GeoReferencePort: Send + Sync {
    /// List all selectable states.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the service is unreachable or the payload is malformed.
    async fn states(&self) -> Result<Vec<StateCode>, PortError>;

    /// List the cities of one state.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the service is unreachable or the payload is malformed.
    async fn cities(&self, state: &StateCode) -> Result<Vec<CityName>, PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
/// Backend catalog of categories and collection points.
pub trait CatalogPort: Send + Sync {
    /// Load every category known to the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn categories(&self) -> Result<Vec<Category>, PortError>;

    /// Load the points matching a region and category filter.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn points(&self, query: &PointQuery) -> Result<Vec<CollectionPoint>, PortError>;

    /// Load the full record of one point.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NotFound`] for unknown ids, or another [`PortError`]
    /// when the backend request fails.
    async fn point(&self, id: PointId) -> Result<PointDetail, PortError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Answer to a location permission request.
pub enum PermissionStatus {
    /// The user allowed location access.
    Granted,
    /// The user refused location access.
    Denied,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Device could not produce a position reading.
#[error("Location unavailable: {reason}")]
pub struct LocationError {
    /// Human readable cause reported by the device layer.
    pub reason: String,
}

impl LocationError {
    /// Build an error from any displayable cause.
    #[must_use]
    pub fn new<R: Into<String>>(reason: R) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
/// Device capability granting location access and reading one position.
pub trait LocationPort: Send + Sync {
    /// Ask the user for location permission.
    async fn request_permission(&self) -> PermissionStatus;

    /// Read the current device position.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] when no fix can be obtained.
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}
