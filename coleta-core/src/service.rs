//! High-level service facade combining all providers.

use std::sync::Arc;
use std::time::Duration;

use crate::model::{
    Category, CityName, CollectionPoint, Coordinate, PointDetail, PointId, PointQuery, StateCode,
};
use crate::ports::{
    CatalogPort, GeoReferencePort, LocationError, LocationPort, PermissionStatus, PortError,
};

/// Upper bound for a single remote call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(thiserror::Error, Debug)]
/// Recoverable failures surfaced to the screens.
pub enum ServiceError {
    /// State or city lookup failed; the selector renders empty.
    #[error("Region lookup failed: {0}")]
    RegionLookup(#[source] PortError),
    /// Category list could not be loaded; the filter row renders empty.
    #[error("Category load failed: {0}")]
    CategoryLoad(#[source] PortError),
    /// Point query failed; prior results stay visible as stale.
    #[error("Point query failed: {0}")]
    PointQuery(#[source] PortError),
    /// Detail record could not be loaded.
    #[error("Point detail failed: {0}")]
    PointDetail(#[source] PortError),
    /// The user refused location access.
    #[error("Location permission denied")]
    PermissionDenied,
    /// Permission was granted but no position could be read.
    #[error(transparent)]
    LocationUnavailable(#[from] LocationError),
}

/// Public entry point for region, catalog and location lookups.
pub struct ColetaService {
    geo: Arc<dyn GeoReferencePort>,
    catalog: Arc<dyn CatalogPort>,
    location: Arc<dyn LocationPort>,
    timeout: Duration,
}

impl ColetaService {
    /// Create a new service bound to the provided ports.
    #[must_use]
    pub fn new(
        geo: Arc<dyn GeoReferencePort>,
        catalog: Arc<dyn CatalogPort>,
        location: Arc<dyn LocationPort>,
    ) -> Self {
        Self {
            geo,
            catalog,
            location,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-call timeout in effect.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// List selectable states.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::RegionLookup`] when the reference service fails or times out.
    pub async fn states(&self) -> Result<Vec<StateCode>, ServiceError> {
        tracing::debug!("loading states");
        self.bounded(self.geo.states())
            .await
            .inspect(|states| tracing::debug!(count = states.len(), "states loaded"))
            .map_err(|err| {
                tracing::warn!(error = %err, "state lookup failed");
                ServiceError::RegionLookup(err)
            })
    }

    /// List the cities of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::RegionLookup`] when the reference service fails or times out.
    pub async fn cities(&self, state: &StateCode) -> Result<Vec<CityName>, ServiceError> {
        tracing::debug!(%state, "loading cities");
        self.bounded(self.geo.cities(state))
            .await
            .inspect(|cities| tracing::debug!(%state, count = cities.len(), "cities loaded"))
            .map_err(|err| {
                tracing::warn!(%state, error = %err, "city lookup failed");
                ServiceError::RegionLookup(err)
            })
    }

    /// Load the category catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CategoryLoad`] when the backend fails or times out.
    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        self.bounded(self.catalog.categories())
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "category load failed");
                ServiceError::CategoryLoad(err)
            })
    }

    /// Load the points matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PointQuery`] when the backend fails or times out.
    pub async fn points(&self, query: &PointQuery) -> Result<Vec<CollectionPoint>, ServiceError> {
        tracing::info!(
            state = %query.state,
            city = %query.city,
            items = ?query.items.query_value(),
            "querying points"
        );
        self.bounded(self.catalog.points(query))
            .await
            .inspect(|points| tracing::debug!(count = points.len(), "points loaded"))
            .map_err(|err| {
                tracing::warn!(error = %err, "point query failed");
                ServiceError::PointQuery(err)
            })
    }

    /// Load the full record of one point.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PointDetail`] when the id is unknown or the backend fails.
    pub async fn point_detail(&self, id: PointId) -> Result<PointDetail, ServiceError> {
        self.bounded(self.catalog.point(id))
            .await
            .map_err(|err| {
                tracing::warn!(%id, error = %err, "point detail failed");
                ServiceError::PointDetail(err)
            })
    }

    /// Ask for location permission. Not bounded by the timeout: the user may
    /// leave the prompt open indefinitely.
    pub async fn request_permission(&self) -> PermissionStatus {
        let status = self.location.request_permission().await;
        tracing::info!(?status, "location permission answered");
        status
    }

    /// Read one position.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::LocationUnavailable`] when the device has no fix
    /// or does not answer in time.
    pub async fn current_position(&self) -> Result<Coordinate, ServiceError> {
        match tokio::time::timeout(self.timeout, self.location.current_position()).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_elapsed) => Err(ServiceError::LocationUnavailable(LocationError::new(format!(
                "no fix within {:?}",
                self.timeout
            )))),
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, PortError>
    where
        F: Future<Output = Result<T, PortError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(PortError::Timeout(self.timeout)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::ports::{MockCatalogPort, MockGeoReferencePort, MockLocationPort};

    pub(crate) fn service(
        geo: MockGeoReferencePort,
        catalog: MockCatalogPort,
        location: MockLocationPort,
    ) -> ColetaService {
        ColetaService::new(Arc::new(geo), Arc::new(catalog), Arc::new(location))
    }

    struct StalledGeo;

    #[async_trait]
    impl GeoReferencePort for StalledGeo {
        async fn states(&self) -> Result<Vec<StateCode>, PortError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn cities(&self, _state: &StateCode) -> Result<Vec<CityName>, PortError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out_as_region_error() {
        let service = ColetaService::new(
            Arc::new(StalledGeo),
            Arc::new(MockCatalogPort::new()),
            Arc::new(MockLocationPort::new()),
        )
        .with_timeout(Duration::from_secs(2));

        let err = service.states().await.expect_err("lookup should time out");
        assert!(matches!(
            err,
            ServiceError::RegionLookup(PortError::Timeout(limit)) if limit == Duration::from_secs(2)
        ));
    }

    #[tokio::test]
    async fn category_failure_maps_to_category_error() {
        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_categories()
            .times(1)
            .returning(|| Err(PortError::Internal("db down".to_owned())));

        let service = service(
            MockGeoReferencePort::new(),
            catalog,
            MockLocationPort::new(),
        );
        let err = service.categories().await.expect_err("load should fail");
        assert!(matches!(err, ServiceError::CategoryLoad(PortError::Internal(_))));
    }

    #[tokio::test]
    async fn missing_detail_maps_to_detail_error() {
        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_point()
            .returning(|_id| Err(PortError::NotFound));

        let service = service(
            MockGeoReferencePort::new(),
            catalog,
            MockLocationPort::new(),
        );
        let err = service
            .point_detail(PointId(404))
            .await
            .expect_err("detail should fail");
        assert!(matches!(err, ServiceError::PointDetail(PortError::NotFound)));
    }

    #[tokio::test]
    async fn device_failure_maps_to_location_unavailable() {
        let mut location = MockLocationPort::new();
        location
            .expect_current_position()
            .returning(|| Err(LocationError::new("no satellites")));

        let service = service(
            MockGeoReferencePort::new(),
            MockCatalogPort::new(),
            location,
        );
        let err = service
            .current_position()
            .await
            .expect_err("position should fail");
        assert!(matches!(err, ServiceError::LocationUnavailable(_)));
    }
}
