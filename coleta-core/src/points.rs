//! Category filter and point query state backing the points screen.

use std::fmt::Display;

use crate::model::{
    Category, CategoryId, CollectionPoint, FilterSet, PointHandoff, PointId, PointQuery,
    RegionHandoff,
};
use crate::remote::{KeyedSource, Remote, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Point query that must be issued.
pub struct PointRequest {
    /// Region and filter to query.
    pub query: PointQuery,
    /// Ticket to hand back with the response.
    pub ticket: Ticket,
}

/// Filter set and result list for one points screen mount.
///
/// Toggling only mutates the filter. [`PointQueryController::refresh`]
/// derives the query key and issues a request when it differs from the last
/// issued one, so a changed result list never feeds back into a new query.
#[derive(Debug)]
pub struct PointQueryController {
    region: RegionHandoff,
    categories: KeyedSource<(), Vec<Category>>,
    filter: FilterSet,
    points: KeyedSource<PointQuery, Vec<CollectionPoint>>,
}

impl PointQueryController {
    /// Controller for the region handed over by the home screen.
    #[must_use]
    pub fn new(region: RegionHandoff) -> Self {
        Self {
            region,
            categories: KeyedSource::new(),
            filter: FilterSet::new(),
            points: KeyedSource::new(),
        }
    }

    /// Region the controller searches in.
    #[must_use]
    pub fn region(&self) -> &RegionHandoff {
        &self.region
    }

    /// Start the one-shot category load. Returns `None` once already issued.
    pub fn begin_categories(&mut self) -> Option<Ticket> {
        if self.categories.key().is_some() {
            return None;
        }
        Some(self.categories.begin(()))
    }

    /// Re-issue the category load. Returns `None` unless the last load failed.
    pub fn retry_categories(&mut self) -> Option<Ticket> {
        self.categories.remote().error()?;
        tracing::debug!("retrying category load");
        Some(self.categories.begin(()))
    }

    /// Apply the category response.
    pub fn accept_categories<E: Display>(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Category>, E>,
    ) -> bool {
        self.categories.accept(ticket, result)
    }

    /// Load state of the category list.
    #[must_use]
    pub fn categories(&self) -> &Remote<Vec<Category>> {
        self.categories.remote()
    }

    /// Flip the selection of one category. Returns whether it is selected afterwards.
    pub fn toggle_category(&mut self, id: CategoryId) -> bool {
        self.filter.toggle(id)
    }

    /// Current filter.
    #[must_use]
    pub fn filter(&self) -> &FilterSet {
        &self.filter
    }

    /// Query key derived from the region and the current filter.
    #[must_use]
    pub fn query(&self) -> PointQuery {
        PointQuery {
            state: self.region.state.clone(),
            city: self.region.city.clone(),
            items: self.filter.clone(),
        }
    }

    /// Issue a point query if the derived key changed since the last one.
    ///
    /// The first call after mount always issues.
    pub fn refresh(&mut self) -> Option<PointRequest> {
        let query = self.query();
        if self.points.key() == Some(&query) {
            return None;
        }
        Some(self.issue(query))
    }

    /// Issue a point query for the current key unconditionally.
    pub fn reload(&mut self) -> PointRequest {
        let query = self.query();
        self.issue(query)
    }

    fn issue(&mut self, query: PointQuery) -> PointRequest {
        let ticket = self.points.begin(query.clone());
        tracing::debug!(
            items = ?query.items.query_value(),
            generation = ticket.generation(),
            "point query issued"
        );
        PointRequest { query, ticket }
    }

    /// Apply a point response. Only the latest issued request is applied.
    pub fn accept_points<E: Display>(
        &mut self,
        request: &PointRequest,
        result: Result<Vec<CollectionPoint>, E>,
    ) -> bool {
        let applied = self.points.accept(request.ticket, result);
        if !applied {
            tracing::debug!(
                items = ?request.query.items.query_value(),
                generation = request.ticket.generation(),
                "discarding superseded point list"
            );
        }
        applied
    }

    /// Load state of the point list.
    #[must_use]
    pub fn points(&self) -> &Remote<Vec<CollectionPoint>> {
        self.points.remote()
    }

    /// Hand a displayed point over to the detail screen.
    #[must_use]
    pub fn select_point(&self, id: PointId) -> Option<PointHandoff> {
        self.points
            .remote()
            .items()
            .iter()
            .any(|point| point.id == id)
            .then_some(PointHandoff { point_id: id })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::always;

    use super::*;
    use crate::model::{CityName, Coordinate, StateCode};
    use crate::ports::{MockCatalogPort, MockGeoReferencePort, MockLocationPort, PortError};
    use crate::remote::ListView;
    use crate::service::tests::service;

    fn region() -> RegionHandoff {
        RegionHandoff {
            state: StateCode("SP".to_owned()),
            city: CityName("Campinas".to_owned()),
        }
    }

    fn points(count: u32) -> Vec<CollectionPoint> {
        (1..=count)
            .map(|id| CollectionPoint {
                id: PointId(id),
                name: format!("Ponto {id}"),
                image_uri: format!("http://localhost/uploads/{id}.jpg"),
                coordinate: Coordinate::new(-22.9, -47.06).expect("valid coordinate"),
            })
            .collect()
    }

    fn ids(items: &[u32]) -> FilterSet {
        items.iter().copied().map(CategoryId).collect()
    }

    #[test]
    fn first_refresh_issues_unfiltered_query() {
        let mut controller = PointQueryController::new(region());
        let request = controller.refresh().expect("initial query");
        assert!(request.query.items.is_empty());
        assert_eq!(request.query.items.query_value(), None);
        assert_eq!(controller.points().view(), ListView::Loading);
    }

    #[test]
    fn unchanged_filter_does_not_refetch() {
        let mut controller = PointQueryController::new(region());
        let request = controller.refresh().expect("initial query");
        controller.accept_points(&request, Ok::<_, String>(points(3)));

        assert!(controller.refresh().is_none());
    }

    #[test]
    fn toggling_back_and_forth_refetches_each_time() {
        let mut controller = PointQueryController::new(region());
        controller.refresh();

        controller.toggle_category(CategoryId(3));
        let narrowed = controller.refresh().expect("filter changed");
        assert_eq!(narrowed.query.items, ids(&[3]));

        controller.toggle_category(CategoryId(3));
        let widened = controller.refresh().expect("filter changed back");
        assert!(widened.query.items.is_empty());
    }

    #[test]
    fn double_toggle_within_one_tick_is_a_no_op() {
        let mut controller = PointQueryController::new(region());
        controller.refresh();
        controller.toggle_category(CategoryId(4));
        controller.toggle_category(CategoryId(4));
        assert!(controller.refresh().is_none());
    }

    #[test]
    fn rapid_toggles_show_only_latest_result() {
        let mut controller = PointQueryController::new(region());
        let initial = controller.refresh().expect("initial query");
        controller.accept_points(&initial, Ok::<_, String>(points(12)));

        controller.toggle_category(CategoryId(1));
        let first = controller.refresh().expect("filter changed");
        controller.toggle_category(CategoryId(2));
        let second = controller.refresh().expect("filter changed");

        assert!(controller.accept_points(&second, Ok::<_, String>(points(2))));
        assert!(!controller.accept_points(&first, Ok::<_, String>(points(7))));

        assert_eq!(controller.points().items().len(), 2);
        assert_eq!(controller.points().view(), ListView::Populated(2));
        assert_eq!(controller.filter(), &ids(&[1, 2]));
    }

    #[test]
    fn failed_query_keeps_previous_points_visible() {
        let mut controller = PointQueryController::new(region());
        let initial = controller.refresh().expect("initial query");
        controller.accept_points(&initial, Ok::<_, String>(points(5)));

        controller.toggle_category(CategoryId(9));
        let request = controller.refresh().expect("filter changed");
        controller.accept_points(&request, Err(PortError::Timeout(std::time::Duration::from_secs(5))));

        assert!(controller.points().is_stale());
        assert!(controller.points().error().is_some());
        assert_eq!(controller.points().items().len(), 5);
    }

    #[test]
    fn select_point_hands_over_displayed_ids_only() {
        let mut controller = PointQueryController::new(region());
        let request = controller.refresh().expect("initial query");
        controller.accept_points(&request, Ok::<_, String>(points(2)));

        assert_eq!(
            controller.select_point(PointId(2)),
            Some(PointHandoff {
                point_id: PointId(2)
            })
        );
        assert_eq!(controller.select_point(PointId(99)), None);
        assert!(controller.refresh().is_none());
    }

    #[test]
    fn categories_load_once() {
        let mut controller = PointQueryController::new(region());
        let ticket = controller.begin_categories().expect("first load");
        assert!(controller.begin_categories().is_none());
        controller.accept_categories(ticket, Err(PortError::NotFound));
        assert_eq!(controller.categories().view(), ListView::Failed);
    }

    #[test]
    fn categories_are_retried_only_after_failure() {
        let mut controller = PointQueryController::new(region());
        assert!(controller.retry_categories().is_none());

        let ticket = controller.begin_categories().expect("first load");
        assert!(controller.retry_categories().is_none());
        controller.accept_categories(ticket, Err(PortError::NotFound));

        let retry = controller.retry_categories().expect("failed load is retried");
        assert!(controller.begin_categories().is_none());
        let category = Category {
            id: CategoryId(1),
            label: "Lâmpadas".to_owned(),
            icon_uri: "http://localhost/uploads/lampadas.svg".to_owned(),
        };
        assert!(controller.accept_categories(retry, Ok::<_, String>(vec![category])));
        assert_eq!(controller.categories().view(), ListView::Populated(1));
        assert!(controller.retry_categories().is_none());
    }

    #[tokio::test]
    async fn filter_changes_drive_point_queries() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
        let recorder = Arc::clone(&seen);

        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_points()
            .with(always())
            .times(3)
            .returning(move |query| {
                recorder
                    .lock()
                    .expect("recorder lock")
                    .push(query.items.query_value());
                Ok(if query.items.is_empty() {
                    points(12)
                } else {
                    points(4)
                })
            });

        let service = service(MockGeoReferencePort::new(), catalog, MockLocationPort::new());
        let mut controller = PointQueryController::new(region());

        let request = controller.refresh().expect("initial query");
        let result = service.points(&request.query).await;
        controller.accept_points(&request, result);
        assert_eq!(controller.points().items().len(), 12);

        controller.toggle_category(CategoryId(3));
        assert_eq!(controller.filter(), &ids(&[3]));
        let request = controller.refresh().expect("filter changed");
        let result = service.points(&request.query).await;
        controller.accept_points(&request, result);
        assert_eq!(controller.points().items().len(), 4);

        controller.toggle_category(CategoryId(3));
        assert!(controller.filter().is_empty());
        let request = controller.refresh().expect("filter changed back");
        let result = service.points(&request.query).await;
        controller.accept_points(&request, result);
        assert_eq!(controller.points().items().len(), 12);

        assert!(controller.refresh().is_none());
        assert_eq!(
            *seen.lock().expect("recorder lock"),
            vec![None, Some("3".to_owned()), None]
        );
    }
}
