//! State to city cascade backing the home screen.
//!
//! The state list and the city list are two independently invalidated
//! sources. The city source is keyed by the selected state, so a late city
//! response for a state the user already moved away from never lands.

use std::fmt::Display;

use crate::model::{CityName, RegionHandoff, StateCode};
use crate::remote::{KeyedSource, Remote, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
/// City lookup that must be issued after a state selection.
pub struct CityRequest {
    /// State whose cities are requested.
    pub state: StateCode,
    /// Ticket to hand back with the response.
    pub ticket: Ticket,
}

/// Region selection state for one home screen mount.
#[derive(Debug, Default)]
pub struct RegionResolver {
    states: KeyedSource<(), Vec<StateCode>>,
    cities: KeyedSource<StateCode, Vec<CityName>>,
    selected_state: Option<StateCode>,
    selected_city: Option<CityName>,
}

impl RegionResolver {
    /// Fresh resolver with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the one-shot state list load. Returns `None` once already issued.
    pub fn begin_states(&mut self) -> Option<Ticket> {
        if self.states.key().is_some() {
            return None;
        }
        Some(self.states.begin(()))
    }

    /// Apply the state list response.
    pub fn accept_states<E: Display>(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<StateCode>, E>,
    ) -> bool {
        self.states.accept(ticket, result)
    }

    /// Load state of the state list.
    #[must_use]
    pub fn states(&self) -> &Remote<Vec<StateCode>> {
        self.states.remote()
    }

    /// Select a state, or unset it with `None`.
    ///
    /// The selected city is cleared before anything else happens. Selecting a
    /// state, including the one already selected, returns the city lookup to
    /// issue; unsetting clears the city list and returns `None`.
    pub fn select_state(&mut self, state: Option<StateCode>) -> Option<CityRequest> {
        self.selected_city = None;

        let Some(state) = state else {
            self.selected_state = None;
            self.cities.clear();
            return None;
        };

        self.selected_state = Some(state.clone());
        let ticket = self.cities.begin_fresh(state.clone());
        tracing::debug!(%state, generation = ticket.generation(), "city lookup issued");
        Some(CityRequest { state, ticket })
    }

    /// Apply a city list response. Responses for a superseded state are dropped.
    pub fn accept_cities<E: Display>(
        &mut self,
        request: &CityRequest,
        result: Result<Vec<CityName>, E>,
    ) -> bool {
        let applied = self.cities.accept(request.ticket, result);
        if !applied {
            tracing::debug!(
                state = %request.state,
                generation = request.ticket.generation(),
                "discarding superseded city list"
            );
        }
        applied
    }

    /// Load state of the city list for the selected state.
    #[must_use]
    pub fn cities(&self) -> &Remote<Vec<CityName>> {
        self.cities.remote()
    }

    /// Select a city of the current list. Returns `false` and leaves the
    /// selection untouched when the city is not part of it.
    pub fn select_city(&mut self, city: CityName) -> bool {
        if !self.cities.remote().items().contains(&city) {
            return false;
        }
        self.selected_city = Some(city);
        true
    }

    /// Currently selected state.
    #[must_use]
    pub fn selected_state(&self) -> Option<&StateCode> {
        self.selected_state.as_ref()
    }

    /// Currently selected city.
    #[must_use]
    pub fn selected_city(&self) -> Option<&CityName> {
        self.selected_city.as_ref()
    }

    /// Region to hand to the points screen, once both parts are chosen.
    #[must_use]
    pub fn handoff(&self) -> Option<RegionHandoff> {
        let state = self.selected_state.clone()?;
        let city = self.selected_city.clone()?;
        (self.cities.key() == Some(&state)).then_some(RegionHandoff { state, city })
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::ports::{MockCatalogPort, MockGeoReferencePort, MockLocationPort, PortError};
    use crate::remote::ListView;
    use crate::service::tests::service;

    fn state(code: &str) -> StateCode {
        StateCode(code.to_owned())
    }

    fn city(name: &str) -> CityName {
        CityName(name.to_owned())
    }

    fn loaded_with(code: &str, cities: &[&str]) -> RegionResolver {
        let mut resolver = RegionResolver::new();
        let request = resolver
            .select_state(Some(state(code)))
            .expect("state selection issues a lookup");
        resolver.accept_cities(
            &request,
            Ok::<_, String>(cities.iter().map(|name| city(name)).collect()),
        );
        resolver
    }

    #[test]
    fn new_state_clears_city_before_lookup() {
        let mut resolver = loaded_with("SP", &["Campinas", "Osasco"]);
        assert!(resolver.select_city(city("Campinas")));

        let request = resolver.select_state(Some(state("RJ")));

        assert!(request.is_some());
        assert_eq!(resolver.selected_city(), None);
        assert_eq!(resolver.cities().view(), ListView::Loading);
        assert!(resolver.handoff().is_none());
    }

    #[test]
    fn unset_state_clears_city_list_without_lookup() {
        let mut resolver = loaded_with("SP", &["Campinas"]);
        assert!(resolver.select_state(None).is_none());
        assert_eq!(resolver.cities().view(), ListView::Idle);
        assert_eq!(resolver.selected_state(), None);
    }

    #[test]
    fn superseded_city_list_is_discarded() {
        let mut resolver = RegionResolver::new();
        let sp = resolver.select_state(Some(state("SP"))).expect("lookup");
        let rj = resolver.select_state(Some(state("RJ"))).expect("lookup");

        assert!(resolver.accept_cities(&rj, Ok::<_, String>(vec![city("Niterói")])));
        assert!(!resolver.accept_cities(&sp, Ok::<_, String>(vec![city("Campinas")])));
        assert_eq!(resolver.cities().items(), &[city("Niterói")]);
    }

    #[test]
    fn city_outside_current_list_is_rejected() {
        let mut resolver = loaded_with("SP", &["Campinas"]);
        assert!(!resolver.select_city(city("Niterói")));
        assert_eq!(resolver.selected_city(), None);
    }

    #[test]
    fn reselecting_same_state_fetches_again() {
        let mut resolver = loaded_with("SP", &["Campinas"]);
        let again = resolver.select_state(Some(state("SP")));
        assert!(again.is_some());
    }

    #[test]
    fn handoff_requires_state_and_city() {
        let mut resolver = loaded_with("SP", &["Campinas", "Osasco"]);
        assert!(resolver.handoff().is_none());
        resolver.select_city(city("Osasco"));
        assert_eq!(
            resolver.handoff(),
            Some(RegionHandoff {
                state: state("SP"),
                city: city("Osasco"),
            })
        );
    }

    #[test]
    fn state_list_is_one_shot() {
        let mut resolver = RegionResolver::new();
        assert!(resolver.begin_states().is_some());
        assert!(resolver.begin_states().is_none());
    }

    #[test]
    fn failed_state_lookup_renders_empty_list() {
        let mut resolver = RegionResolver::new();
        let ticket = resolver.begin_states().expect("first load");
        resolver.accept_states(ticket, Err(PortError::Malformed("not json".to_owned())));
        assert_eq!(resolver.states().view(), ListView::Failed);
        assert!(resolver.states().items().is_empty());
    }

    #[tokio::test]
    async fn selecting_state_requests_only_its_cities() {
        let mut geo = MockGeoReferencePort::new();
        geo.expect_states()
            .times(1)
            .returning(|| Ok(vec![state("SP"), state("RJ")]));
        geo.expect_cities()
            .with(eq(state("SP")))
            .times(1)
            .returning(|_state| Ok(vec![city("Campinas"), city("Osasco")]));
        geo.expect_cities().with(eq(state("RJ"))).times(0);

        let service = service(geo, MockCatalogPort::new(), MockLocationPort::new());
        let mut resolver = RegionResolver::new();

        let ticket = resolver.begin_states().expect("first load");
        let states = service.states().await;
        resolver.accept_states(ticket, states);
        assert_eq!(resolver.states().items(), &[state("SP"), state("RJ")]);

        let request = resolver
            .select_state(Some(state("SP")))
            .expect("lookup issued");
        let cities = service.cities(&request.state).await;
        resolver.accept_cities(&request, cities);

        assert_eq!(
            resolver.cities().items(),
            &[city("Campinas"), city("Osasco")]
        );
    }
}
