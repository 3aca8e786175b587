use std::sync::Arc;

use chrono::{DateTime, Local};
use coleta_core::{
    location::LocationProbe,
    model::{
        Category, CategoryId, CityName, CollectionPoint, Coordinate, PointDetail, PointHandoff,
        StateCode,
    },
    points::{PointQueryController, PointRequest},
    ports::PermissionStatus,
    region::{CityRequest, RegionResolver},
    remote::{KeyedSource, Ticket},
    service::{ColetaService, ServiceError},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Home,
    Points,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HomeFocus {
    States,
    Cities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PointsFocus {
    Categories,
    Points,
}

/// What put the current message into the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusSource {
    Navigation,
    Region,
    Categories,
    Points,
    Location,
    Detail,
}

/// Result of a background task, tagged with the screen mount that issued it.
#[derive(Debug)]
pub(crate) enum Message {
    States(u64, Ticket, Result<Vec<StateCode>, ServiceError>),
    Cities(u64, CityRequest, Result<Vec<CityName>, ServiceError>),
    Categories(u64, Ticket, Result<Vec<Category>, ServiceError>),
    Points(u64, PointRequest, Result<Vec<CollectionPoint>, ServiceError>),
    Permission(u64, PermissionStatus),
    Position(u64, Result<Coordinate, ServiceError>),
    Detail(u64, Ticket, Result<PointDetail, ServiceError>),
}

pub(crate) struct App {
    pub service: Arc<ColetaService>,
    tx: UnboundedSender<Message>,
    mounts: u64,

    pub screen: Screen,

    home_mount: u64,
    pub region: RegionResolver,
    pub home_focus: HomeFocus,
    pub state_list_index: usize,
    pub city_list_index: usize,

    points_mount: u64,
    pub points: Option<PointQueryController>,
    pub probe: LocationProbe,
    pub points_focus: PointsFocus,
    pub category_index: usize,
    pub point_index: usize,
    pub refreshed_at: Option<DateTime<Local>>,

    detail_mount: u64,
    pub detail: KeyedSource<PointHandoff, PointDetail>,

    status: Option<(StatusSource, String)>,
}

impl App {
    pub(crate) fn new(service: Arc<ColetaService>) -> (Self, UnboundedReceiver<Message>) {
        let (tx, rx) = unbounded_channel();
        let app = Self {
            service,
            tx,
            mounts: 0,
            screen: Screen::Home,
            home_mount: 0,
            region: RegionResolver::new(),
            home_focus: HomeFocus::States,
            state_list_index: 0,
            city_list_index: 0,
            points_mount: 0,
            points: None,
            probe: LocationProbe::new(),
            points_focus: PointsFocus::Categories,
            category_index: 0,
            point_index: 0,
            refreshed_at: None,
            detail_mount: 0,
            detail: KeyedSource::new(),
            status: None,
        };
        (app, rx)
    }

    fn next_mount(&mut self) -> u64 {
        self.mounts += 1;
        self.mounts
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver only goes away on shutdown.
            if tx.send(task.await).is_err() {
                tracing::debug!("ui loop gone, dropping result");
            }
        });
    }

    /// Message for the status bar, if any.
    pub(crate) fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|(_, text)| text.as_str())
    }

    fn set_status(&mut self, source: StatusSource, text: String) {
        self.status = Some((source, text));
    }

    pub(crate) fn is_loading(&self) -> bool {
        match self.screen {
            Screen::Home => self.region.states().is_loading() || self.region.cities().is_loading(),
            Screen::Points => self.points.as_ref().is_some_and(|points| {
                points.categories().is_loading() || points.points().is_loading()
            }),
            Screen::Detail => self.detail.remote().is_loading(),
        }
    }

    pub(crate) fn mount_home(&mut self) {
        self.home_mount = self.next_mount();
        self.region = RegionResolver::new();
        self.home_focus = HomeFocus::States;
        self.state_list_index = 0;
        self.city_list_index = 0;
        self.screen = Screen::Home;

        if let Some(ticket) = self.region.begin_states() {
            let mount = self.home_mount;
            let service = Arc::clone(&self.service);
            self.spawn(async move { Message::States(mount, ticket, service.states().await) });
        }
    }

    pub(crate) fn select_current_state(&mut self) {
        let Some(state) = self.region.states().items().get(self.state_list_index).cloned() else {
            return;
        };
        self.city_list_index = 0;
        if let Some(request) = self.region.select_state(Some(state)) {
            let mount = self.home_mount;
            let service = Arc::clone(&self.service);
            self.spawn(async move {
                let result = service.cities(&request.state).await;
                Message::Cities(mount, request, result)
            });
        }
        self.home_focus = HomeFocus::Cities;
    }

    pub(crate) fn select_current_city(&mut self) {
        if let Some(city) = self.region.cities().items().get(self.city_list_index).cloned() {
            self.region.select_city(city);
        }
    }

    /// Hand the region over and mount the points screen.
    pub(crate) fn enter_points(&mut self) {
        let Some(handoff) = self.region.handoff() else {
            self.set_status(
                StatusSource::Navigation,
                "Select a state and a city first".into(),
            );
            return;
        };

        self.points_mount = self.next_mount();
        self.points = Some(PointQueryController::new(handoff));
        self.probe = LocationProbe::new();
        self.points_focus = PointsFocus::Categories;
        self.category_index = 0;
        self.point_index = 0;
        self.refreshed_at = None;
        self.status = None;
        self.screen = Screen::Points;

        if let Some(ticket) = self.points.as_mut().and_then(PointQueryController::begin_categories)
        {
            self.spawn_categories(ticket);
        }

        if self.probe.begin() {
            let mount = self.points_mount;
            let service = Arc::clone(&self.service);
            self.spawn(async move {
                let status = service.request_permission().await;
                Message::Permission(mount, status)
            });
        }

        self.refresh_points();
    }

    fn spawn_categories(&self, ticket: Ticket) {
        let mount = self.points_mount;
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.categories().await;
            Message::Categories(mount, ticket, result)
        });
    }

    // Only issued once the probe has accepted a granted permission.
    fn spawn_position(&self) {
        let mount = self.points_mount;
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let reading = service.current_position().await;
            Message::Position(mount, reading)
        });
    }

    fn refresh_points(&mut self) {
        let Some(request) = self.points.as_mut().and_then(PointQueryController::refresh) else {
            return;
        };
        self.spawn_points(request);
    }

    /// Re-run the point query, and the category load if it failed.
    pub(crate) fn reload_points(&mut self) {
        if let Some(ticket) = self.points.as_mut().and_then(PointQueryController::retry_categories) {
            self.spawn_categories(ticket);
        }
        if let Some(request) = self.points.as_mut().map(PointQueryController::reload) {
            self.spawn_points(request);
        }
    }

    fn spawn_points(&self, request: PointRequest) {
        let mount = self.points_mount;
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.points(&request.query).await;
            Message::Points(mount, request, result)
        });
    }

    pub(crate) fn toggle_current_category(&mut self) {
        let Some(points) = self.points.as_ref() else {
            return;
        };
        let Some(id) = points
            .categories()
            .items()
            .get(self.category_index)
            .map(|category| category.id)
        else {
            return;
        };
        self.toggle_category(id);
    }

    pub(crate) fn toggle_category(&mut self, id: CategoryId) {
        if let Some(points) = self.points.as_mut() {
            points.toggle_category(id);
        }
        self.refresh_points();
    }

    pub(crate) fn open_current_point(&mut self) {
        let Some(handoff) = self.points.as_ref().and_then(|points| {
            let id = points.points().items().get(self.point_index)?.id;
            points.select_point(id)
        }) else {
            return;
        };

        self.detail_mount = self.next_mount();
        self.detail = KeyedSource::new();
        let ticket = self.detail.begin_fresh(handoff);
        self.screen = Screen::Detail;

        let mount = self.detail_mount;
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.point_detail(handoff.point_id).await;
            Message::Detail(mount, ticket, result)
        });
    }

    pub(crate) fn back(&mut self) {
        match self.screen {
            Screen::Home => {}
            Screen::Points => {
                self.points = None;
                self.screen = Screen::Home;
            }
            Screen::Detail => self.screen = Screen::Points,
        }
        self.status = None;
    }

    pub(crate) fn apply(&mut self, message: Message) {
        match message {
            Message::States(mount, ticket, result) if mount == self.home_mount => {
                let failure = failure_text(&result);
                if self.region.accept_states(ticket, result) {
                    self.report(StatusSource::Region, failure);
                }
            }
            Message::Cities(mount, request, result) if mount == self.home_mount => {
                let failure = failure_text(&result);
                if self.region.accept_cities(&request, result) {
                    self.report(StatusSource::Region, failure);
                }
            }
            Message::Categories(mount, ticket, result) if mount == self.points_mount => {
                let failure = failure_text(&result);
                let applied = self
                    .points
                    .as_mut()
                    .is_some_and(|points| points.accept_categories(ticket, result));
                if applied {
                    self.report(StatusSource::Categories, failure);
                }
            }
            Message::Points(mount, request, result) if mount == self.points_mount => {
                let failure = failure_text(&result);
                let applied = self
                    .points
                    .as_mut()
                    .is_some_and(|points| points.accept_points(&request, result));
                if applied {
                    self.report(StatusSource::Points, failure);
                    self.refreshed_at = Some(Local::now());
                    self.clamp_point_index();
                }
            }
            Message::Permission(mount, status) if mount == self.points_mount => {
                if self.probe.on_permission(status) {
                    self.spawn_position();
                } else if let Some(advisory) = self.probe.take_advisory() {
                    self.set_status(
                        StatusSource::Location,
                        format!("{advisory}: location is needed to center the map"),
                    );
                }
            }
            Message::Position(mount, result) if mount == self.points_mount => {
                self.probe.on_position(result);
            }
            Message::Detail(mount, ticket, result) if mount == self.detail_mount => {
                let failure = failure_text(&result);
                if self.detail.accept(ticket, result) {
                    self.report(StatusSource::Detail, failure);
                }
            }
            other => tracing::debug!(?other, "dropping result for an unmounted screen"),
        }
    }

    /// Show a failure, or clear the message a success from the same source supersedes.
    fn report(&mut self, source: StatusSource, failure: Option<String>) {
        match failure {
            Some(text) => self.set_status(source, text),
            None if self.status.as_ref().is_some_and(|(shown, _)| *shown == source) => {
                self.status = None;
            }
            None => {}
        }
    }

    fn clamp_point_index(&mut self) {
        let count = self
            .points
            .as_ref()
            .map_or(0, |points| points.points().items().len());
        self.point_index = self.point_index.min(count.saturating_sub(1));
    }
}

fn failure_text<T>(result: &Result<T, ServiceError>) -> Option<String> {
    result.as_ref().err().map(ToString::to_string)
}
