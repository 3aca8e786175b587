//! Core types and service wiring for the coleta collection point finder.

/// Location permission and single-reading probe.
pub mod location;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Filter set, category and point query state for the points screen.
pub mod points;
/// Traits describing the provider interfaces.
pub mod ports;
/// State to city cascade for the home screen.
pub mod region;
/// Generation-tagged remote data holders.
pub mod remote;
/// High-level service facade used by clients.
pub mod service;

pub use location::*;
pub use model::*;
pub use points::*;
pub use ports::*;
pub use region::*;
pub use remote::*;
pub use service::*;
