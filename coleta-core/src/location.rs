//! One-shot location acquisition seeding the map viewport.

use crate::model::{Coordinate, MapViewport};
use crate::ports::PermissionStatus;
use crate::service::ServiceError;

#[derive(Debug, Clone, PartialEq)]
/// Where the probe stands. "Not known yet" and "known to be unavailable"
/// are distinct variants rather than a placeholder coordinate.
pub enum ProbeState {
    /// Permission not asked yet.
    Unrequested,
    /// Waiting for the user to answer the permission prompt.
    PermissionPending,
    /// Permission granted, waiting for a reading.
    Resolving,
    /// A reading is available.
    Resolved(Coordinate),
    /// Permission granted but the device produced no reading.
    Unavailable(String),
    /// Permission refused. Terminal.
    Denied,
}

/// Location permission and single-reading state for one points screen mount.
#[derive(Debug)]
pub struct LocationProbe {
    state: ProbeState,
    advisory_pending: bool,
}

impl Default for LocationProbe {
    fn default() -> Self {
        Self {
            state: ProbeState::Unrequested,
            advisory_pending: false,
        }
    }
}

impl LocationProbe {
    /// Probe that has not asked for permission yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the permission request as issued. Returns `false` if it already was.
    pub fn begin(&mut self) -> bool {
        if self.state != ProbeState::Unrequested {
            return false;
        }
        self.state = ProbeState::PermissionPending;
        true
    }

    /// Apply the permission answer. Returns `true` when a reading should be fetched.
    pub fn on_permission(&mut self, status: PermissionStatus) -> bool {
        if self.state != ProbeState::PermissionPending {
            tracing::debug!(?status, state = ?self.state, "ignoring permission answer");
            return false;
        }
        match status {
            PermissionStatus::Granted => {
                self.state = ProbeState::Resolving;
                true
            }
            PermissionStatus::Denied => {
                self.state = ProbeState::Denied;
                self.advisory_pending = true;
                false
            }
        }
    }

    /// Apply the position reading. Failures are logged and never retried.
    pub fn on_position(&mut self, result: Result<Coordinate, ServiceError>) {
        if self.state != ProbeState::Resolving {
            tracing::debug!(state = ?self.state, "ignoring position reading");
            return;
        }
        self.state = match result {
            Ok(coordinate) => ProbeState::Resolved(coordinate),
            Err(err) => {
                tracing::warn!(error = %err, "position unavailable, map stays uncentered");
                ProbeState::Unavailable(err.to_string())
            }
        };
    }

    /// Advisory to show after a denial. Yields it once.
    pub fn take_advisory(&mut self) -> Option<ServiceError> {
        if !self.advisory_pending {
            return None;
        }
        self.advisory_pending = false;
        Some(ServiceError::PermissionDenied)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    /// Initial map region. Only available once a reading resolved.
    #[must_use]
    pub fn viewport(&self) -> Option<MapViewport> {
        match self.state {
            ProbeState::Resolved(center) => Some(MapViewport::centered_on(center)),
            _ => None,
        }
    }
}
