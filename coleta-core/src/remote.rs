//! Remote data holders that tag every request with a generation so late
//! responses for superseded keys can be recognised and dropped.

use std::fmt::Display;
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Handle for one issued request. Only the latest ticket of a source is current.
pub struct Ticket(u64);

impl Ticket {
    /// Generation number the ticket was issued with.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Observable load state of remotely fetched data.
pub enum Remote<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight; `previous` is the last good value, if kept.
    Loading {
        /// Stale data shown while loading.
        previous: Option<T>,
    },
    /// Latest request succeeded.
    Ready(T),
    /// Latest request failed; `previous` is the last good value, if kept.
    Failed {
        /// Human readable failure.
        message: String,
        /// Stale data still shown after the failure.
        previous: Option<T>,
    },
}

impl<T> Default for Remote<T> {
    fn default() -> Self {
        Remote::Idle
    }
}

impl<T> Remote<T> {
    fn take_value(&mut self) -> Option<T> {
        match mem::replace(self, Remote::Idle) {
            Remote::Ready(value) => Some(value),
            Remote::Loading { previous } | Remote::Failed { previous, .. } => previous,
            Remote::Idle => None,
        }
    }

    fn start(&mut self, keep_previous: bool) {
        let previous = self.take_value().filter(|_| keep_previous);
        *self = Remote::Loading { previous };
    }

    fn finish<E: Display>(&mut self, result: Result<T, E>) {
        *self = match result {
            Ok(value) => Remote::Ready(value),
            Err(err) => Remote::Failed {
                message: err.to_string(),
                previous: self.take_value(),
            },
        };
    }

    /// Current or stale value, whichever is available.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Remote::Ready(value) => Some(value),
            Remote::Loading { previous } | Remote::Failed { previous, .. } => previous.as_ref(),
            Remote::Idle => None,
        }
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading { .. })
    }

    /// Whether the shown value does not reflect the latest request.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Remote::Loading { previous: Some(_) } | Remote::Failed { previous: Some(_), .. }
        )
    }

    /// Failure message of the latest request.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Remote::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a list built atop a [`Remote`] should display.
pub enum ListView {
    /// Nothing requested.
    Idle,
    /// In flight without anything to show yet.
    Loading,
    /// Loaded, no entries.
    Empty,
    /// Entries available (possibly stale).
    Populated(usize),
    /// Failed without anything to show.
    Failed,
}

impl<U> Remote<Vec<U>> {
    /// Collapse the load state into the list view to render.
    #[must_use]
    pub fn view(&self) -> ListView {
        match self {
            Remote::Idle => ListView::Idle,
            Remote::Ready(items) if items.is_empty() => ListView::Empty,
            Remote::Ready(items) => ListView::Populated(items.len()),
            Remote::Loading { previous } => match previous {
                Some(items) if !items.is_empty() => ListView::Populated(items.len()),
                _ => ListView::Loading,
            },
            Remote::Failed { previous, .. } => match previous {
                Some(items) if !items.is_empty() => ListView::Populated(items.len()),
                _ => ListView::Failed,
            },
        }
    }

    /// Entries to display, empty while nothing is available.
    #[must_use]
    pub fn items(&self) -> &[U] {
        self.value().map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone)]
/// Remote data invalidated whenever its upstream key changes.
///
/// Every [`KeyedSource::begin`] bumps the generation; [`KeyedSource::accept`]
/// only applies results whose ticket carries the latest generation.
pub struct KeyedSource<K, T> {
    key: Option<K>,
    generation: u64,
    remote: Remote<T>,
}

impl<K, T> Default for KeyedSource<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            generation: 0,
            remote: Remote::Idle,
        }
    }
}

impl<K, T> KeyedSource<K, T> {
    /// Empty source with no key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a request for `key`, keeping the current value visible as stale.
    pub fn begin(&mut self, key: K) -> Ticket {
        self.issue(key, true)
    }

    /// Issue a request for `key`, discarding the current value.
    pub fn begin_fresh(&mut self, key: K) -> Ticket {
        self.issue(key, false)
    }

    fn issue(&mut self, key: K, keep_previous: bool) -> Ticket {
        self.generation += 1;
        self.key = Some(key);
        self.remote.start(keep_previous);
        Ticket(self.generation)
    }

    /// Drop key and data, invalidating any request in flight.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.key = None;
        self.remote = Remote::Idle;
    }

    /// Whether `ticket` belongs to the latest request.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.key.is_some() && ticket.0 == self.generation
    }

    /// Apply a result if `ticket` is current. Returns whether it was applied.
    pub fn accept<E: Display>(&mut self, ticket: Ticket, result: Result<T, E>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.remote.finish(result);
        true
    }

    /// Key of the latest request.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Load state of the latest request.
    #[must_use]
    pub fn remote(&self) -> &Remote<T> {
        &self.remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ticket_is_rejected() {
        let mut source: KeyedSource<&str, Vec<u8>> = KeyedSource::new();
        let first = source.begin("a");
        let second = source.begin("b");

        assert!(!source.accept(first, Ok::<_, String>(vec![1])));
        assert!(source.remote().is_loading());
        assert!(source.accept(second, Ok::<_, String>(vec![2, 2])));
        assert_eq!(source.remote().items(), &[2, 2]);
    }

    #[test]
    fn clear_invalidates_in_flight_request() {
        let mut source: KeyedSource<u8, Vec<u8>> = KeyedSource::new();
        let ticket = source.begin(1);
        source.clear();
        assert!(!source.accept(ticket, Ok::<_, String>(vec![1])));
        assert_eq!(source.remote().view(), ListView::Idle);
    }

    #[test]
    fn failure_keeps_previous_value_as_stale() {
        let mut source: KeyedSource<u8, Vec<u8>> = KeyedSource::new();
        let ticket = source.begin(1);
        source.accept(ticket, Ok::<_, String>(vec![4, 5]));
        let ticket = source.begin(2);
        assert!(source.remote().is_stale());
        source.accept(ticket, Err("boom"));

        assert_eq!(source.remote().error(), Some("boom"));
        assert!(source.remote().is_stale());
        assert_eq!(source.remote().view(), ListView::Populated(2));
    }

    #[test]
    fn fresh_request_drops_previous_value() {
        let mut source: KeyedSource<u8, Vec<u8>> = KeyedSource::new();
        let ticket = source.begin(1);
        source.accept(ticket, Ok::<_, String>(vec![4]));
        source.begin_fresh(2);
        assert_eq!(source.remote().view(), ListView::Loading);
        assert!(source.remote().items().is_empty());
    }

    #[test]
    fn view_distinguishes_loading_empty_populated_failed() {
        let mut source: KeyedSource<(), Vec<u8>> = KeyedSource::new();
        let ticket = source.begin(());
        assert_eq!(source.remote().view(), ListView::Loading);
        source.accept(ticket, Ok::<_, String>(Vec::new()));
        assert_eq!(source.remote().view(), ListView::Empty);
        let ticket = source.begin(());
        source.accept(ticket, Ok::<_, String>(vec![9]));
        assert_eq!(source.remote().view(), ListView::Populated(1));
        let ticket = source.begin_fresh(());
        source.accept(ticket, Err("offline"));
        assert_eq!(source.remote().view(), ListView::Failed);
    }
}
