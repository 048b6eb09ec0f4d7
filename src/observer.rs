//! Change notification for repository observers.

use crate::view::NotesView;
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// What kind of state change an observer is being told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The collection was (re)loaded from storage, successfully or not.
    Loaded,
    /// The search query changed.
    QueryChanged,
    /// A note was inserted or replaced.
    Upserted,
    /// A delete was applied, whether or not it matched a note.
    Deleted,
}

pub(crate) type OnChangeInner = Box<dyn FnMut(&NotesView<'_>, ChangeKind) + Send>;

/// A registered change callback.
#[derive(Clone)]
pub(crate) struct OnChange(Arc<Mutex<OnChangeInner>>);

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, OnChange)>,
}

/// The set of callbacks currently subscribed to a repository.
#[derive(Default)]
pub(crate) struct Observers(Arc<Mutex<Registry>>);

impl Observers {
    pub(crate) fn subscribe(&self, on_change: OnChangeInner) -> Subscription {
        let mut registry = self.0.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .entries
            .push((id, OnChange(Arc::new(Mutex::new(on_change)))));
        Subscription {
            id,
            registry: Arc::downgrade(&self.0),
            detached: false,
        }
    }

    /// Runs every subscribed callback with the committed state.
    ///
    /// The registry lock is released before any callback runs, so callbacks may drop
    /// subscriptions, including their own.
    pub(crate) fn notify(&self, view: &NotesView<'_>, kind: ChangeKind) {
        let callbacks: Vec<OnChange> = self
            .0
            .lock()
            .entries
            .iter()
            .map(|(_, on_change)| on_change.clone())
            .collect();
        for on_change in callbacks {
            (on_change.0.lock())(view, kind);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().entries.len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("callbacks", &self.len())
            .finish()
    }
}

/// Handle returned by [`NotesRepository::subscribe`](crate::NotesRepository::subscribe).
///
/// Dropping the handle unregisters the callback. Call [`Subscription::detach`] to keep the
/// callback registered for as long as the repository lives.
#[must_use = "dropping a Subscription unregisters its callback immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
    detached: bool,
}

impl Subscription {
    /// Unregisters the callback.
    pub fn unsubscribe(self) {}

    /// Leaves the callback registered until the repository is dropped.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("detached", &self.detached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{ColorValue, Note};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(observers: &Observers) -> (Arc<AtomicUsize>, Subscription) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let subscription = observers.subscribe(Box::new(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        (calls, subscription)
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let observers = Observers::default();
        let view = NotesView::new(&[], "");

        let (calls, subscription) = counter(&observers);
        observers.notify(&view, ChangeKind::Loaded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(subscription);
        observers.notify(&view, ChangeKind::Loaded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observers.len(), 0);
    }

    #[test]
    fn detached_subscription_stays_registered() {
        let observers = Observers::default();
        let view = NotesView::new(&[], "");

        let (calls, subscription) = counter(&observers);
        subscription.detach();
        observers.notify(&view, ChangeKind::QueryChanged);
        observers.notify(&view, ChangeKind::QueryChanged);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn callback_sees_state_and_kind() {
        let observers = Observers::default();
        let notes = vec![Note::with_id("1", "Groceries", "milk", ColorValue::DEFAULT)];
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _subscription = observers.subscribe(Box::new(move |view, kind| {
            seen_clone
                .lock()
                .push((kind, view.notes().len(), view.query().to_string()));
        }));

        observers.notify(&NotesView::new(&notes, "milk"), ChangeKind::Upserted);
        assert_eq!(
            *seen.lock(),
            vec![(ChangeKind::Upserted, 1, "milk".to_string())]
        );
    }

    #[test]
    fn callback_may_drop_another_subscription() {
        let observers = Observers::default();
        let view = NotesView::new(&[], "");

        let (calls, victim) = counter(&observers);
        let victim = Arc::new(Mutex::new(Some(victim)));
        let victim_clone = victim.clone();
        observers
            .subscribe(Box::new(move |_, _| {
                victim_clone.lock().take();
            }))
            .detach();

        observers.notify(&view, ChangeKind::Deleted);
        assert!(victim.lock().is_none());
        observers.notify(&view, ChangeKind::Deleted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
