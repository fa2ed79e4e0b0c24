//! Equality-gated selectors
//!
//! A [`Selector`] projects a slice out of a larger state and only reports a
//! change when the new slice differs from the last one it handed out, under
//! a caller supplied equality test. [`Subscribers`] binds selectors to
//! listener callbacks so a store can fan a new state out to observers that
//! only care about one slice of it.

use crate::error::{PlaybackError, Result};

/// Deltas below this many seconds count as "unchanged" for time values
pub const TIME_TOLERANCE: f64 = 0.1;

type Projection<S, T> = Box<dyn Fn(&S) -> T>;
type Equality<T> = Box<dyn Fn(&T, &T) -> bool>;

/// Derived value that recomputes only when its projection changes
pub struct Selector<S, T> {
    project: Projection<S, T>,
    equals: Equality<T>,
    current: Option<T>,
}

impl<S, T> Selector<S, T>
where
    S: 'static,
    T: PartialEq + 'static,
{
    /// Selector using `PartialEq` to detect changes
    pub fn new(project: impl Fn(&S) -> T + 'static) -> Self {
        Self::with_equality(project, |a: &T, b: &T| a == b)
    }
}

impl<S: 'static, T: 'static> Selector<S, T> {
    /// Selector with a custom equality strategy
    pub fn with_equality(
        project: impl Fn(&S) -> T + 'static,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self {
            project: Box::new(project),
            equals: Box::new(equals),
            current: None,
        }
    }

    /// Recompute against `source`
    ///
    /// Returns `true` when the projected value changed (the first evaluation
    /// always counts as a change). When unchanged, the previously selected
    /// value is kept so tolerance-based comparisons measure drift from the
    /// last value observers actually saw.
    pub fn update(&mut self, source: &S) -> bool {
        let next = (self.project)(source);
        match &self.current {
            Some(current) if (self.equals)(current, &next) => false,
            _ => {
                self.current = Some(next);
                true
            }
        }
    }

    /// Last selected value
    ///
    /// Reading a selector that was never evaluated is a programming error and
    /// fails instead of inventing a default.
    pub fn current(&self) -> Result<&T> {
        self.current.as_ref().ok_or(PlaybackError::SelectorUninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }
}

/// Element-wise equality for lists, so re-fetching an identical list is a no-op
pub fn shallow_slice_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Time equality with [`TIME_TOLERANCE`]
pub fn time_eq(a: f64, b: f64) -> bool {
    time_eq_within(a, b, TIME_TOLERANCE)
}

/// Time equality with an explicit tolerance
///
/// Two NaNs compare equal so an unknown duration does not flap.
pub fn time_eq_within(a: f64, b: f64, tolerance: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    a == b || (a - b).abs() < tolerance
}

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

trait Notify<S> {
    fn notify(&mut self, state: &S) -> bool;
}

struct Bound<S, T> {
    selector: Selector<S, T>,
    listener: Box<dyn FnMut(&T)>,
}

impl<S: 'static, T: 'static> Notify<S> for Bound<S, T> {
    fn notify(&mut self, state: &S) -> bool {
        if !self.selector.update(state) {
            return false;
        }
        if let Ok(value) = self.selector.current() {
            (self.listener)(value);
        }
        true
    }
}

/// Listener registry, one selector per listener
pub struct Subscribers<S> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<dyn Notify<S>>)>,
}

impl<S: 'static> Subscribers<S> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register `listener` behind `selector`
    ///
    /// The selector is primed against `state` without calling the listener,
    /// so the first notification is the first real change.
    pub fn subscribe<T: 'static>(
        &mut self,
        state: &S,
        mut selector: Selector<S, T>,
        listener: impl FnMut(&T) + 'static,
    ) -> SubscriptionId {
        selector.update(state);
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((
            id,
            Box::new(Bound {
                selector,
                listener: Box::new(listener),
            }),
        ));
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Offer a new state to every selector, in subscription order
    ///
    /// Returns how many listeners were called.
    pub fn notify_all(&mut self, state: &S) -> usize {
        self.entries
            .iter_mut()
            .map(|(_, entry)| entry.notify(state))
            .filter(|notified| *notified)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<S: 'static> Default for Subscribers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for Subscribers<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.entries.len())
            .finish()
    }
}
