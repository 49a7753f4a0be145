//! Synchronous observer lists keyed by subscription tokens.

use std::fmt;

/// Opaque handle returned by every `on_*` registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// Monotonic token issuer shared by all lists of one service.
#[derive(Debug, Default)]
pub struct TokenSource {
    next: u64,
}

impl TokenSource {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn issue(&mut self) -> SubscriptionToken {
        let token = SubscriptionToken(self.next.max(1));
        self.next = token.0 + 1;
        token
    }
}

type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered list of callbacks for one notification kind.
pub struct ObserverList<E> {
    entries: Vec<(SubscriptionToken, Callback<E>)>,
}

impl<E> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, token: SubscriptionToken, callback: Callback<E>) {
        self.entries.push((token, callback));
    }

    /// Returns whether the token was registered here.
    pub fn remove(&mut self, token: SubscriptionToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != token);
        self.entries.len() != before
    }

    /// Invokes every callback in registration order.
    pub fn notify(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
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

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn notify_in_order_and_remove_by_token() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut tokens = TokenSource::new();
        let mut list = ObserverList::<u32>::new();

        let first = tokens.issue();
        let sink = Arc::clone(&seen);
        list.push(first, Box::new(move |v| sink.lock().unwrap().push(("a", *v))));
        let second = tokens.issue();
        let sink = Arc::clone(&seen);
        list.push(second, Box::new(move |v| sink.lock().unwrap().push(("b", *v))));

        list.notify(&7);
        assert!(list.remove(first));
        assert!(!list.remove(first));
        list.notify(&8);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7), ("b", 8)]);
        assert_ne!(first, second);
    }
}
