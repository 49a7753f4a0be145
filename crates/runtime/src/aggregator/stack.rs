//! Priority-ordered stack used for config overrides and modifiers.

use stealth_core::StackHandle;

#[derive(Clone, Debug)]
pub struct StackEntry<T> {
    pub handle: StackHandle,
    pub priority: i32,
    pub value: T,
}

/// Entries ordered by `(priority, insertion)`; the top is the last element.
#[derive(Clone, Debug)]
pub struct PriorityStack<T> {
    entries: Vec<StackEntry<T>>,
}

impl<T> PriorityStack<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts after every entry of equal or lower priority.
    pub fn push(&mut self, handle: StackHandle, priority: i32, value: T) {
        let at = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(
            at,
            StackEntry {
                handle,
                priority,
                value,
            },
        );
    }

    /// Highest priority; the most recently pushed wins ties.
    pub fn top(&self) -> Option<&T> {
        self.entries.last().map(|e| &e.value)
    }

    /// Removes the most recently pushed entry regardless of priority.
    pub fn pop_latest(&mut self) -> Option<StackEntry<T>> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| e.handle)
            .map(|(i, _)| i)?;
        Some(self.entries.remove(index))
    }

    pub fn remove(&mut self, handle: StackHandle) -> Option<StackEntry<T>> {
        let index = self.entries.iter().position(|e| e.handle == handle)?;
        Some(self.entries.remove(index))
    }

    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.entries.iter().position(|e| pred(&e.value))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<StackEntry<T>> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Removes every entry matching `pred` and returns how many went.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.value));
        before - self.entries.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn entries(&self) -> &[StackEntry<T>] {
        &self.entries
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

impl<T> Default for PriorityStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
