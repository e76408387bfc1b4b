//! Linear undo/redo stacks

use std::collections::VecDeque;

/// Bounded past stack plus an unbounded future stack
///
/// Recording a new snapshot drops the oldest one beyond the limit and
/// discards the future.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    /// Last element is the next redo target
    future: Vec<T>,
    limit: usize,
}

impl<T> History<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Record the state as it was before a mutation
    pub fn record(&mut self, snapshot: T) {
        self.future.clear();
        self.push_past(snapshot);
    }

    /// Step back; `current` becomes the next redo target
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward; `current` goes back onto the past stack
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.push_past(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    fn push_past(&mut self, snapshot: T) {
        if self.limit == 0 {
            return;
        }
        self.past.push_back(snapshot);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }
}
