//! LIFO of enclosing calls used to rebuild nesting from indented traces.

/// Stack of ancestors, innermost on top
#[derive(Debug, Clone)]
pub struct IndentationStack<T> {
    items: Vec<T>,
}

impl<T> IndentationStack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Innermost ancestor, if any
    pub fn top(&self) -> Option<&T> {
        self.items.last()
    }

    /// Pop `levels` ancestors; popping past the bottom is a no-op
    pub fn unwind(&mut self, levels: usize) {
        let keep = self.items.len().saturating_sub(levels);
        self.items.truncate(keep);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for IndentationStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
