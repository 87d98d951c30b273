//! Index configuration.

/// Configuration for an [`AvlIndex`](crate::AvlIndex).
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Initial capacity hint: number of distinct values and identifiers to
    /// pre-allocate for.
    pub initial_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
        }
    }
}

impl IndexConfig {
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }
}
