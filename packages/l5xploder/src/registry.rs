//! Registry of output paths reserved during one explode run.

use std::collections::HashSet;

use crate::config::join_rel;

/// Case-insensitive set of reserved relative paths (without extension).
///
/// Created fresh for every explode and never persisted.
#[derive(Debug, Default)]
pub struct PathRegistry {
    reserved: HashSet<String>,
}

impl PathRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find and reserve the first free path for `base_name` in `folder`.
    ///
    /// Returns `folder/base_name`, or `folder/base_name_1`, `folder/base_name_2`, ...
    /// when earlier candidates are taken.
    ///
    /// # Examples
    /// ```
    /// use l5xploder::registry::PathRegistry;
    ///
    /// let mut registry = PathRegistry::new();
    /// assert_eq!(registry.find_unreserved("Tags", "Motor"), "Tags/Motor");
    /// assert_eq!(registry.find_unreserved("Tags", "MOTOR"), "Tags/MOTOR_1");
    /// ```
    pub fn find_unreserved(&mut self, folder: &str, base_name: &str) -> String {
        let mut candidate = join_rel(folder, base_name);
        let mut counter = 1;
        while self.is_reserved(&candidate) {
            candidate = join_rel(folder, &format!("{base_name}_{counter}"));
            counter += 1;
        }
        self.reserve(&candidate);
        candidate
    }

    /// Reserve a path. Returns `false` if it was already reserved.
    pub fn reserve(&mut self, path: &str) -> bool {
        self.reserved.insert(fold(path))
    }

    /// Check whether a path is reserved.
    #[must_use]
    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved.contains(&fold(path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
}

fn fold(path: &str) -> String {
    path.to_uppercase()
}
