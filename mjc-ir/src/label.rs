//! Jump targets

use mjc_common::concat_names;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Assembly label, unique across the whole program
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::new(name)
    }
}

/// Program-wide label counter
///
/// One manager is shared by every fragment of a compilation so generated
/// labels never collide between procedures.
#[derive(Debug, Default)]
pub struct LabelManager {
    next: u32,
}

impl LabelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `prefix$...NNNN`, e.g. `if$then0000`
    pub fn create(&mut self, prefix: &[&str]) -> Label {
        let label = Label(format!("{}{:04}", concat_names(prefix), self.next));
        self.next += 1;
        label
    }

    /// Start numbering again from zero (between independent runs)
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_share_one_counter() {
        let mut labels = LabelManager::new();
        assert_eq!(labels.create(&["if", "then"]).name(), "if$then0000");
        assert_eq!(labels.create(&["if", "else"]).name(), "if$else0001");
        assert_eq!(labels.create(&["while"]).name(), "while0002");

        labels.reset();
        assert_eq!(labels.create(&["done"]).name(), "done0000");
    }
}
