//! Virtual registers
//!
//! A [`Temp`] is just a name. Whether it is a virtual register or a machine
//! register is decided by who owns it: names minted or adopted by a
//! procedure's [`TempManager`] are virtual, everything else is physical.

use mjc_common::concat_names;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Register name, virtual (`t0003`) or physical (`%o0`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temp(String);

impl Temp {
    pub fn new(name: impl Into<String>) -> Self {
        Temp(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Temp {
    fn from(name: &str) -> Self {
        Temp::new(name)
    }
}

impl From<String> for Temp {
    fn from(name: String) -> Self {
        Temp(name)
    }
}

/// Per-procedure owner of virtual registers
///
/// Children are kept in creation order so lifetime dumps and allocation
/// are deterministic.
#[derive(Debug, Clone, Default)]
pub struct TempManager {
    next: u32,
    children: Vec<Temp>,
    owned: HashSet<Temp>,
}

impl TempManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh virtual register named `tNNNN`
    pub fn create(&mut self) -> Temp {
        self.create_with_prefix(&["t"])
    }

    /// Mint a fresh virtual register whose name starts with the given
    /// `$`-joined tokens
    pub fn create_with_prefix(&mut self, prefix: &[&str]) -> Temp {
        let stem = concat_names(prefix);
        loop {
            let temp = Temp(format!("{}{:04}", stem, self.next));
            self.next += 1;
            if !self.owned.contains(&temp) {
                self.add_child(temp.clone());
                return temp;
            }
        }
    }

    /// Take ownership of a register that already appears in the IR.
    /// Returns false if it was already owned.
    pub fn adopt(&mut self, temp: Temp) -> bool {
        if self.owned.contains(&temp) {
            return false;
        }
        self.add_child(temp);
        true
    }

    fn add_child(&mut self, temp: Temp) {
        self.owned.insert(temp.clone());
        self.children.push(temp);
    }

    /// Is this register one of ours (virtual)?
    pub fn is_child(&self, temp: &Temp) -> bool {
        self.owned.contains(temp)
    }

    pub fn children(&self) -> &[Temp] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_sequence() {
        let mut temps = TempManager::new();
        assert_eq!(temps.create(), Temp::new("t0000"));
        assert_eq!(temps.create(), Temp::new("t0001"));
        assert_eq!(temps.len(), 2);
    }

    #[test]
    fn test_create_skips_adopted_names() {
        let mut temps = TempManager::new();
        assert!(temps.adopt(Temp::new("t0000")));
        assert!(!temps.adopt(Temp::new("t0000")));

        let fresh = temps.create();
        assert_eq!(fresh, Temp::new("t0001"));
        assert_eq!(
            temps.children().to_vec(),
            vec![Temp::new("t0000"), Temp::new("t0001")]
        );
    }

    #[test]
    fn test_prefixed_names() {
        let mut temps = TempManager::new();
        assert_eq!(temps.create_with_prefix(&["ret", "val"]).name(), "ret$val0000");
    }

    #[test]
    fn test_unowned_is_not_child() {
        let temps = TempManager::new();
        assert!(!temps.is_child(&Temp::new("%o0")));
        assert!(temps.is_empty());
    }
}
