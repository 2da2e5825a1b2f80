//! Lifetime Analysis
//!
//! A lifetime is the span between the first and the last textual reference
//! to a virtual register in a fragment's instruction list. It ignores control
//! flow entirely: a register used at the top of a loop and defined at the
//! bottom gets a lifetime that only covers the text between them. Every
//! decision built on top of it (peephole merges, register release) only looks
//! at adjacent instructions, which keeps the approximation safe for the code
//! the selector produces.

use crate::asm::Instruction;
use log::debug;
use mjc_ir::{Temp, TempManager};
use std::collections::HashMap;

/// First and last reference of one register, as instruction indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifetime {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl Lifetime {
    /// Record a reference at `index`. The first reference starts the
    /// lifetime, every later one (even inside the same instruction) moves
    /// the end.
    pub fn reference(&mut self, index: usize) {
        if self.start.is_none() {
            self.start = Some(index);
        } else {
            self.end = Some(index);
        }
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => false,
        }
    }

    /// Last index at which the register must still hold its value
    pub fn last_index(&self) -> Option<usize> {
        self.end.or(self.start)
    }

    pub fn ends_at(&self, index: usize) -> bool {
        self.end == Some(index)
    }
}

/// Lifetimes of every register a fragment owns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifetimeMap {
    lifetimes: HashMap<Temp, Lifetime>,
}

impl LifetimeMap {
    /// Scan `code` and compute a lifetime for every child of `temps`.
    /// Physical registers are not tracked.
    pub fn analyze(code: &[Instruction], temps: &TempManager) -> Self {
        let mut lifetimes: HashMap<Temp, Lifetime> = temps
            .children()
            .iter()
            .map(|temp| (temp.clone(), Lifetime::default()))
            .collect();

        for (index, insn) in code.iter().enumerate() {
            for temp in insn.def_temps().chain(insn.use_temps()) {
                if let Some(life) = lifetimes.get_mut(temp) {
                    life.reference(index);
                }
            }
        }

        Self { lifetimes }
    }

    pub fn get(&self, temp: &Temp) -> Option<&Lifetime> {
        self.lifetimes.get(temp)
    }

    /// Does `temp`'s lifetime end exactly at `index`?
    pub fn ends_at(&self, temp: &Temp, index: usize) -> bool {
        self.get(temp).is_some_and(|life| life.ends_at(index))
    }

    pub fn len(&self) -> usize {
        self.lifetimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
    }

    /// Log every lifetime in the order the registers were created
    pub fn dump(&self, code: &[Instruction], temps: &TempManager) {
        for temp in temps.children() {
            let life = match self.get(temp) {
                Some(life) if life.is_valid() => life,
                _ => {
                    debug!("Lifetime {}: N/A", temp);
                    continue;
                }
            };
            let (start, end) = (life.start.unwrap_or(0), life.end.unwrap_or(0));
            debug!(
                "Lifetime {}: begin (no:{:04}) {} / end (no:{:04}) {}",
                temp,
                start,
                code.get(start).map(|i| i.to_string()).unwrap_or_default(),
                end,
                code.get(end).map(|i| i.to_string()).unwrap_or_default(),
            );
        }
    }
}
