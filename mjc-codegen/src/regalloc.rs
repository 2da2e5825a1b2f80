//! Register Allocation
//!
//! A single forward pass over the instruction list. Registers are handed out
//! first-come first-served from the target's local pool when a virtual
//! register is first defined, and go back to the pool once its lifetime is
//! over. There is no spilling: when the pool runs dry the pass stops and
//! reports where, and whatever was assigned so far is kept.

use crate::fragment::CodeFragment;
use crate::lifetime::LifetimeMap;
use log::debug;
use mjc_ir::{Temp, TempManager};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegAllocError {
    #[error("Ran out of registers at instruction {index} allocating {temp} (no spilling)")]
    OutOfRegisters { index: usize, temp: Temp },
}

/// Virtual register -> machine register assignments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterMap {
    assignments: BTreeMap<Temp, Temp>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, temp: Temp, register: Temp) {
        self.assignments.insert(temp, register);
    }

    pub fn get(&self, temp: &Temp) -> Option<&Temp> {
        self.assignments.get(temp)
    }

    pub fn contains(&self, temp: &Temp) -> bool {
        self.assignments.contains_key(temp)
    }

    /// Assigned register, or the name itself when unassigned
    pub fn resolve<'a>(&'a self, temp: &'a Temp) -> &'a Temp {
        self.assignments.get(temp).unwrap_or(temp)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Temp, &Temp)> {
        self.assignments.iter()
    }
}

/// Fixed set of interchangeable registers, each free or busy
#[derive(Debug, Clone)]
pub struct RegisterPool {
    registers: Vec<(Temp, bool)>,
}

impl RegisterPool {
    pub fn new(registers: Vec<Temp>) -> Self {
        Self {
            registers: registers.into_iter().map(|reg| (reg, true)).collect(),
        }
    }

    /// Take the first free register
    pub fn acquire(&mut self) -> Option<Temp> {
        let (reg, free) = self.registers.iter_mut().find(|(_, free)| *free)?;
        *free = false;
        Some(reg.clone())
    }

    /// Give a register back. Returns false if it was not busy.
    pub fn release(&mut self, register: &Temp) -> bool {
        match self.registers.iter_mut().find(|(reg, free)| reg == register && !*free) {
            Some((_, free)) => {
                *free = true;
                true
            }
            None => false,
        }
    }

    pub fn free_count(&self) -> usize {
        self.registers.iter().filter(|(_, free)| *free).count()
    }
}

/// Outcome of allocating one fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub map: RegisterMap,
    /// Set when the pool ran out; `map` is then partial
    pub exhausted: Option<RegAllocError>,
}

/// First-fit allocation over `fragment.code` using its current lifetimes
pub fn allocate(fragment: &CodeFragment, registers: Vec<Temp>) -> Allocation {
    allocate_code(&fragment.code, &fragment.temps, &fragment.lifetimes, registers)
}

pub fn allocate_code(
    code: &[crate::asm::Instruction],
    temps: &TempManager,
    lifetimes: &LifetimeMap,
    registers: Vec<Temp>,
) -> Allocation {
    let mut pool = RegisterPool::new(registers);
    let mut map = RegisterMap::new();
    let mut alive: HashMap<Temp, Temp> = HashMap::new();

    for (index, insn) in code.iter().enumerate() {
        for temp in temps.children() {
            let Some(register) = alive.get(temp) else {
                continue;
            };
            let over = lifetimes
                .get(temp)
                .and_then(|life| life.last_index())
                .map_or(true, |last| last < index);
            if over {
                if pool.release(register) {
                    debug!("Freeing register {} from {} at instruction {:04}", register, temp, index);
                }
                alive.remove(temp);
            }
        }

        for def in insn.def_temps() {
            if !temps.is_child(def) || map.contains(def) {
                continue;
            }

            match pool.acquire() {
                Some(register) => {
                    debug!("Allocated register {} for {}", register, def);
                    map.insert(def.clone(), register.clone());
                    alive.insert(def.clone(), register);
                }
                None => {
                    debug!("Ran out of registers at instruction {:04}, cannot spill", index);
                    return Allocation {
                        map,
                        exhausted: Some(RegAllocError::OutOfRegisters {
                            index,
                            temp: def.clone(),
                        }),
                    };
                }
            }
        }
    }

    Allocation { map, exhausted: None }
}
