//! Invariants checked over every built-in sample

use crate::fragment::CodeFragment;
use crate::peephole;
use crate::pipeline::Backend;
use crate::samples::{sample, SAMPLE_NAMES};
use crate::target::{Sparc, Target};
use mjc_common::{CompilerConfig, ErrorReporter, OptLevel};
use pretty_assertions::assert_eq;

fn selected(opt_level: OptLevel) -> Vec<CodeFragment> {
    let backend = Backend::new(CompilerConfig {
        opt_level,
        ..CompilerConfig::default()
    });
    let mut reporter = ErrorReporter::new();
    let mut fragments = Vec::new();
    for name in SAMPLE_NAMES {
        let program = sample(name).unwrap();
        fragments.extend(backend.codegen(program, &mut reporter));
    }
    assert!(!reporter.has_errors(), "{}", reporter.summary());
    fragments
}

fn allocated() -> Vec<CodeFragment> {
    let backend = Backend::default();
    let mut reporter = ErrorReporter::new();
    let mut fragments = Vec::new();
    for name in SAMPLE_NAMES {
        fragments.extend(backend.run(sample(name).unwrap(), &mut reporter).unwrap());
    }
    assert_eq!(reporter.warning_count(), 0);
    fragments
}

#[test]
fn test_lifetime_validity_matches_reference_count() {
    for mut fragment in selected(OptLevel::O0) {
        fragment.update_lifetimes();
        for temp in fragment.temps.children() {
            let references: usize = fragment
                .code
                .iter()
                .map(|insn| insn.def_temps().chain(insn.use_temps()).filter(|t| *t == temp).count())
                .sum();
            let life = fragment.lifetimes.get(temp).unwrap();
            match references {
                0 | 1 => assert!(!life.is_valid(), "{} in {}", temp, fragment.name()),
                _ => assert!(life.is_valid(), "{} in {}", temp, fragment.name()),
            }
        }
    }
}

#[test]
fn test_optimizer_reaches_fixpoint() {
    for mut fragment in selected(OptLevel::O1) {
        let before = fragment.operation_count();
        peephole::optimize(&Sparc, &mut fragment);
        let settled = fragment.code.clone();

        assert!(!Sparc.optimize_pass(&mut fragment), "{}", fragment.name());
        assert_eq!(fragment.code, settled);
        assert!(fragment.operation_count() <= before);
    }
}

#[test]
fn test_allocation_never_shares_a_live_register() {
    for fragment in allocated() {
        let registers = fragment.registers.as_ref().unwrap();
        let spans: Vec<_> = registers
            .iter()
            .map(|(temp, reg)| {
                let life = fragment.lifetimes.get(temp).unwrap();
                let start = life.start.unwrap();
                (temp, reg, start, life.last_index().unwrap_or(start))
            })
            .collect();

        for (i, a) in spans.iter().enumerate() {
            for b in &spans[i + 1..] {
                let overlap = a.2 <= b.3 && b.2 <= a.3;
                if overlap {
                    assert!(a.1 != b.1, "{} and {} share {} in {}", a.0, b.0, a.1, fragment.name());
                }
            }
        }
    }
}

#[test]
fn test_only_owned_registers_are_allocated() {
    let target = Sparc;
    for fragment in allocated() {
        for (temp, reg) in fragment.registers.as_ref().unwrap().iter() {
            assert!(fragment.temps.is_child(temp));
            assert!(!target.is_physical_register(temp));
            assert!(target.local_registers().contains(reg));
        }
    }
}
