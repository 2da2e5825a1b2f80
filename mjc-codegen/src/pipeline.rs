//! Phase driver
//!
//! Runs CodeGen, Optimize and RegAlloc over every fragment of a program.
//! Problems go to the [`ErrorReporter`]; a selection error drops only its
//! own fragment, but any error stops the pipeline after CodeGen.

use crate::fragment::CodeFragment;
use crate::lifetime::LifetimeMap;
use crate::peephole;
use crate::regalloc;
use crate::target::{self, Target};
use log::{debug, info};
use mjc_common::{CompilerConfig, CompilerError, ErrorReporter};
use mjc_ir::{IrFragment, IrProgram};

pub struct Backend {
    target: Box<dyn Target>,
    config: CompilerConfig,
}

impl Backend {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            target: target::for_arch(config.arch),
            config,
        }
    }

    pub fn target(&self) -> &dyn Target {
        self.target.as_ref()
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Select instructions for every fragment. Fragments that fail are
    /// reported and left out.
    pub fn codegen(&self, program: IrProgram, reporter: &mut ErrorReporter) -> Vec<CodeFragment> {
        reporter.begin_phase("CodeGen");

        let mut fragments = Vec::with_capacity(program.fragments.len());
        for ir in program.fragments {
            let name = ir.name();
            match self.select(ir) {
                Ok(fragment) => {
                    debug!("Selected {} instructions for {}", fragment.code.len(), name);
                    fragments.push(fragment);
                }
                Err(err) => {
                    reporter.report(&err);
                }
            }
        }
        fragments
    }

    fn select(&self, ir: IrFragment) -> Result<CodeFragment, CompilerError> {
        let name = ir.name();
        self.target
            .select(ir, self.config.procedure_frames)
            .map_err(|err| CompilerError::selection(name, err.to_string()))
    }

    /// Compute lifetimes and, if the optimization level asks for it, run the
    /// peephole optimizer to fixpoint
    pub fn optimize(&self, fragments: &mut [CodeFragment], reporter: &mut ErrorReporter) {
        reporter.begin_phase("Optimize");

        for fragment in fragments.iter_mut() {
            fragment.update_lifetimes();
            if self.config.verbose {
                fragment.lifetimes.dump(&fragment.code, &fragment.temps);
            }

            if self.config.opt_level.runs_peephole() {
                let before = fragment.operation_count();
                let passes = peephole::optimize(self.target(), fragment);
                debug!(
                    "{}: {} -> {} operations in {} pass(es)",
                    fragment.name(),
                    before,
                    fragment.operation_count(),
                    passes
                );
            }

            fragment.lifetimes = LifetimeMap::analyze(&fragment.code, &fragment.temps);
        }
    }

    /// Assign machine registers. Running out is a warning; the fragment
    /// keeps whatever was assigned.
    pub fn allocate(&self, fragments: &mut [CodeFragment], reporter: &mut ErrorReporter) {
        reporter.begin_phase("RegAlloc");

        for fragment in fragments.iter_mut() {
            let allocation = regalloc::allocate(fragment, self.target.local_registers());
            if let Some(err) = allocation.exhausted {
                reporter
                    .warning(format!("{}: {}", fragment.name(), err))
                    .add_note("unassigned registers keep their virtual names".to_string());
            }
            fragment.registers = Some(allocation.map);
        }
    }

    /// Run every phase. Returns `None` when selection failed anywhere.
    pub fn run(&self, program: IrProgram, reporter: &mut ErrorReporter) -> Option<Vec<CodeFragment>> {
        info!(
            "Compiling {} fragment(s) for {} at {}",
            program.fragments.len(),
            self.target.name(),
            self.config.opt_level
        );

        let mut fragments = self.codegen(program, reporter);
        if reporter.has_errors() {
            return None;
        }

        self.optimize(&mut fragments, reporter);
        self.allocate(&mut fragments, reporter);
        Some(fragments)
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mjc_common::{OptLevel, Severity};
    use mjc_ir::{BinaryOp, Exp, Stm};
    use pretty_assertions::assert_eq;

    fn config(opt_level: OptLevel) -> CompilerConfig {
        CompilerConfig {
            opt_level,
            procedure_frames: false,
            ..CompilerConfig::default()
        }
    }

    fn add_zero() -> IrFragment {
        IrFragment::new("Test", "addZero").with_body(vec![Stm::mov(
            Exp::temp("%i0"),
            Exp::binop(BinaryOp::Plus, Exp::temp("%i1"), Exp::constant(0)),
        )])
    }

    #[test]
    fn test_selection_error_drops_fragment_and_halts() {
        let bad = IrFragment::new("Test", "bad")
            .with_body(vec![Stm::mov(Exp::constant(1), Exp::constant(2))]);
        let program = IrProgram::new(vec![bad, add_zero()]);

        let backend = Backend::new(config(OptLevel::O1));
        let mut reporter = ErrorReporter::new();

        // Both fragments are attempted
        let selected = backend.codegen(program.clone(), &mut reporter);
        assert_eq!(selected.len(), 1);
        assert_eq!(reporter.error_count(), 1);
        let diagnostic = &reporter.diagnostics()[0];
        assert_eq!(diagnostic.phase.as_deref(), Some("CodeGen"));
        assert!(diagnostic.message.contains("Test$bad"));

        let mut reporter = ErrorReporter::new();
        assert!(backend.run(program, &mut reporter).is_none());
    }

    #[test]
    fn test_o0_keeps_selected_code() {
        let program = IrProgram::new(vec![add_zero()]);
        let mut reporter = ErrorReporter::new();

        let unoptimized = Backend::new(config(OptLevel::O0))
            .run(program.clone(), &mut reporter)
            .unwrap();
        let optimized = Backend::new(config(OptLevel::O1))
            .run(program, &mut reporter)
            .unwrap();

        assert_eq!(unoptimized[0].operation_count(), 3);
        assert_eq!(optimized[0].operation_count(), 1);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn test_exhaustion_is_a_warning() {
        // Nine values live at once, one more than there are %l registers
        let body: Vec<Stm> = (0..9)
            .map(|i| Stm::mov(Exp::temp(format!("v{}", i)), Exp::temp("%i1")))
            .chain(std::iter::once(Stm::eval(Exp::call(
                "sink",
                (0..6).map(|i| Exp::temp(format!("v{}", i))).collect(),
            ))))
            .chain((6..9).map(|i| Stm::mov(Exp::temp("%i0"), Exp::temp(format!("v{}", i)))))
            .collect();
        let program = IrProgram::new(vec![IrFragment::new("Test", "pressure").with_body(body)]);

        let mut reporter = ErrorReporter::new();
        let fragments = Backend::new(config(OptLevel::O0)).run(program, &mut reporter).unwrap();

        assert!(!reporter.has_errors());
        assert_eq!(reporter.warning_count(), 1);
        assert_eq!(reporter.diagnostics()[0].severity, Severity::Warning);
        assert_eq!(reporter.diagnostics()[0].phase.as_deref(), Some("RegAlloc"));

        let registers = fragments[0].registers.as_ref().unwrap();
        assert_eq!(registers.len(), 8);
    }

    #[test]
    fn test_registers_rendered_after_allocation() {
        let body = vec![
            Stm::mov(Exp::temp("x"), Exp::temp("%i1")),
            Stm::mov(Exp::temp("%i0"), Exp::binop(BinaryOp::Mul, Exp::temp("x"), Exp::temp("x"))),
        ];
        let program = IrProgram::new(vec![IrFragment::new("Test", "square").with_body(body)]);

        let mut reporter = ErrorReporter::new();
        let fragments = Backend::new(config(OptLevel::O1)).run(program, &mut reporter).unwrap();

        let text = fragments[0].to_string();
        assert!(text.contains("mov %i1, %l0"), "{}", text);
        assert!(text.contains("smul %l0, %l0, %i0"), "{}", text);
    }
}
