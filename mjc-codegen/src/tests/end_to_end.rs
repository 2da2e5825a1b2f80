//! Whole-pipeline tests: IR in, assembly text out

use crate::emit::{emit_fragment, emit_program};
use crate::pipeline::Backend;
use crate::samples::sample;
use crate::CodeFragment;
use mjc_common::{CompilerConfig, ErrorReporter, OptLevel};
use mjc_ir::{Exp, IrFragment, IrProgram, Stm};
use pretty_assertions::assert_eq;

fn compile(program: IrProgram, config: CompilerConfig) -> Vec<CodeFragment> {
    let mut reporter = ErrorReporter::new();
    let fragments = Backend::new(config).run(program, &mut reporter);
    assert!(!reporter.has_errors(), "{}", reporter.summary());
    fragments.unwrap()
}

fn frameless() -> CompilerConfig {
    CompilerConfig {
        procedure_frames: false,
        ..CompilerConfig::default()
    }
}

/// Instruction text of every line, annotations stripped
fn operations(fragment: &CodeFragment) -> Vec<String> {
    emit_fragment(fragment)
        .lines()
        .filter(|line| line.starts_with("    "))
        .map(|line| line.trim().split(" ! ").next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_add_zero_becomes_one_move() {
    let fragments = compile(sample("add-zero").unwrap(), frameless());

    assert_eq!(
        emit_fragment(&fragments[0]),
        "! Procedure fragment for Test$addZero\n    \
         mov %i1, %i0 ! %i1 -> %i0\n\
         ! End fragment for Test$addZero\n"
    );
}

#[test]
fn test_add_zero_unoptimized_keeps_three_operations() {
    let config = CompilerConfig {
        opt_level: OptLevel::O0,
        ..frameless()
    };
    let fragments = compile(sample("add-zero").unwrap(), config);

    assert_eq!(
        operations(&fragments[0]),
        vec!["set 0, %l0", "add %i1, %l0, %l1", "mov %l1, %i0"]
    );
}

#[test]
fn test_discarded_call_has_no_result_copy() {
    let fragments = compile(sample("discard-call").unwrap(), CompilerConfig::default());
    let text = emit_fragment(&fragments[0]);

    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "! Procedure fragment for Test$main",
            "Test$main:",
            "    ! Main function does not have a stack frame.",
            "    ! As a result, the prologue is empty.",
            "    set 42, %o0 ! 42 -> %o0",
            "    call printInt",
            "    nop ! (do nothing in delay slot)",
            "Test$main$epilogueBegin:",
            "    clr %o0",
            "    call exit",
            "    nop ! (do nothing in delay slot)",
            "! End fragment for Test$main",
        ]
    );
}

#[test]
fn test_call_in_second_argument_keeps_first_argument() {
    // f(a, g(b)) with a in %i1 and b in %i2
    let body = vec![Stm::mov(
        Exp::temp("%i0"),
        Exp::call("f", vec![Exp::temp("%i1"), Exp::call("g", vec![Exp::temp("%i2")])]),
    )];
    let program = IrProgram::new(vec![IrFragment::new("Test", "nested").with_body(body)]);
    let fragments = compile(program, frameless());

    assert_eq!(
        operations(&fragments[0]),
        vec![
            "mov %i2, %o0",
            "call g",
            "nop",
            "mov %o0, %l0",
            "mov %i1, %o0",
            "mov %l0, %o1",
            "call f",
            "nop",
            "mov %o0, %i0",
        ]
    );
}

#[test]
fn test_stack_local_uses_frame_offsets() {
    let fragments = compile(sample("locals").unwrap(), CompilerConfig::default());

    assert_eq!(
        operations(&fragments[0]),
        vec![
            "save %sp, -96, %sp",
            "st %i1, [%fp-4]",
            "ld [%fp-4], %i0",
            "ret",
            "restore",
        ]
    );
}

#[test]
fn test_factorial_is_fully_allocated() {
    let fragments = compile(sample("factorial").unwrap(), CompilerConfig::default());
    assert_eq!(fragments.len(), 2);

    let compute = &fragments[1];
    assert_eq!(compute.name(), "Fac$ComputeFac");
    let ops = operations(compute);
    assert_eq!(ops[0], "save %sp, -96, %sp");
    assert!(ops.contains(&"call Fac$ComputeFac".to_string()));
    assert!(ops.contains(&"bl if$then0000".to_string()));

    // Every virtual register got a machine register
    for op in ops.iter().chain(operations(&fragments[0]).iter()) {
        assert!(!op.contains("num_aux") && !op.contains(" t0"), "unallocated: {}", op);
    }
}

#[test]
fn test_program_text_layout() {
    let fragments = compile(sample("factorial").unwrap(), CompilerConfig::default());
    let text = emit_program(&fragments);

    assert!(text.contains("\n.global start\nstart:\n\n! Procedure fragment for Factorial$main\n"));
    assert!(text.contains("! End fragment for Factorial$main\n\n! Procedure fragment for Fac$ComputeFac\n"));
}
