use crate::*;
use mjc_common::CompilerError;
use pretty_assertions::assert_eq;

fn sample_move() -> Stm {
    Stm::mov(
        Exp::temp("t0000"),
        Exp::binop(BinaryOp::Plus, Exp::temp("%i1"), Exp::constant(0)),
    )
}

#[test]
fn test_display_prefix_form() {
    assert_eq!(
        sample_move().to_string(),
        "MOVE(TEMP t0000, BINOP(PLUS, TEMP %i1, CONST 0))"
    );
    assert_eq!(
        Exp::call("print", vec![Exp::mem(Exp::temp("%fp"))]).to_string(),
        "CALL(NAME print, [MEM(TEMP %fp)])"
    );
}

#[test]
fn test_seq_is_right_nested() {
    let seq = Stm::seq(vec![
        Stm::label("a"),
        Stm::label("b"),
        Stm::jump("a"),
    ]);
    assert_eq!(
        seq.map(|s| s.to_string()),
        Some("SEQ(LABEL a, SEQ(LABEL b, JUMP(a)))".to_string())
    );
    assert_eq!(Stm::seq(vec![]), None);
}

#[test]
fn test_collect_temps_in_tree_order() {
    let stm = Stm::cjump(
        RelOp::Lt,
        Exp::mem(Exp::temp("a")),
        Exp::result_of(sample_move(), Exp::temp("t0000")),
        "yes",
        "no",
    );
    let mut temps = Vec::new();
    stm.collect_temps(&mut temps);
    let names: Vec<&str> = temps.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["a", "t0000", "%i1", "t0000"]);
}

#[test]
fn test_program_json_round_trip() {
    let text = r#"{
        "fragments": [{
            "class_name": "Fac",
            "method_name": "ComputeFac",
            "locals": 2,
            "body": [
                { "move": { "dst": { "temp": "t0000" },
                            "src": { "bin_op": { "op": "plus",
                                                 "left": { "temp": "%i1" },
                                                 "right": { "const": 0 } } } } },
                { "jump": "done" }
            ]
        }]
    }"#;

    let program = IrProgram::from_json(text).unwrap();
    let fragment = &program.fragments[0];
    assert_eq!(fragment.name(), "Fac$ComputeFac");
    assert!(!fragment.is_entry);
    assert_eq!(fragment.locals, 2);
    assert_eq!(fragment.body, vec![sample_move(), Stm::jump("done")]);
    assert!(fragment.temps.is_empty());

    let again = IrProgram::from_json(&program.to_json().unwrap()).unwrap();
    assert_eq!(again.fragments[0].body, fragment.body);
}

#[test]
fn test_malformed_program_is_input_error() {
    let err = IrProgram::from_json(r#"{ "fragments": [ { "class_name": 3 } ] }"#).unwrap_err();
    assert!(matches!(err, CompilerError::InputError { .. }));
}

#[test]
fn test_commutative_operators() {
    assert!(BinaryOp::Plus.is_commutative());
    assert!(BinaryOp::Xor.is_commutative());
    assert!(!BinaryOp::Minus.is_commutative());
}
