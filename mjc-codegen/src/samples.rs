//! Built-in IR programs
//!
//! Small hand-lowered MiniJava programs for trying the backend without a
//! front end. Each one mints its labels from a fresh [`LabelManager`].

use mjc_ir::{BinaryOp, Exp, IrFragment, IrProgram, LabelManager, RelOp, Stm};

pub const SAMPLE_NAMES: &[&str] = &["factorial", "add-zero", "discard-call", "locals"];

/// Look up a sample by name
pub fn sample(name: &str) -> Option<IrProgram> {
    let mut labels = LabelManager::new();
    let program = match name {
        "factorial" => factorial(&mut labels),
        "add-zero" => add_zero(),
        "discard-call" => discard_call(),
        "locals" => locals(),
        _ => return None,
    };
    Some(program)
}

/// ```text
/// class Factorial {
///     public static void main(String[] a) {
///         System.out.println(new Fac().ComputeFac(10));
///     }
/// }
/// class Fac {
///     public int ComputeFac(int num) {
///         int num_aux;
///         if (num < 1) num_aux = 1;
///         else num_aux = num * (this.ComputeFac(num - 1));
///         return num_aux;
///     }
/// }
/// ```
fn factorial(labels: &mut LabelManager) -> IrProgram {
    let main = IrFragment::new("Factorial", "main")
        .as_entry()
        .with_body(vec![Stm::eval(Exp::call(
            "printInt",
            vec![Exp::call(
                "Fac$ComputeFac",
                vec![
                    Exp::call("allocateObject", vec![Exp::constant(0)]),
                    Exp::constant(10),
                ],
            )],
        ))]);

    let then_label = labels.create(&["if", "then"]);
    let else_label = labels.create(&["if", "else"]);
    let end_label = labels.create(&["if", "end"]);

    // %i0 is `this`, %i1 is `num`
    let recurse = Exp::call(
        "Fac$ComputeFac",
        vec![
            Exp::temp("%i0"),
            Exp::binop(BinaryOp::Minus, Exp::temp("%i1"), Exp::constant(1)),
        ],
    );
    let compute = IrFragment::new("Fac", "ComputeFac").with_body(vec![
        Stm::cjump(
            RelOp::Lt,
            Exp::temp("%i1"),
            Exp::constant(1),
            then_label.clone(),
            else_label.clone(),
        ),
        Stm::Label(then_label),
        Stm::mov(Exp::temp("num_aux"), Exp::constant(1)),
        Stm::Jump(end_label.clone()),
        Stm::Label(else_label),
        Stm::mov(
            Exp::temp("num_aux"),
            Exp::binop(BinaryOp::Mul, Exp::temp("%i1"), recurse),
        ),
        Stm::Label(end_label),
        Stm::mov(Exp::temp("%i0"), Exp::temp("num_aux")),
    ]);

    IrProgram::new(vec![main, compute])
}

/// `return a + 0;` with `a` in %i1
fn add_zero() -> IrProgram {
    IrProgram::new(vec![IrFragment::new("Test", "addZero").with_body(vec![Stm::mov(
        Exp::temp("%i0"),
        Exp::binop(BinaryOp::Plus, Exp::temp("%i1"), Exp::constant(0)),
    )])])
}

/// `System.out.println(42);` as the whole main method
fn discard_call() -> IrProgram {
    IrProgram::new(vec![IrFragment::new("Test", "main")
        .as_entry()
        .with_body(vec![Stm::eval(Exp::call("printInt", vec![Exp::constant(42)]))])])
}

/// Round trip of a parameter through a stack local
fn locals() -> IrProgram {
    let slot = || Exp::mem(Exp::binop(BinaryOp::Minus, Exp::temp("%fp"), Exp::constant(4)));
    IrProgram::new(vec![IrFragment::new("Test", "spill")
        .with_locals(1)
        .with_body(vec![
            Stm::mov(slot(), Exp::temp("%i1")),
            Stm::mov(Exp::temp("%i0"), slot()),
        ])])
}
