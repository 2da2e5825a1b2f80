//! Assembly Instruction Model
//!
//! Instructions are kept in a target-neutral form: an assembly template with
//! operand slots (`` `s0`` for the first use, `` `d0`` for the first
//! definition, `` `j0`` for the first jump target) plus the operand lists
//! that fill those slots. The optimizer and the register allocator only look
//! at the operand lists; the text is produced at the very end.

use crate::regalloc::RegisterMap;
use mjc_ir::{Label, Temp};
use std::fmt;
use std::slice;

/// A value slot in an instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Register, virtual or physical
    Temp(Temp),
    /// Literal integer
    Imm(i64),
    /// Symbolic address
    Name(Label),
}

impl Operand {
    pub fn as_temp(&self) -> Option<&Temp> {
        match self {
            Operand::Temp(temp) => Some(temp),
            _ => None,
        }
    }

    pub fn as_imm(&self) -> Option<i64> {
        match self {
            Operand::Imm(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_temp(&self, temp: &Temp) -> bool {
        self.as_temp() == Some(temp)
    }

    fn render(&self, map: Option<&RegisterMap>) -> String {
        match (self, map) {
            (Operand::Temp(temp), Some(map)) => map.resolve(temp).to_string(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(temp) => write!(f, "{}", temp),
            Operand::Imm(value) => write!(f, "{}", value),
            Operand::Name(label) => write!(f, "{}", label),
        }
    }
}

impl From<Temp> for Operand {
    fn from(temp: Temp) -> Self {
        Operand::Temp(temp)
    }
}

impl From<&Temp> for Operand {
    fn from(temp: &Temp) -> Self {
        Operand::Temp(temp.clone())
    }
}

/// Selected machine instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Any operation: arithmetic, memory access, branch, call
    Oper {
        assem: String,
        defs: Vec<Operand>,
        uses: Vec<Operand>,
        jumps: Vec<Label>,
        annotation: Option<String>,
    },

    /// Register-to-register copy
    Move {
        assem: String,
        dst: Operand,
        src: Operand,
        annotation: Option<String>,
    },

    /// Jump target marker
    Label(Label),

    /// Assembly comment line
    Comment(String),
}

impl Instruction {
    pub fn new_oper(assem: impl Into<String>, defs: Vec<Operand>, uses: Vec<Operand>) -> Self {
        Instruction::Oper {
            assem: assem.into(),
            defs,
            uses,
            jumps: Vec::new(),
            annotation: None,
        }
    }

    pub fn new_move(assem: impl Into<String>, dst: Operand, src: Operand) -> Self {
        Instruction::Move {
            assem: assem.into(),
            dst,
            src,
            annotation: None,
        }
    }

    /// Attach jump targets (no effect on non-operations)
    pub fn with_jumps(mut self, targets: Vec<Label>) -> Self {
        if let Instruction::Oper { jumps, .. } = &mut self {
            *jumps = targets;
        }
        self
    }

    /// Attach a human-readable annotation (no effect on labels/comments)
    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        if let Some(annotation) = self.annotation_mut() {
            *annotation = Some(text.into());
        }
        self
    }

    pub fn defs(&self) -> &[Operand] {
        match self {
            Instruction::Oper { defs, .. } => defs,
            Instruction::Move { dst, .. } => slice::from_ref(dst),
            Instruction::Label(_) | Instruction::Comment(_) => &[],
        }
    }

    pub fn uses(&self) -> &[Operand] {
        match self {
            Instruction::Oper { uses, .. } => uses,
            Instruction::Move { src, .. } => slice::from_ref(src),
            Instruction::Label(_) | Instruction::Comment(_) => &[],
        }
    }

    pub fn jumps(&self) -> &[Label] {
        match self {
            Instruction::Oper { jumps, .. } => jumps,
            _ => &[],
        }
    }

    pub fn defs_mut(&mut self) -> &mut [Operand] {
        match self {
            Instruction::Oper { defs, .. } => defs,
            Instruction::Move { dst, .. } => slice::from_mut(dst),
            Instruction::Label(_) | Instruction::Comment(_) => &mut [],
        }
    }

    pub fn uses_mut(&mut self) -> &mut [Operand] {
        match self {
            Instruction::Oper { uses, .. } => uses,
            Instruction::Move { src, .. } => slice::from_mut(src),
            Instruction::Label(_) | Instruction::Comment(_) => &mut [],
        }
    }

    /// Registers this instruction writes
    pub fn def_temps(&self) -> impl Iterator<Item = &Temp> {
        self.defs().iter().filter_map(Operand::as_temp)
    }

    /// Registers this instruction reads
    pub fn use_temps(&self) -> impl Iterator<Item = &Temp> {
        self.uses().iter().filter_map(Operand::as_temp)
    }

    pub fn defines(&self, temp: &Temp) -> bool {
        self.def_temps().any(|t| t == temp)
    }

    pub fn uses_temp(&self, temp: &Temp) -> bool {
        self.use_temps().any(|t| t == temp)
    }

    /// How many source slots hold `temp`
    pub fn use_count(&self, temp: &Temp) -> usize {
        self.use_temps().filter(|t| *t == temp).count()
    }

    pub fn assem(&self) -> Option<&str> {
        match self {
            Instruction::Oper { assem, .. } | Instruction::Move { assem, .. } => Some(assem.as_str()),
            Instruction::Label(_) | Instruction::Comment(_) => None,
        }
    }

    /// Mnemonic: the first word of the template (`add`, `ld`, `ba`, ...)
    pub fn opcode(&self) -> Option<&str> {
        self.assem().and_then(|assem| assem.split_whitespace().next())
    }

    pub fn annotation(&self) -> Option<&str> {
        match self {
            Instruction::Oper { annotation, .. } | Instruction::Move { annotation, .. } => {
                annotation.as_deref()
            }
            Instruction::Label(_) | Instruction::Comment(_) => None,
        }
    }

    fn annotation_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Instruction::Oper { annotation, .. } | Instruction::Move { annotation, .. } => {
                Some(annotation)
            }
            Instruction::Label(_) | Instruction::Comment(_) => None,
        }
    }

    /// Rewrite operand text inside the annotation after an operand changed
    pub fn rename_in_annotation(&mut self, old: &str, new: &str) {
        if let Some(Some(text)) = self.annotation_mut() {
            *text = text.replace(old, new);
        }
    }

    /// Replace every source slot holding `old` with `new`. Returns the number
    /// of slots rewritten.
    pub fn replace_use(&mut self, old: &Temp, new: &Operand) -> usize {
        let mut replaced = 0;
        for slot in self.uses_mut() {
            if slot.is_temp(old) {
                *slot = new.clone();
                replaced += 1;
            }
        }
        if replaced > 0 {
            self.rename_in_annotation(old.name(), &new.to_string());
        }
        replaced
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instruction::Label(_))
    }

    pub fn label(&self) -> Option<&Label> {
        match self {
            Instruction::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Labels and comments carry no operation
    pub fn is_marker(&self) -> bool {
        matches!(self, Instruction::Label(_) | Instruction::Comment(_))
    }

    /// Render the instruction, substituting assigned registers when a map is
    /// given. Labels come out as `name:` and comments as `! text`.
    pub fn format(&self, map: Option<&RegisterMap>) -> String {
        match self {
            Instruction::Label(label) => format!("{}:", label),
            Instruction::Comment(text) => format!("! {}", text),
            Instruction::Oper { assem, annotation, .. }
            | Instruction::Move { assem, annotation, .. } => {
                let text = self.fill_slots(assem, map);
                match annotation {
                    Some(note) => format!("{} ! {}", text, note),
                    None => text,
                }
            }
        }
    }

    fn fill_slots(&self, assem: &str, map: Option<&RegisterMap>) -> String {
        let mut out = String::with_capacity(assem.len() + 8);
        let mut chars = assem.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '`' {
                out.push(c);
                continue;
            }

            let kind = match chars.peek() {
                Some(&k) if matches!(k, 's' | 'd' | 'j') => k,
                _ => {
                    out.push(c);
                    continue;
                }
            };
            chars.next();

            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }

            let slot = digits.parse::<usize>().ok();
            let text = match (kind, slot) {
                ('s', Some(n)) => self.uses().get(n).map(|op| op.render(map)),
                ('d', Some(n)) => self.defs().get(n).map(|op| op.render(map)),
                ('j', Some(n)) => self.jumps().get(n).map(|label| label.to_string()),
                _ => None,
            };
            match text {
                Some(text) => out.push_str(&text),
                None => {
                    out.push('`');
                    out.push(kind);
                    out.push_str(&digits);
                }
            }
        }

        out
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp(name: &str) -> Operand {
        Operand::Temp(Temp::new(name))
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(format!("{}", temp("%o0")), "%o0");
        assert_eq!(format!("{}", Operand::Imm(-4)), "-4");
        assert_eq!(format!("{}", Operand::Name(Label::new("exit"))), "exit");
    }

    #[test]
    fn test_instruction_display() {
        let add = Instruction::new_oper(
            "add `s0, `s1, `d0",
            vec![temp("t0002")],
            vec![temp("t0000"), Operand::Imm(4)],
        )
        .with_annotation("(t0000 + 4) -> t0002");
        assert_eq!(format!("{}", add), "add t0000, 4, t0002 ! (t0000 + 4) -> t0002");

        let branch = Instruction::new_oper("bl `j0", vec![], vec![])
            .with_jumps(vec![Label::new("if$then0000")]);
        assert_eq!(format!("{}", branch), "bl if$then0000");

        assert_eq!(format!("{}", Instruction::Label(Label::new("main"))), "main:");
        assert_eq!(format!("{}", Instruction::Comment("Hello world".to_string())), "! Hello world");
    }

    #[test]
    fn test_missing_slot_is_left_visible() {
        let bad = Instruction::new_oper("st `s0, [`d0]", vec![], vec![temp("t0000")]);
        assert_eq!(bad.format(None), "st t0000, [`d0]");
    }

    #[test]
    fn test_defs_and_uses() {
        let mov = Instruction::new_move("mov `s0, `d0", temp("t0001"), temp("%i1"));
        assert_eq!(mov.defs(), &[temp("t0001")]);
        assert_eq!(mov.uses(), &[temp("%i1")]);
        assert!(mov.defines(&Temp::new("t0001")));
        assert!(mov.uses_temp(&Temp::new("%i1")));
        assert_eq!(mov.opcode(), Some("mov"));

        let label = Instruction::Label(Label::new("done"));
        assert!(label.defs().is_empty());
        assert!(label.uses().is_empty());
        assert_eq!(label.opcode(), None);
    }

    #[test]
    fn test_replace_use_rewrites_annotation() {
        let mut smul = Instruction::new_oper(
            "smul `s0, `s1, `d0",
            vec![temp("t0003")],
            vec![temp("t0001"), temp("t0002")],
        )
        .with_annotation("(t0001 * t0002) -> t0003");

        let replaced = smul.replace_use(&Temp::new("t0002"), &temp("%o0"));
        assert_eq!(replaced, 1);
        assert_eq!(smul.format(None), "smul t0001, %o0, t0003 ! (t0001 * %o0) -> t0003");
    }

    #[test]
    fn test_format_with_register_map() {
        let mut map = RegisterMap::new();
        map.insert(Temp::new("t0000"), Temp::new("%l0"));

        let mov = Instruction::new_move("mov `s0, `d0", temp("t0000"), temp("%i1"));
        assert_eq!(mov.format(Some(&map)), "mov %i1, %l0");

        // Unassigned registers keep their virtual names
        let set = Instruction::new_oper("set `s0, `d0", vec![temp("t0009")], vec![Operand::Imm(7)]);
        assert_eq!(set.format(Some(&map)), "set 7, t0009");
    }
}
