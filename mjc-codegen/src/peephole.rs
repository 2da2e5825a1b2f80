//! Peephole Optimization
//!
//! A pass walks the instruction list once and tries, at every operation, an
//! opcode-specific rewrite and then the generic "merge the following move"
//! rewrite. Every rule only looks at the instruction and its immediate
//! neighbours, and only fires when the lifetime of the register it removes
//! ends right there. Lifetimes are recomputed after every edit so the next
//! decision sees the current text.
//!
//! A rule that finds operands of the wrong shape simply does not apply.

use crate::asm::{Instruction, Operand};
use crate::fragment::CodeFragment;
use crate::target::{access_register, OffsetSign, OpKind, Target};
use log::debug;
use mjc_ir::Temp;

/// Run one pass over `fragment`. Returns true if anything changed.
pub fn optimize_pass<T: Target + ?Sized>(target: &T, fragment: &mut CodeFragment) -> bool {
    let mut changed = false;
    fragment.update_lifetimes();

    let mut i = 0;
    while i < fragment.code.len() {
        if fragment.code[i].is_marker() {
            i += 1;
            continue;
        }

        let mut rewrite = try_opcode_rule(target, fragment, i);
        if rewrite.is_none() {
            rewrite = merge_following_move(target, fragment, i);
        }

        match rewrite {
            Some(deleted) => {
                changed = true;
                fragment.update_lifetimes();
                i = (i + 1).saturating_sub(deleted);
            }
            None => i += 1,
        }
    }

    changed
}

/// Repeat passes until one changes nothing. Returns the number of passes
/// that made changes.
pub fn optimize<T: Target + ?Sized>(target: &T, fragment: &mut CodeFragment) -> usize {
    let mut passes = 0;
    while target.optimize_pass(fragment) {
        passes += 1;
    }
    passes
}

/// Result of a rule: `Some(n)` when it fired, deleting `n` instructions
type Rewrite = Option<usize>;

fn try_opcode_rule<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    match target.classify(&frag.code[i]) {
        OpKind::Add => simplify_add(target, frag, i).or_else(|| fold_address(target, frag, i, OffsetSign::Plus)),
        OpKind::Sub => simplify_sub(target, frag, i).or_else(|| fold_address(target, frag, i, OffsetSign::Minus)),
        OpKind::Jump => remove_fallthrough_jump(target, frag, i),
        OpKind::Call => forward_call_result(target, frag, i),
        OpKind::LoadImmediate => fold_immediate(target, frag, i),
        OpKind::Move => remove_self_move(frag, i),
        _ => None,
    }
}

/// `op a, b, d` with a register destination and two sources
fn binary_parts(insn: &Instruction) -> Option<(Temp, Operand, Operand)> {
    match (insn.defs(), insn.uses()) {
        ([Operand::Temp(dst)], [left, right]) => Some((dst.clone(), left.clone(), right.clone())),
        _ => None,
    }
}

/// Replace `dst = src` arithmetic with a plain move
fn replace_with_move<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize, src: Operand, dst: Temp) {
    let annotation = format!("{} -> {}", src, dst);
    frag.code[i] = target.move_register(src, Operand::Temp(dst)).with_annotation(annotation);
}

/// add x, 0, d  =>  mov x, d
fn simplify_add<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    let (dst, left, right) = binary_parts(&frag.code[i])?;
    let keep = if left.as_imm() == Some(0) {
        right
    } else if right.as_imm() == Some(0) {
        left
    } else {
        return None;
    };

    debug!("Replacing ADD of zero with MOV: {}", frag.code[i]);
    replace_with_move(target, frag, i, keep, dst);
    Some(0)
}

/// sub x, 0, d  =>  mov x, d
fn simplify_sub<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    let (dst, left, right) = binary_parts(&frag.code[i])?;
    if right.as_imm() != Some(0) {
        return None;
    }

    debug!("Replacing SUB of zero with MOV: {}", frag.code[i]);
    replace_with_move(target, frag, i, left, dst);
    Some(0)
}

/// add a, b, t; ld [t], x   =>  ld [a+b], x
/// sub a, imm, t; st x, [t] =>  st x, [a-imm]
fn fold_address<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize, sign: OffsetSign) -> Rewrite {
    let (dst, base, offset) = binary_parts(&frag.code[i])?;
    if base.as_temp().is_none() {
        return None;
    }
    if sign == OffsetSign::Minus && offset.as_imm().is_none() {
        return None;
    }
    if !frag.lifetimes.ends_at(&dst, i + 1) {
        return None;
    }

    let next = frag.code.get(i + 1)?;
    let merged = format!("{} {} {}", base, sign.symbol(), offset);
    let folded = match (target.classify(next), next.defs(), next.uses()) {
        (OpKind::Load, [value], [addr]) if addr.is_temp(&dst) => {
            target.offset_load(base, offset, sign, value.clone())
        }
        (OpKind::Store, [addr], [value]) if addr.is_temp(&dst) => {
            target.offset_store(value.clone(), base, offset, sign)
        }
        _ => return None,
    };
    let folded = match next.annotation() {
        Some(note) => folded.with_annotation(note.replace(dst.name(), &merged)),
        None => folded,
    };

    debug!("Folding address arithmetic into {}: {}", folded, frag.code[i]);
    frag.code[i + 1] = folded;
    frag.code.remove(i);
    Some(1)
}

/// Drop `ba L` (and its delay-slot fillers) when `L` follows right after
fn remove_fallthrough_jump<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    let destination = frag.code[i].jumps().first()?.clone();

    let mut j = i + 1;
    while j < frag.code.len() && target.classify(&frag.code[j]) == OpKind::Nop {
        j += 1;
    }
    let skipped_to = j;

    while let Some(label) = frag.code.get(j).and_then(Instruction::label) {
        if *label == destination {
            debug!("Removing branch to {} (label follows immediately): {}", label, frag.code[i]);
            frag.code.drain(i..skipped_to);
            return Some(skipped_to - i);
        }
        j += 1;
    }

    None
}

/// call f; mov %o0, t; op .., t, ..  =>  call f; op .., %o0, ..
fn forward_call_result<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    let mut j = i + 1;
    while j < frag.code.len() && target.classify(&frag.code[j]) == OpKind::Nop {
        j += 1;
    }

    let copy = frag.code.get(j)?;
    if target.classify(copy) != OpKind::Move {
        return None;
    }

    let result = access_register(&target.return_access_as_caller())?.clone();
    let dst = match (copy.defs(), copy.uses()) {
        ([Operand::Temp(dst)], [src]) if src.is_temp(&result) => dst.clone(),
        _ => return None,
    };
    if !frag.lifetimes.ends_at(&dst, j + 1) {
        return None;
    }
    if !frag.code.get(j + 1)?.uses_temp(&dst) {
        return None;
    }

    debug!("Using {} in place of its copy {}: {}", result, dst, frag.code[j + 1]);
    frag.code[j + 1].replace_use(&dst, &Operand::Temp(result));
    frag.code.remove(j);
    Some(1)
}

/// set imm, t; add a, t, d  =>  add a, imm, d
fn fold_immediate<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    let (dst, value) = match (frag.code[i].defs(), frag.code[i].uses()) {
        ([Operand::Temp(dst)], [Operand::Imm(value)]) => (dst.clone(), *value),
        _ => return None,
    };
    if !target.immediate_fits(value) || !frag.lifetimes.ends_at(&dst, i + 1) {
        return None;
    }

    let next = frag.code.get(i + 1)?;
    let kind = target.classify(next);
    if !target.accepts_immediate(kind) || next.use_count(&dst) != 1 {
        return None;
    }

    let mut uses = next.uses().to_vec();
    let slot = uses.iter().position(|op| op.is_temp(&dst))?;
    let last = uses.len() - 1;
    if slot == last {
        uses[last] = Operand::Imm(value);
    } else if kind.operator().is_some_and(|op| op.is_commutative()) && uses.len() == 2 {
        // The immediate has to sit in the last slot
        uses.swap(0, 1);
        uses[last] = Operand::Imm(value);
    } else {
        return None;
    }
    if uses[..last].iter().any(|op| op.as_imm().is_some()) {
        return None;
    }

    debug!("Folding {} into the next instruction as an immediate: {}", value, frag.code[i]);
    let next = &mut frag.code[i + 1];
    next.uses_mut().clone_from_slice(&uses);
    next.rename_in_annotation(dst.name(), &value.to_string());
    frag.code.remove(i);
    Some(1)
}

/// mov x, x  =>  (nothing)
fn remove_self_move(frag: &mut CodeFragment, i: usize) -> Rewrite {
    let insn = &frag.code[i];
    match (insn.defs(), insn.uses()) {
        ([dst], [src]) if dst == src => {
            debug!("Removing no-op MOV: {}", insn);
            frag.code.remove(i);
            Some(1)
        }
        _ => None,
    }
}

/// op .., t; mov t, x  =>  op .., x
fn merge_following_move<T: Target + ?Sized>(target: &T, frag: &mut CodeFragment, i: usize) -> Rewrite {
    let insn = &frag.code[i];
    // A store's "definitions" are its address registers
    if target.classify(insn) == OpKind::Store || insn.uses().is_empty() {
        return None;
    }
    let dst = insn.defs().first()?.as_temp()?.clone();
    if !frag.lifetimes.ends_at(&dst, i + 1) {
        return None;
    }

    let next = frag.code.get(i + 1)?;
    if target.classify(next) != OpKind::Move || !next.uses_temp(&dst) {
        return None;
    }
    let retarget = next.defs().first()?.clone();

    debug!("Merging {} into {}", next, insn);
    let insn = &mut frag.code[i];
    insn.defs_mut()[0] = retarget.clone();
    insn.rename_in_annotation(dst.name(), &retarget.to_string());
    frag.code.remove(i + 1);
    Some(1)
}
