use std::rc::Rc;

use gvsim_csr::event;

use crate::insn::{Handler, HandlerOutcome};
use crate::operands::Operands;
use crate::CpuContext;

fn reg_or_zero(ctx: &dyn CpuContext, idx: u8) -> u32 {
    if idx == 0 {
        0
    } else {
        ctx.reg(idx)
    }
}

fn set_reg(ctx: &mut dyn CpuContext, idx: u8, value: u32) {
    if idx != 0 {
        ctx.set_reg(idx, value);
    }
}

/// Builds the `(fast, detailed)` handler pair for one opcode kind. The
/// detailed variant is always the fast variant's body plus whatever
/// per-kind performance-counter accounting that opcode contributes (spec
/// §4.5: "the first `NB_INTERNAL_EVENTS` are maintained by the core");
/// `switch_to_fast()` is what decides which one the dispatch loop picks.
pub fn build(tag: u8, operands: Operands) -> (&'static str, Handler, Handler, bool, Option<u8>) {
    match tag {
        crate::tag::ADDI => {
            let ops = operands;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                let v = reg_or_zero(ctx, ops.rs1).wrapping_add(ops.imm as u32);
                set_reg(ctx, ops.rd, v);
                HandlerOutcome::Next(pc + 4)
            });
            let detailed = fast.clone();
            ("addi", fast, detailed, false, None)
        }
        crate::tag::ADD => {
            let ops = operands;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                let v = reg_or_zero(ctx, ops.rs1).wrapping_add(reg_or_zero(ctx, ops.rs2));
                set_reg(ctx, ops.rd, v);
                HandlerOutcome::Next(pc + 4)
            });
            let detailed = fast.clone();
            ("add", fast, detailed, false, None)
        }
        crate::tag::LW => {
            let ops = operands;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                let addr = reg_or_zero(ctx, ops.rs1).wrapping_add(ops.imm as u32);
                let v = ctx.load_word(addr);
                set_reg(ctx, ops.rd, v);
                HandlerOutcome::Next(pc + 4)
            });
            let detailed: Handler = Rc::new(move |ctx, pc, _| {
                let addr = reg_or_zero(ctx, ops.rs1).wrapping_add(ops.imm as u32);
                let v = ctx.load_word(addr);
                set_reg(ctx, ops.rd, v);
                ctx.account_event(event::LD, 1);
                HandlerOutcome::Next(pc + 4)
            });
            ("lw", fast, detailed, true, Some(ops.rd))
        }
        crate::tag::SW => {
            let ops = operands;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                let addr = reg_or_zero(ctx, ops.rs1).wrapping_add(ops.imm as u32);
                let v = reg_or_zero(ctx, ops.rs2);
                ctx.store_word(addr, v);
                HandlerOutcome::Next(pc + 4)
            });
            let detailed = fast.clone();
            ("sw", fast, detailed, false, None)
        }
        crate::tag::BEQ => {
            let ops = operands;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                let taken = reg_or_zero(ctx, ops.rs1) == reg_or_zero(ctx, ops.rs2);
                let next = if taken {
                    pc.wrapping_add(ops.imm as i64 as u64)
                } else {
                    pc + 4
                };
                HandlerOutcome::Next(next)
            });
            let detailed: Handler = Rc::new(move |ctx, pc, _| {
                let taken = reg_or_zero(ctx, ops.rs1) == reg_or_zero(ctx, ops.rs2);
                let next = if taken {
                    ctx.account_event(event::WBRANCH, 1);
                    ctx.account_event(event::WBRANCH_CYCLES, 2);
                    pc.wrapping_add(ops.imm as i64 as u64)
                } else {
                    pc + 4
                };
                HandlerOutcome::Next(next)
            });
            ("beq", fast, detailed, false, None)
        }
        crate::tag::JAL => {
            let ops = operands;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                set_reg(ctx, ops.rd, (pc + 4) as u32);
                HandlerOutcome::Next(pc.wrapping_add(ops.imm as i64 as u64))
            });
            let detailed: Handler = Rc::new(move |ctx, pc, _| {
                set_reg(ctx, ops.rd, (pc + 4) as u32);
                ctx.account_event(event::WBRANCH, 1);
                ctx.account_event(event::WBRANCH_CYCLES, 2);
                HandlerOutcome::Next(pc.wrapping_add(ops.imm as i64 as u64))
            });
            ("jal", fast, detailed, false, None)
        }
        crate::tag::ECALL => {
            let fast: Handler = Rc::new(|ctx, pc, _| {
                let a7 = reg_or_zero(ctx, 17);
                let args = [reg_or_zero(ctx, 10), reg_or_zero(ctx, 11), reg_or_zero(ctx, 12)];
                if a7 == EXIT_SYSCALL {
                    return HandlerOutcome::Exit(args[0] as i32);
                }
                let result = ctx.syscall(a7, args);
                set_reg(ctx, 10, result);
                HandlerOutcome::Next(pc + 4)
            });
            let detailed = fast.clone();
            ("ecall", fast, detailed, false, None)
        }
        crate::tag::CSRRW => {
            let ops = operands;
            let csr_addr = ops.imm as u32;
            let fast: Handler = Rc::new(move |ctx, pc, _| {
                let old = ctx.csr_read(csr_addr);
                match old {
                    Some(old) => {
                        ctx.csr_write(csr_addr, reg_or_zero(ctx, ops.rs1));
                        set_reg(ctx, ops.rd, old);
                        HandlerOutcome::Next(pc + 4)
                    }
                    None => {
                        ctx.trap_illegal();
                        HandlerOutcome::Trap {
                            cause: ILLEGAL_INSTRUCTION_CAUSE,
                            next_pc: pc,
                        }
                    }
                }
            });
            let detailed = fast.clone();
            ("csrrw", fast, detailed, false, None)
        }
        _ => {
            let illegal: Handler = Rc::new(|ctx, pc, _| {
                ctx.trap_illegal();
                HandlerOutcome::Trap {
                    cause: ILLEGAL_INSTRUCTION_CAUSE,
                    next_pc: pc,
                }
            });
            ("illegal", illegal.clone(), illegal, false, None)
        }
    }
}

/// `a7` value the `ECALL` handler treats as "terminate the guest program",
/// matching the RISC-V Linux-ABI convention of syscall 93 (`exit`).
pub const EXIT_SYSCALL: u32 = 93;

/// Synthetic trap cause for an undecodable opcode (mirrors RISC-V's
/// `mcause` value for "illegal instruction").
pub const ILLEGAL_INSTRUCTION_CAUSE: u32 = 2;
