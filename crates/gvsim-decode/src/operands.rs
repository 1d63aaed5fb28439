/// Decoded operand slots, shared by every opcode kind in the stand-in ISA.
///
/// Not every field is meaningful for every opcode (`SW` has no `rd`,
/// `ECALL` uses none of them) — unused slots are simply left at zero,
/// mirroring how a real decoder populates a single fixed-shape operand
/// struct regardless of which fields a given instruction actually reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Operands {
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i32,
}

/// Opcode tags for the stand-in instruction table (spec §1: "these are
/// stand-ins, not a full ISA"). Four bits, so 16 possible tags; only eight
/// are assigned.
pub mod tag {
    pub const ADDI: u8 = 0;
    pub const ADD: u8 = 1;
    pub const LW: u8 = 2;
    pub const SW: u8 = 3;
    pub const BEQ: u8 = 4;
    pub const JAL: u8 = 5;
    pub const ECALL: u8 = 6;
    pub const CSRRW: u8 = 7;
}

/// Every instruction in this stand-in ISA is this many bytes, known without
/// decoding — which is what lets the prefetch buffer classify hit/miss/split
/// purely from `pc`, before any bytes are available.
pub const OPCODE_SIZE: u8 = 4;

/// Bit-packed 32-bit opcode word: `tag:4 | rd:5 | rs1:5 | rs2:5 | imm:13`.
/// Not a real RISC-V encoding — this is the decoder "specified elsewhere"
/// the core's contract only needs a believable stand-in for.
fn sign_extend_13(bits: u32) -> i32 {
    let shifted = (bits << 19) as i32;
    shifted >> 19
}

#[must_use]
pub fn pack(tag: u8, rd: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm13 = (imm as u32) & 0x1FFF;
    (u32::from(tag) << 28) | (u32::from(rd) << 23) | (u32::from(rs1) << 18) | (u32::from(rs2) << 13) | imm13
}

#[must_use]
pub fn unpack(word: u32) -> (u8, Operands) {
    let tag = (word >> 28) as u8 & 0xF;
    let rd = (word >> 23) as u8 & 0x1F;
    let rs1 = (word >> 18) as u8 & 0x1F;
    let rs2 = (word >> 13) as u8 & 0x1F;
    let imm = sign_extend_13(word & 0x1FFF);
    (tag, Operands { rd, rs1, rs2, imm })
}

/// Convenience encoders used by the demo binary and tests to build opcode
/// bytes without hand-packing bit fields.
pub mod encode {
    use super::{pack, tag};

    #[must_use]
    pub fn addi(rd: u8, rs1: u8, imm: i32) -> [u8; 4] {
        pack(tag::ADDI, rd, rs1, 0, imm).to_le_bytes()
    }

    #[must_use]
    pub fn add(rd: u8, rs1: u8, rs2: u8) -> [u8; 4] {
        pack(tag::ADD, rd, rs1, rs2, 0).to_le_bytes()
    }

    #[must_use]
    pub fn lw(rd: u8, rs1: u8, imm: i32) -> [u8; 4] {
        pack(tag::LW, rd, rs1, 0, imm).to_le_bytes()
    }

    #[must_use]
    pub fn sw(rs1: u8, rs2: u8, imm: i32) -> [u8; 4] {
        pack(tag::SW, 0, rs1, rs2, imm).to_le_bytes()
    }

    #[must_use]
    pub fn beq(rs1: u8, rs2: u8, byte_offset: i32) -> [u8; 4] {
        pack(tag::BEQ, 0, rs1, rs2, byte_offset).to_le_bytes()
    }

    #[must_use]
    pub fn jal(rd: u8, byte_offset: i32) -> [u8; 4] {
        pack(tag::JAL, rd, 0, 0, byte_offset).to_le_bytes()
    }

    #[must_use]
    pub fn ecall() -> [u8; 4] {
        pack(tag::ECALL, 0, 0, 0, 0).to_le_bytes()
    }

    #[must_use]
    pub fn csrrw(rd: u8, rs1: u8, csr_addr: u32) -> [u8; 4] {
        pack(tag::CSRRW, rd, rs1, 0, csr_addr as i32).to_le_bytes()
    }

    #[must_use]
    pub fn illegal() -> [u8; 4] {
        pack(0xF, 0, 0, 0, 0).to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trips() {
        let word = pack(tag::ADDI, 5, 6, 0, -7);
        let (t, ops) = unpack(word);
        assert_eq!(t, tag::ADDI);
        assert_eq!(ops.rd, 5);
        assert_eq!(ops.rs1, 6);
        assert_eq!(ops.imm, -7);
    }

    #[test]
    fn negative_immediate_sign_extends() {
        let word = pack(tag::BEQ, 0, 1, 2, -16);
        let (_, ops) = unpack(word);
        assert_eq!(ops.imm, -16);
    }

    #[test]
    fn max_positive_immediate_fits_13_bits() {
        let word = pack(tag::JAL, 1, 0, 0, 4095);
        let (_, ops) = unpack(word);
        assert_eq!(ops.imm, 4095);
    }
}
