// Bit positions and default control-field state for the 27-bit micro-word,
// per the MIC-1 control store layout.

pub const B_0: u32 = 0;
pub const B_1: u32 = 1;
pub const B_2: u32 = 2;
pub const B_3: u32 = 3;

pub const FETCH: u32 = 4;
pub const READ: u32 = 5;
pub const WRITE: u32 = 6;

pub const C_MAR: u32 = 7;
pub const C_MDR: u32 = 8;
pub const C_PC: u32 = 9;
pub const C_SP: u32 = 10;
pub const C_LV: u32 = 11;
pub const C_CPP: u32 = 12;
pub const C_TOS: u32 = 13;
pub const C_OPC: u32 = 14;
pub const C_H: u32 = 15;

pub const INC: u32 = 16;
pub const INV_A: u32 = 17;
pub const EN_B: u32 = 18;
pub const EN_A: u32 = 19;
pub const F_1: u32 = 20;
pub const F_0: u32 = 21;
pub const SRA_1: u32 = 22;
pub const SLL_8: u32 = 23;
pub const JAMZ: u32 = 24;
pub const JAMN: u32 = 25;
pub const JMPC: u32 = 26;

/// Default control field: bits 0 and 3 set, meaning "no B source" (an unused
/// B-selector value), everything else clear.
pub const DEFAULT_CONTROL: u32 = (1 << B_0) | (1 << B_3);

pub const B_SOURCE_MASK: u32 = (1 << B_0) | (1 << B_1) | (1 << B_2) | (1 << B_3);

pub const CONTROL_STORE_SIZE: usize = 512;
