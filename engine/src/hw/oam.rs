//! # OAM affine parameters
//!
//! OAM holds 128 sprite entries of four halfwords. The fourth halfword of
//! every entry is an affine parameter; four consecutive entries form one
//! matrix:
//!
//! | Entry    | Parameter |
//! |----------|-----------|
//! | `4i`     | `pa`      |
//! | `4i + 1` | `pb`      |
//! | `4i + 2` | `pc`      |
//! | `4i + 3` | `pd`      |

use volatile_register::{RW, WO};

use crate::affine_mats::{AffineCommitRange, AffineMatRegisters};
use crate::config::SPRITES_COUNT;

#[repr(C)]
pub struct OamEntry {
    pub attr0: RW<u16>,
    pub attr1: RW<u16>,
    pub attr2: RW<u16>,
    pub affine: WO<i16>,
}

#[repr(C)]
pub struct Oam {
    pub entries: [OamEntry; SPRITES_COUNT],
}

impl Oam {
    #[inline(always)]
    pub unsafe fn new() -> &'static mut Oam {
        unsafe { &mut *(0x0700_0000 as *mut Oam) }
    }

    /// Writes the matrices of `range` from `registers`, indexed by matrix id.
    pub fn commit_affine_mats(&mut self, range: AffineCommitRange, registers: &[AffineMatRegisters]) {
        let mats = &registers[range.offset..range.offset + range.count];

        for (index, mat) in mats.iter().enumerate() {
            let base = (range.offset + index) * 4;

            unsafe {
                self.entries[base].affine.write(mat.pa);
                self.entries[base + 1].affine.write(mat.pb);
                self.entries[base + 2].affine.write(mat.pc);
                self.entries[base + 3].affine.write(mat.pd);
            }
        }
    }
}
