//! Encoding of translation buffer entries
//!
//! The machine translates user addresses through a fully associative buffer
//! of [`NUM_TLB`] entry pairs. The high word of an entry carries the virtual
//! page number, the low word carries the physical frame number plus the
//! control flags described by [`EntryLoFlags`]. Misses trap to the kernel,
//! which refills a slot in software.

use crate::mem::{PhysAddr, VirtAddr, PAGE_FRAME};
use bitflags::bitflags;
use core::fmt::{Debug, Write};

/// Number of slots in the translation buffer.
pub const NUM_TLB: usize = 64;

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq)]
    pub struct EntryLoFlags: u32 {
        /// The entry matches in every address space, regardless of the
        /// process id bits in the high word
        const GLOBAL = 1 << 8;
        /// The hardware uses this entry for translation
        const VALID = 1 << 9;
        /// The mapped page may be written to
        const DIRTY = 1 << 10;
        /// Accesses through this entry bypass the cache
        const NOCACHE = 1 << 11;
    }
}

impl Debug for EntryLoFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn write_bit(
            flags: EntryLoFlags,
            bit: EntryLoFlags,
            c: char,
            f: &mut core::fmt::Formatter<'_>,
        ) -> core::fmt::Result {
            if flags.contains(bit) {
                f.write_char(c)
            } else {
                f.write_char(' ')
            }
        }
        write_bit(*self, EntryLoFlags::NOCACHE, 'N', f)?;
        write_bit(*self, EntryLoFlags::DIRTY, 'D', f)?;
        write_bit(*self, EntryLoFlags::VALID, 'V', f)?;
        write_bit(*self, EntryLoFlags::GLOBAL, 'G', f)?;
        Ok(())
    }
}

/// One slot of the translation buffer, encoded as the hardware reads it.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TlbEntry {
    /// Virtual page number and process id bits
    pub hi: u32,
    /// Physical frame number and [`EntryLoFlags`] control bits
    pub lo: u32,
}

impl TlbEntry {
    /// Build an entry mapping the page of `vaddr` to the page of `paddr`
    /// with the given control flags.
    pub fn new(vaddr: VirtAddr, paddr: PhysAddr, flags: EntryLoFlags) -> Self {
        Self {
            hi: vaddr & PAGE_FRAME,
            lo: (paddr & PAGE_FRAME) | flags.bits(),
        }
    }

    /// The pattern marking slot `index` as unused.
    ///
    /// The virtual page is placed inside the unmapped kseg0 window, where
    /// the hardware never looks up translations, and is made
    /// index-dependent so that no two slots ever carry the same virtual
    /// page.
    pub fn invalid(index: usize) -> Self {
        Self {
            hi: (0x80000 + index as u32) << 12,
            lo: 0,
        }
    }

    /// Whether the hardware will use this entry for translation.
    pub fn is_valid(&self) -> bool {
        self.flags().contains(EntryLoFlags::VALID)
    }

    /// The virtual page this entry translates.
    pub fn vpage(&self) -> VirtAddr {
        self.hi & PAGE_FRAME
    }

    /// The physical frame this entry maps to.
    pub fn pframe(&self) -> PhysAddr {
        self.lo & PAGE_FRAME
    }

    /// The control flags encoded in the low word.
    pub fn flags(&self) -> EntryLoFlags {
        EntryLoFlags::from_bits_truncate(self.lo)
    }
}

impl Debug for TlbEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TlbEntry")
            .field("vpage", &format_args!("{:#010x}", self.vpage()))
            .field("pframe", &format_args!("{:#010x}", self.pframe()))
            .field("flags", &self.flags())
            .finish()
    }
}
