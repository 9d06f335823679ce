//! Human-readable dumps of translation buffer and allocator state
//!
//! Both dumps render as line-oriented ASCII tables, the shape the console
//! has always shown. The fault handler prints the allocator dump when a
//! translation fails; both are also useful from a kernel debugger.

use crate::random::ByteSource;
use crate::Vm;
use buddy::BuddyTable;
use core::fmt;
use mips::tlb::NUM_TLB;
use mips::Machine;

/// Renders the translation buffer slot by slot.
pub struct TlbStats<'a, M> {
    machine: &'a M,
}

impl<M: Machine> fmt::Display for TlbStats<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reading the buffer is a critical section like any other access.
        let _spl = kspl::raise(self.machine);

        writeln!(f, "+---TLB---------------------+")?;
        writeln!(f, "| idx | ehi      | elo      |")?;
        for index in 0..NUM_TLB {
            let entry = self.machine.tlb_read(index);
            writeln!(f, "| {:03} | {:08x} | {:08x} |", index, entry.hi, entry.lo)?;
        }
        write!(f, "+---------------------------+")
    }
}

/// Renders the buddy table entry by entry.
pub struct BuddyStats<'a> {
    table: &'a BuddyTable,
}

impl fmt::Display for BuddyStats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+-----BUDDYLIST--------------------+")?;
        writeln!(f, "| idx |    paddr   | pages | inuse |")?;
        for (index, entry) in self.table.iter().enumerate() {
            writeln!(
                f,
                "| {:03} | {:#010x} |    {:02} |     {:01} |",
                index, entry.base, entry.pages, entry.inuse as u8
            )?;
        }
        write!(f, "+----------------------------------+")
    }
}

impl<M: Machine, R: ByteSource> Vm<M, R> {
    /// A displayable dump of the translation buffer.
    pub fn tlb_stats(&self) -> TlbStats<'_, M> {
        TlbStats {
            machine: &self.machine,
        }
    }

    /// A displayable dump of the frame allocator's buddy table.
    pub fn buddy_stats(&self) -> BuddyStats<'_> {
        BuddyStats {
            table: self.frames.table(),
        }
    }
}
