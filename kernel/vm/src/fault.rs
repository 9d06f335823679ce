//! The translation buffer refill handler
//!
//! The hardware traps to the kernel whenever a user address misses in the
//! translation buffer. Because every region is backed by one contiguous
//! physical extent, the refill is a bounds check plus a linear offset; no
//! page tables are walked and nothing is ever allocated on this path.

use crate::addrspace::{AddressSpace, STACKPAGES};
use crate::errors::Error;
use crate::random::ByteSource;
use crate::Vm;
use mips::mem::{is_page_aligned, VirtAddr, PAGE_FRAME, PAGE_SIZE};
use mips::tlb::{EntryLoFlags, TlbEntry, NUM_TLB};
use mips::Machine;

/// The kinds of translation fault the machine reports.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultKind {
    /// A read through a missing or invalid entry
    Read,
    /// A write through a missing or invalid entry
    Write,
    /// A write through an entry without the dirty bit
    Readonly,
}

impl TryFrom<u32> for FaultKind {
    type Error = Error;

    /// Decode the fault code the trap frame carries.
    fn try_from(code: u32) -> Result<Self, Error> {
        match code {
            0 => Ok(FaultKind::Read),
            1 => Ok(FaultKind::Write),
            2 => Ok(FaultKind::Readonly),
            _ => Err(Error::InvalidArgument),
        }
    }
}

impl<M: Machine, R: ByteSource> Vm<M, R> {
    /// Resolve a user translation fault against the active address space
    /// and install the mapping in a free translation buffer slot.
    ///
    /// Every page is installed writable, so a resolvable fault never needs
    /// more than the address space's metadata. A fault that cannot be
    /// resolved is handed back to the caller, which usually kills the
    /// process.
    pub fn fault(
        &self,
        vmspace: Option<&AddressSpace>,
        kind: FaultKind,
        address: VirtAddr,
    ) -> Result<(), Error> {
        let _spl = kspl::raise(&self.machine);

        let fault_page = address & PAGE_FRAME;
        log::debug!("fault: {:#010x}", fault_page);

        match kind {
            // Pages are always installed dirty, so the hardware can never
            // report a write through a clean entry.
            FaultKind::Readonly => panic!("readonly fault at {:#010x}", fault_page),
            FaultKind::Read | FaultKind::Write => {}
        }

        let Some(aspace) = vmspace else {
            // Probably a kernel fault early in boot. Failing keeps the
            // machine from refaulting on the same address forever.
            return Err(Error::BadAddress);
        };

        aspace.assert_loaded();

        let vtop1 = aspace.vbase1 + aspace.npages1 as u32 * PAGE_SIZE;
        let vtop2 = aspace.vbase2 + aspace.npages2 as u32 * PAGE_SIZE;
        let stacktop = aspace.stackvbase;
        let stackbase = stacktop - STACKPAGES as u32 * PAGE_SIZE;

        let paddr = if (aspace.vbase1..vtop1).contains(&fault_page) {
            fault_page - aspace.vbase1 + aspace.pbase1
        } else if (aspace.vbase2..vtop2).contains(&fault_page) {
            fault_page - aspace.vbase2 + aspace.pbase2
        } else if (stackbase..stacktop).contains(&fault_page) {
            fault_page - stackbase + aspace.stackpbase
        } else {
            log::error!(
                "no region maps {:#010x}\n{}",
                fault_page,
                self.buddy_stats()
            );
            return Err(Error::BadAddress);
        };

        assert!(is_page_aligned(paddr));

        for index in 0..NUM_TLB {
            if self.machine.tlb_read(index).is_valid() {
                continue;
            }
            let entry = TlbEntry::new(
                fault_page,
                paddr,
                EntryLoFlags::DIRTY | EntryLoFlags::VALID,
            );
            log::debug!("refill {:#010x} -> {:#010x} in slot {}", fault_page, paddr, index);
            self.machine.tlb_write(index, entry);
            return Ok(());
        }

        log::warn!("out of translation slots at {:#010x}", fault_page);
        Err(Error::BadAddress)
    }
}
