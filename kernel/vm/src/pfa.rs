//! The physical frame allocator
//!
//! Before [`FrameAllocator::bootstrap`] runs, requests fall through to the
//! machine's linear boot allocation. Afterwards the free extent belongs to
//! a split-only buddy table and every request is served from there. Frames
//! are identified by their base physical address in both phases.

use crate::errors::Error;
use crate::random::ByteSource;
use crate::Vm;
use buddy::BuddyTable;
use mips::mem::{is_page_aligned, kvaddr_to_paddr, paddr_to_kvaddr, PhysAddr, VirtAddr, PAGE_SIZE};
use mips::Machine;

pub(crate) struct FrameAllocator {
    table: BuddyTable,
    initialized: bool,
}

impl FrameAllocator {
    pub(crate) fn new() -> Self {
        Self {
            table: BuddyTable::new(PAGE_SIZE),
            initialized: false,
        }
    }

    /// Query the machine for the remaining free extent and record it as a
    /// single free run.
    pub(crate) fn bootstrap<M: Machine>(&mut self, machine: &M) {
        assert!(!self.initialized, "frame allocator is already bootstrapped");

        let (lo, hi) = machine.ram_bounds();
        assert!(is_page_aligned(lo));
        assert!(is_page_aligned(hi));
        log::info!("memory after boot: first {:#010x}, last {:#010x}", lo, hi);

        let npages = ((hi - lo) / PAGE_SIZE) as usize;
        self.table.seed(lo, npages);
        self.initialized = true;
        log::info!("vm initialized with one buddy @ {:#010x}, {} pages", lo, npages);
    }

    /// Reserve a contiguous run of `npages` frames, returning its base
    /// physical address or 0 when memory is exhausted.
    pub(crate) fn get_ppages<M: Machine>(&mut self, machine: &M, npages: usize) -> PhysAddr {
        let _spl = kspl::raise(machine);

        if self.initialized {
            self.table.reserve(npages).unwrap_or(0)
        } else {
            machine.steal_pages(npages)
        }
    }

    /// Give the run starting at `paddr` back to the allocator.
    ///
    /// A zero address names an extent that was never allocated and is
    /// ignored, so address spaces that never finished loading can be torn
    /// down with no special casing.
    pub(crate) fn free_ppage<M: Machine>(&mut self, machine: &M, paddr: PhysAddr) {
        if paddr == 0 {
            return;
        }

        let _spl = kspl::raise(machine);
        if !self.table.release(paddr) {
            log::debug!("free of unknown physical page {:#010x} ignored", paddr);
        }
    }

    pub(crate) fn table(&self) -> &BuddyTable {
        &self.table
    }
}

impl<M: Machine, R: ByteSource> Vm<M, R> {
    /// Allocate `npages` contiguous kernel pages and return their address
    /// in the direct-map window.
    pub fn alloc_kpages(&mut self, npages: usize) -> Result<VirtAddr, Error> {
        let paddr = self.frames.get_ppages(&self.machine, npages);
        if paddr == 0 {
            return Err(Error::OutOfMemory);
        }
        Ok(paddr_to_kvaddr(paddr))
    }

    /// Release kernel pages handed out by [`Vm::alloc_kpages`].
    pub fn free_kpages(&mut self, kvaddr: VirtAddr) {
        self.frames.free_ppage(&self.machine, kvaddr_to_paddr(kvaddr));
    }
}
