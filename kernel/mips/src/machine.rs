//! The hardware services consumed by the memory subsystem

use crate::mem::PhysAddr;
use crate::tlb::TlbEntry;
use kspl::InterruptControl;

/// Privileged machine operations the memory subsystem is built on.
///
/// All methods take shared references because they act on machine-global
/// state (privileged registers and the physical bus); exclusion is provided
/// by the interrupt discipline the [`InterruptControl`] supertrait exposes,
/// not by Rust borrows.
pub trait Machine: InterruptControl {
    /// The physical extent `[lo, hi)` still free after the kernel image and
    /// early boot allocations. Both bounds are page-aligned.
    fn ram_bounds(&self) -> (PhysAddr, PhysAddr);

    /// Carve `npages` contiguous pages off the bottom of the free extent
    /// and return their base, or 0 if the extent is exhausted.
    ///
    /// This linear allocation shrinks the extent reported by
    /// [`ram_bounds`](Machine::ram_bounds) and is only meant for the time
    /// before a real allocator has taken ownership of the extent.
    fn steal_pages(&self, npages: usize) -> PhysAddr;

    /// Read translation buffer slot `index`.
    fn tlb_read(&self, index: usize) -> TlbEntry;

    /// Write translation buffer slot `index`.
    fn tlb_write(&self, index: usize, entry: TlbEntry);

    /// Copy `npages` pages from physical address `src` to physical address
    /// `dst` through the kseg0 window. The two extents must not overlap.
    fn copy_pages(&self, src: PhysAddr, dst: PhysAddr, npages: usize);
}
