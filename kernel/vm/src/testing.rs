//! Test doubles standing in for the machine and its devices

use crate::addrspace::AddressSpace;
use crate::random::ByteSource;
use crate::Vm;
use core::cell::{Cell, RefCell};
use kspl::{InterruptControl, Ipl};
use mips::mem::{PhysAddr, PAGE_SIZE};
use mips::tlb::{EntryLoFlags, TlbEntry, NUM_TLB};
use mips::Machine;
use std::vec;
use std::vec::Vec;

pub(crate) type TestVm = Vm<TestMachine, FixedRandom>;

/// A software model of the machine: one extent of RAM, a translation
/// buffer and an interrupt level.
///
/// The double checks the contracts the hardware relies on: translation
/// buffer accesses must happen with interrupts masked, and physical
/// accesses must stay inside RAM.
pub(crate) struct TestMachine {
    ram_lo: PhysAddr,
    ram_hi: PhysAddr,
    next_steal: Cell<PhysAddr>,
    ram: RefCell<Vec<u8>>,
    tlb: RefCell<[TlbEntry; NUM_TLB]>,
    level: Cell<u32>,
}

impl TestMachine {
    pub(crate) fn new(ram_lo: PhysAddr, pages: usize) -> Self {
        let bytes = pages * PAGE_SIZE as usize;
        let mut tlb = [TlbEntry::invalid(0); NUM_TLB];
        for (index, slot) in tlb.iter_mut().enumerate() {
            *slot = TlbEntry::invalid(index);
        }
        Self {
            ram_lo,
            ram_hi: ram_lo + bytes as u32,
            next_steal: Cell::new(ram_lo),
            ram: RefCell::new(vec![0; bytes]),
            tlb: RefCell::new(tlb),
            level: Cell::new(0),
        }
    }

    /// The current interrupt level; zero means everything is enabled.
    pub(crate) fn level(&self) -> u32 {
        self.level.get()
    }

    /// Fill pages with a byte value, standing in for a loader writing
    /// through the direct map.
    pub(crate) fn fill_pages(&self, paddr: PhysAddr, npages: usize, value: u8) {
        let start = self.offset(paddr);
        let len = npages * PAGE_SIZE as usize;
        self.ram.borrow_mut()[start..start + len].fill(value);
    }

    pub(crate) fn page_bytes(&self, paddr: PhysAddr, npages: usize) -> Vec<u8> {
        let start = self.offset(paddr);
        let len = npages * PAGE_SIZE as usize;
        self.ram.borrow()[start..start + len].to_vec()
    }

    /// The valid translation buffer entries in slot order.
    pub(crate) fn valid_tlb_entries(&self) -> Vec<TlbEntry> {
        self.tlb
            .borrow()
            .iter()
            .copied()
            .filter(TlbEntry::is_valid)
            .collect()
    }

    /// Stuff every slot with a valid mapping, as a long-running process
    /// without activations would.
    pub(crate) fn fill_tlb(&self) {
        let mut tlb = self.tlb.borrow_mut();
        for (index, slot) in tlb.iter_mut().enumerate() {
            *slot = TlbEntry::new(
                0x7000_0000 + index as u32 * PAGE_SIZE,
                self.ram_lo,
                EntryLoFlags::VALID,
            );
        }
    }

    fn offset(&self, paddr: PhysAddr) -> usize {
        assert!(
            paddr >= self.ram_lo && paddr < self.ram_hi,
            "physical access outside RAM at {:#010x}",
            paddr
        );
        (paddr - self.ram_lo) as usize
    }
}

impl InterruptControl for TestMachine {
    fn splhigh(&self) -> Ipl {
        let saved = Ipl(self.level.get());
        self.level.set(saved.0 + 1);
        saved
    }

    fn splx(&self, saved: Ipl) {
        self.level.set(saved.0);
    }
}

impl Machine for TestMachine {
    fn ram_bounds(&self) -> (PhysAddr, PhysAddr) {
        (self.next_steal.get(), self.ram_hi)
    }

    fn steal_pages(&self, npages: usize) -> PhysAddr {
        let base = self.next_steal.get();
        let next = base + npages as u32 * PAGE_SIZE;
        if next > self.ram_hi {
            return 0;
        }
        self.next_steal.set(next);
        base
    }

    fn tlb_read(&self, index: usize) -> TlbEntry {
        assert!(self.level.get() > 0, "TLB read with interrupts enabled");
        self.tlb.borrow()[index]
    }

    fn tlb_write(&self, index: usize, entry: TlbEntry) {
        assert!(self.level.get() > 0, "TLB write with interrupts enabled");
        self.tlb.borrow_mut()[index] = entry;
    }

    fn copy_pages(&self, src: PhysAddr, dst: PhysAddr, npages: usize) {
        let len = npages * PAGE_SIZE as usize;
        let src = self.offset(src);
        let dst = self.offset(dst);
        self.ram.borrow_mut().copy_within(src..src + len, dst);
    }
}

/// Byte source handing out one scripted word over and over, mirroring a
/// read from the random device.
pub(crate) struct FixedRandom(pub(crate) u32);

impl ByteSource for FixedRandom {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let bytes = self.0.to_ne_bytes();
        let count = buf.len().min(bytes.len());
        buf[..count].copy_from_slice(&bytes[..count]);
        count
    }
}

/// A bootstrapped subsystem over `pages` pages of RAM starting at `base`.
pub(crate) fn vm_with_ram(base: PhysAddr, pages: usize) -> TestVm {
    let mut vm = Vm::new(TestMachine::new(base, pages));
    vm.bootstrap(FixedRandom(0x1234_5678));
    vm
}

/// An address space with both regions defined, extents allocated and the
/// stack placed, ready to activate.
pub(crate) fn loaded_aspace(vm: &mut TestVm) -> AddressSpace {
    let mut aspace = AddressSpace::new();
    aspace
        .define_region(0x0040_0000, 5 * PAGE_SIZE, true, false, true)
        .unwrap();
    aspace
        .define_region(0x1000_0000, 3 * PAGE_SIZE, true, true, false)
        .unwrap();
    vm.prepare_load(&mut aspace).unwrap();
    vm.complete_load(&mut aspace).unwrap();
    vm.define_stack(&mut aspace).unwrap();
    aspace
}
