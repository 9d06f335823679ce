//! Per-process address spaces
//!
//! An address space describes a process's virtual memory as two fixed
//! regions, one code-like and one data-like, plus a fixed-size stack. Each
//! of the three is backed by one contiguous physical extent, so translation
//! is a linear offset and no page tables exist.
//!
//! The lifecycle a loader drives: create the space, define its regions,
//! [`Vm::prepare_load`] to back them with physical memory, copy the program
//! image in through the direct map, [`Vm::complete_load`], then
//! [`Vm::define_stack`] and [`Vm::activate`]. [`Vm::destroy`] gives the
//! extents back; [`Vm::copy`] duplicates the whole space for a fork.

use crate::errors::Error;
use crate::random::{draw_word, randomized_stack_top, ByteSource};
use crate::Vm;
use mips::mem::{is_page_aligned, PhysAddr, VirtAddr, PAGE_FRAME, PAGE_SIZE};
use mips::tlb::{TlbEntry, NUM_TLB};
use mips::Machine;

/// Pages of user stack every address space gets.
pub const STACKPAGES: usize = 12;

/// A user process's virtual memory.
///
/// All fields are zero until the corresponding lifecycle step has run; a
/// zero base means "not defined yet" or "not loaded yet" throughout.
#[derive(Debug, Default)]
pub struct AddressSpace {
    pub(crate) vbase1: VirtAddr,
    pub(crate) npages1: usize,
    pub(crate) pbase1: PhysAddr,
    pub(crate) vbase2: VirtAddr,
    pub(crate) npages2: usize,
    pub(crate) pbase2: PhysAddr,
    pub(crate) stackvbase: VirtAddr,
    pub(crate) stackpbase: PhysAddr,
}

impl AddressSpace {
    /// An empty address space with no regions defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a virtual region covering all of `[vaddr, vaddr + size)`.
    ///
    /// The base is aligned down to a page and the length rounded up so the
    /// region covers every byte of the requested range. The first call
    /// defines region one, the second region two, a third fails. The
    /// permission flags are accepted for the loader's sake but every page
    /// is mapped read/write/execute on this machine.
    pub fn define_region(
        &mut self,
        vaddr: VirtAddr,
        size: u32,
        _readable: bool,
        _writable: bool,
        _executable: bool,
    ) -> Result<(), Error> {
        let size = size + (vaddr & !PAGE_FRAME);
        let vaddr = vaddr & PAGE_FRAME;
        let size = (size + PAGE_SIZE - 1) & PAGE_FRAME;
        let npages = (size / PAGE_SIZE) as usize;

        if self.vbase1 == 0 {
            self.vbase1 = vaddr;
            self.npages1 = npages;
            return Ok(());
        }
        if self.vbase2 == 0 {
            self.vbase2 = vaddr;
            self.npages2 = npages;
            return Ok(());
        }

        log::warn!("attempt to define a third region at {:#010x}", vaddr);
        Err(Error::TooManyRegions)
    }

    /// The randomized stack top, exclusive; zero until
    /// [`Vm::define_stack`] has run. The stack occupies the
    /// [`STACKPAGES`] pages below it.
    pub fn stack_top(&self) -> VirtAddr {
        self.stackvbase
    }

    /// Panic unless every region is defined, backed and page-aligned.
    pub(crate) fn assert_loaded(&self) {
        assert!(self.vbase1 != 0);
        assert!(self.pbase1 != 0);
        assert!(self.npages1 != 0);
        assert!(self.vbase2 != 0);
        assert!(self.pbase2 != 0);
        assert!(self.npages2 != 0);
        assert!(self.stackvbase != 0);
        assert!(self.stackpbase != 0);
        assert!(is_page_aligned(self.vbase1));
        assert!(is_page_aligned(self.pbase1));
        assert!(is_page_aligned(self.vbase2));
        assert!(is_page_aligned(self.pbase2));
        assert!(is_page_aligned(self.stackvbase));
        assert!(is_page_aligned(self.stackpbase));
    }
}

impl<M: Machine, R: ByteSource> Vm<M, R> {
    /// Back every declared region and the stack with freshly allocated
    /// physical extents.
    ///
    /// On exhaustion the extents taken so far are given back, the space
    /// stays unloaded and the allocator is unchanged.
    pub fn prepare_load(&mut self, aspace: &mut AddressSpace) -> Result<(), Error> {
        assert!(aspace.pbase1 == 0);
        assert!(aspace.pbase2 == 0);
        assert!(aspace.stackpbase == 0);

        let pbase1 = self.frames.get_ppages(&self.machine, aspace.npages1);
        if pbase1 == 0 {
            return Err(Error::OutOfMemory);
        }

        let pbase2 = self.frames.get_ppages(&self.machine, aspace.npages2);
        if pbase2 == 0 {
            self.frames.free_ppage(&self.machine, pbase1);
            return Err(Error::OutOfMemory);
        }

        let stackpbase = self.frames.get_ppages(&self.machine, STACKPAGES);
        if stackpbase == 0 {
            self.frames.free_ppage(&self.machine, pbase1);
            self.frames.free_ppage(&self.machine, pbase2);
            return Err(Error::OutOfMemory);
        }

        aspace.pbase1 = pbase1;
        aspace.pbase2 = pbase2;
        aspace.stackpbase = stackpbase;
        Ok(())
    }

    /// Hook for ordering loads against later activation; nothing to do on
    /// this machine.
    pub fn complete_load(&self, _aspace: &mut AddressSpace) -> Result<(), Error> {
        Ok(())
    }

    /// Choose the randomized stack top and return the initial stack
    /// pointer for the process's first thread.
    ///
    /// Reading the randomness device may block on I/O, so this runs with
    /// interrupts enabled.
    pub fn define_stack(&mut self, aspace: &mut AddressSpace) -> Result<VirtAddr, Error> {
        assert!(aspace.stackpbase != 0);

        let random = draw_word(
            self.random
                .as_mut()
                .expect("randomness device is not open"),
        );
        let top = randomized_stack_top(random);
        aspace.stackvbase = top;
        log::debug!("stack top placed at {:#010x}", top);
        Ok(top)
    }

    /// Make `aspace` the translation target of the current thread.
    ///
    /// Translations are not tagged with an address space id, so switching
    /// simply drops every cached translation; the fault handler rebuilds
    /// them against the new space on demand. The argument is unused for
    /// that reason.
    pub fn activate(&self, _aspace: &AddressSpace) {
        let _spl = kspl::raise(&self.machine);

        for index in 0..NUM_TLB {
            self.machine.tlb_write(index, TlbEntry::invalid(index));
        }
    }

    /// Tear the address space down and give its extents back to the frame
    /// allocator.
    ///
    /// Safe on a space that never finished loading; unset extents are
    /// simply skipped.
    pub fn destroy(&mut self, aspace: AddressSpace) {
        self.frames.free_ppage(&self.machine, aspace.pbase1);
        self.frames.free_ppage(&self.machine, aspace.pbase2);
        self.frames.free_ppage(&self.machine, aspace.stackpbase);
    }

    /// Duplicate `old` into a new address space whose extents hold
    /// bytewise-identical copies, for a fork.
    ///
    /// The copies go through the direct map while neither space is active,
    /// so nothing can observe a half-copied extent.
    pub fn copy(&mut self, old: &AddressSpace) -> Result<AddressSpace, Error> {
        let mut new = AddressSpace::new();
        new.vbase1 = old.vbase1;
        new.npages1 = old.npages1;
        new.vbase2 = old.vbase2;
        new.npages2 = old.npages2;
        new.stackvbase = old.stackvbase;

        self.prepare_load(&mut new)?;

        old.assert_loaded();
        new.assert_loaded();

        self.machine.copy_pages(old.pbase1, new.pbase1, old.npages1);
        self.machine.copy_pages(old.pbase2, new.pbase2, old.npages2);
        self.machine
            .copy_pages(old.stackpbase, new.stackpbase, STACKPAGES);

        Ok(new)
    }
}
