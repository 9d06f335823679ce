//! Virtual memory for user processes on a MIPS-class uniprocessor
//!
//! The subsystem ties three pieces together:
//!
//! - a physical frame allocator that partitions the free RAM extent with a
//!   split-only buddy table and serves contiguous multi-page requests,
//! - per-process [`AddressSpace`]s consisting of two fixed regions plus a
//!   fixed-size stack, each backed by one contiguous physical extent,
//! - a software refill handler for the translation buffer that resolves
//!   user faults by linear offset into the faulting region.
//!
//! Everything the subsystem needs from the outside world comes in through
//! two capabilities: the [`mips::Machine`] trait for privileged hardware
//! access and a [`ByteSource`] for the randomness device that drives stack
//! placement. The thread subsystem passes the active address space into
//! [`Vm::fault`]; the subsystem itself keeps no notion of threads.
//!
//! Mutual exclusion is the interrupt discipline from `kspl`: every
//! allocator mutation and every translation buffer access runs with the
//! interrupt priority raised to the maximum, so on this uniprocessor the
//! critical sections are totally ordered.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod addrspace;
pub mod errors;
pub mod fault;
pub mod logging;
mod pfa;
pub mod random;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

use mips::Machine;
use pfa::FrameAllocator;
use random::ByteSource;

pub use addrspace::{AddressSpace, STACKPAGES};
pub use errors::Error;
pub use fault::FaultKind;
pub use logging::{ConsoleSink, KernelLogger};

/// The machine's memory subsystem.
///
/// One instance exists for the lifetime of the machine. It starts in a
/// pre-initialised state where page requests are served by linearly
/// stealing from the boot extent; [`Vm::bootstrap`] hands the remaining
/// extent to the buddy allocator and opens the randomness device, after
/// which address spaces can be loaded and activated.
pub struct Vm<M: Machine, R: ByteSource> {
    machine: M,
    random: Option<R>,
    frames: FrameAllocator,
}

impl<M: Machine, R: ByteSource> Vm<M, R> {
    /// Wrap the machine in a not-yet-bootstrapped subsystem.
    pub fn new(machine: M) -> Self {
        Self {
            machine,
            random: None,
            frames: FrameAllocator::new(),
        }
    }

    /// Take ownership of the free physical extent and of the randomness
    /// device. Must be called exactly once, before the first address space
    /// is loaded.
    pub fn bootstrap(&mut self, random: R) {
        self.frames.bootstrap(&self.machine);
        self.random = Some(random);
    }

    /// The machine this subsystem drives.
    pub fn machine(&self) -> &M {
        &self.machine
    }
}
