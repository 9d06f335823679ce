//! Machine definitions for a MIPS-class uniprocessor target
//!
//! This crate collects everything the memory subsystem needs to know about
//! the machine: the address types and page geometry, the kseg0 direct map,
//! the encoding of translation buffer entries, and the [`Machine`] trait
//! through which the privileged hardware operations are reached.
#![no_std]

pub mod machine;
pub mod mem;
pub mod tlb;

pub use machine::Machine;
