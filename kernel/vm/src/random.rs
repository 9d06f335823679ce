//! The randomness capability and the stack placement drawn from it

use mips::mem::{VirtAddr, KSEG0_BASE, PAGE_FRAME};
use static_assertions::const_assert;

/// An opaque stream of random bytes, usually the kernel's `random:` device.
///
/// No statistical or cryptographic quality is assumed; the subsystem only
/// uses it to spread stack placements.
pub trait ByteSource {
    /// Fill up to `buf.len()` bytes and return how many were written.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

/// Lowest address the randomized stack top can take: the top of the
/// statically reserved user code and data window.
pub const STACK_TOP_MIN: VirtAddr = 0x005c_0000;

/// Width of the window stack tops are drawn from.
pub const STACK_TOP_SPAN: u32 = 0x7fa4_0000;

// The whole window has to stay below the kernel segment.
const_assert!(STACK_TOP_MIN as u64 + STACK_TOP_SPAN as u64 <= KSEG0_BASE as u64);

/// Draw one word from the randomness source.
///
/// Blocks until four bytes have arrived, so this must not run inside a
/// raised-interrupt section.
pub(crate) fn draw_word<R: ByteSource + ?Sized>(source: &mut R) -> u32 {
    let mut bytes = [0u8; 4];
    let mut filled = 0;
    while filled < bytes.len() {
        let count = source.read(&mut bytes[filled..]);
        assert!(count > 0, "randomness source returned no data");
        filled += count;
    }
    u32::from_ne_bytes(bytes)
}

/// Map a random word into the stack-top window and align the result to a
/// page boundary.
pub fn randomized_stack_top(random: u32) -> VirtAddr {
    (STACK_TOP_MIN + random % STACK_TOP_SPAN) & PAGE_FRAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use mips::mem::is_page_aligned;

    #[test]
    fn stack_tops_stay_inside_the_window() {
        for random in [0, 1, 0x1234_5678, STACK_TOP_SPAN - 1, STACK_TOP_SPAN, u32::MAX] {
            let top = randomized_stack_top(random);
            assert!(top >= STACK_TOP_MIN);
            assert!(top < STACK_TOP_MIN + STACK_TOP_SPAN);
            assert!(top < KSEG0_BASE);
            assert!(is_page_aligned(top));
        }
    }

    #[test]
    fn the_window_extremes_map_where_expected() {
        assert_eq!(randomized_stack_top(0), STACK_TOP_MIN);
        // The largest draw lands one page short of the kernel segment.
        assert_eq!(randomized_stack_top(STACK_TOP_SPAN - 1), KSEG0_BASE - 0x1000);
        // The modulus wraps draws beyond the window back to its bottom.
        assert_eq!(randomized_stack_top(STACK_TOP_SPAN), STACK_TOP_MIN);
    }

    #[test]
    fn words_are_assembled_from_short_reads() {
        /// Source that trickles out one byte per call.
        struct Trickle {
            bytes: [u8; 4],
            cursor: usize,
        }

        impl ByteSource for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> usize {
                buf[0] = self.bytes[self.cursor];
                self.cursor += 1;
                1
            }
        }

        let mut source = Trickle {
            bytes: 0xdead_beef_u32.to_ne_bytes(),
            cursor: 0,
        };
        assert_eq!(draw_word(&mut source), 0xdead_beef);
    }
}
