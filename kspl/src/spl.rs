/// A saved interrupt priority level as returned by [`InterruptControl::splhigh`].
///
/// The encoding is opaque to everything except the [`InterruptControl`]
/// implementation that produced it and must only be passed back to
/// [`InterruptControl::splx`] on the same control.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ipl(pub u32);

/// Control over the processor's interrupt priority level.
///
/// On a single processor this is the kernel's only mutual exclusion
/// primitive: raising the priority to the maximum keeps every interrupt
/// handler and thereby the preemptive scheduler off the CPU until the saved
/// level is restored.
///
/// Implementations act on machine-global state (a status register), so the
/// methods take shared references.
pub trait InterruptControl {
    /// Raise the interrupt priority to the maximum and return the level
    /// that was active before.
    fn splhigh(&self) -> Ipl;

    /// Restore a previously saved interrupt priority level.
    fn splx(&self, saved: Ipl);
}

/// A guard holding the interrupt priority at its maximum.
///
/// The level that was active when the guard was created is restored when the
/// guard is dropped, on every exit path. Guards nest because each one
/// restores exactly the level it saw.
#[must_use = "dropping the guard immediately re-enables interrupts"]
pub struct SplGuard<'a, C: InterruptControl + ?Sized> {
    control: &'a C,
    saved: Ipl,
}

/// Raise the interrupt priority to the maximum for the lifetime of the
/// returned [`SplGuard`].
pub fn raise<C: InterruptControl + ?Sized>(control: &C) -> SplGuard<'_, C> {
    let saved = control.splhigh();
    SplGuard { control, saved }
}

impl<C: InterruptControl + ?Sized> Drop for SplGuard<'_, C> {
    fn drop(&mut self) {
        self.control.splx(self.saved);
    }
}
