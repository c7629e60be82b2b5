//! Address plausibility filter.
//!
//! A cheap range check applied before any read through an address whose
//! provenance is unknown. It rejects null, the low pages every platform leaves
//! unmapped, and anything above the canonical user-space range of a 48-bit
//! address space. Passing the filter is necessary, not sufficient: a plausible
//! address can still be unmapped or freed. This reduces, and does not
//! eliminate, the risk of an invalid access.

/// Lowest address considered mappable (first page is never handed out).
pub const LOW_GUARD: u64 = 0x1000;
/// Highest address considered user data.
pub const HIGH_GUARD: u64 = 0x7fff_ffff_ffff;

#[inline]
pub fn probably_valid<T>(p: *const T) -> bool {
    let addr = p as usize as u64;
    (LOW_GUARD..=HIGH_GUARD).contains(&addr)
}

/// Displays an address the way the runtime's diagnostics show it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Addr(pub usize);

impl<T> From<*const T> for Addr {
    fn from(p: *const T) -> Self {
        Addr(p as usize)
    }
}

impl std::fmt::Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
