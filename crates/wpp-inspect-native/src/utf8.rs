//! Bounded text probes.
//!
//! Both probes gate on [`probably_valid`] and then read at most `max_probe`
//! bytes. Running into the bound without a terminator counts as success: the
//! probe bounds the cost of a scan, it does not prove the whole string valid.

use crate::addr::probably_valid;

#[inline]
fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        _ if lead & 0xe0 == 0xc0 => Some(2),
        _ if lead & 0xf0 == 0xe0 => Some(3),
        _ if lead & 0xf8 == 0xf0 => Some(4),
        _ => None,
    }
}

/// True if `s` looks like NUL-terminated UTF-8.
///
/// # Safety
/// If `s` passes the address filter, the bytes from `s` up to the first NUL or
/// `max_probe` (whichever comes first) must be readable.
pub unsafe fn looks_like_text(s: *const u8, max_probe: usize) -> bool {
    if !probably_valid(s) {
        return false;
    }
    let mut i = 0usize;
    while i < max_probe {
        let c = s.add(i).read();
        if c == 0 {
            return true;
        }
        let Some(width) = utf8_width(c) else {
            return false;
        };
        // Continuation bytes past the bound are never read.
        if i + width > max_probe {
            return true;
        }
        // Stops at the first bad byte, so a NUL in continuation position ends
        // the scan before anything after it is touched.
        for k in 1..width {
            if s.add(i + k).read() & 0xc0 != 0x80 {
                return false;
            }
        }
        i += width;
    }
    true
}

/// Stricter probe: bytes 9..=126 only. That is tab, LF, VT, FF, CR, the
/// 0x0e..=0x1f controls (ESC included) and printable ASCII; DEL and
/// anything above 0x7f fail.
///
/// # Safety
/// Same contract as [`looks_like_text`].
pub unsafe fn looks_like_plain_ascii(s: *const u8, max_probe: usize) -> bool {
    if !probably_valid(s) {
        return false;
    }
    for i in 0..max_probe {
        match s.add(i).read() {
            0 => return true,
            9..=126 => {}
            _ => return false,
        }
    }
    true
}
