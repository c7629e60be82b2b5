//! Line input and integer text, with per-thread result storage.
//!
//! Both C entry points hand back pointers into thread-local buffers: a result
//! stays valid until the next call of the same function on the same thread,
//! and calls on other threads never touch it.

use std::cell::RefCell;
use std::ffi::c_char;
use std::io::{BufRead, ErrorKind};

thread_local! {
    static LINE_BUF: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
    // "-2147483648" plus NUL.
    static INT_BUF: RefCell<[u8; 12]> = const { RefCell::new([0; 12]) };
}

fn append_capped(out: &mut Vec<u8>, bytes: &[u8], max: usize) {
    let room = max.saturating_sub(out.len());
    out.extend_from_slice(&bytes[..bytes.len().min(room)]);
}

/// Reads one line, without its trailing `\n`. Any `\r` is kept.
///
/// Returns `Ok(None)` at end of input. Bytes past `max_line_bytes` are
/// consumed and dropped so the next call starts on the next line.
pub fn read_line_from<R: BufRead>(
    r: &mut R,
    max_line_bytes: usize,
) -> std::io::Result<Option<Vec<u8>>> {
    let mut out: Vec<u8> = Vec::new();
    let mut saw_any = false;

    loop {
        let (consume_n, saw_newline) = {
            let buf = match r.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if buf.is_empty() {
                break;
            }
            saw_any = true;
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    append_capped(&mut out, &buf[..pos], max_line_bytes);
                    (pos + 1, true)
                }
                None => {
                    append_capped(&mut out, buf, max_line_bytes);
                    (buf.len(), false)
                }
            }
        };
        r.consume(consume_n);
        if saw_newline {
            break;
        }
    }

    if !saw_any {
        return Ok(None);
    }
    Ok(Some(out))
}

/// Stores `line` (cut at its first NUL) in this thread's line buffer and
/// returns a pointer to the NUL-terminated copy.
pub fn stash_line(line: &[u8]) -> *const c_char {
    let end = line.iter().position(|&b| b == 0).unwrap_or(line.len());
    LINE_BUF.with(|cell| {
        let mut buf = cell.borrow_mut();
        buf.clear();
        buf.extend_from_slice(&line[..end]);
        buf.push(0);
        buf.as_ptr().cast::<c_char>()
    })
}

pub fn int_to_text(value: i32) -> String {
    itoa::Buffer::new().format(value).to_string()
}

/// Formats `value` into this thread's integer buffer.
pub fn stash_int(value: i32) -> *const c_char {
    let mut fmt = itoa::Buffer::new();
    let digits = fmt.format(value).as_bytes();
    INT_BUF.with(|cell| {
        let mut buf = cell.borrow_mut();
        buf[..digits.len()].copy_from_slice(digits);
        buf[digits.len()] = 0;
        buf.as_ptr().cast::<c_char>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::io::Cursor;

    fn lines(input: &[u8], max: usize) -> Vec<Vec<u8>> {
        let mut r = Cursor::new(input.to_vec());
        let mut out = Vec::new();
        while let Some(l) = read_line_from(&mut r, max).expect("read") {
            out.push(l);
        }
        out
    }

    #[test]
    fn strips_one_trailing_newline() {
        assert_eq!(lines(b"abc\n", 1024), vec![b"abc".to_vec()]);
        assert_eq!(
            lines(b"abc\n\nx", 1024),
            vec![b"abc".to_vec(), b"".to_vec(), b"x".to_vec()]
        );
        assert_eq!(lines(b"dos\r\n", 1024), vec![b"dos\r".to_vec()]);
    }

    #[test]
    fn carriage_returns_are_data() {
        assert_eq!(lines(b"abc\r", 1024), vec![b"abc\r".to_vec()]);
        assert_eq!(lines(b"abc\rdef\n", 4), vec![b"abc\r".to_vec()]);
        assert_eq!(lines(b"a\rb\n", 1024), vec![b"a\rb".to_vec()]);
    }

    #[test]
    fn end_of_input_is_none() {
        let mut r = Cursor::new(Vec::new());
        assert_eq!(read_line_from(&mut r, 16).expect("read"), None);
    }

    #[test]
    fn long_lines_are_cut_and_rest_dropped() {
        assert_eq!(
            lines(b"abcdefgh\nnext\n", 3),
            vec![b"abc".to_vec(), b"nex".to_vec()]
        );
    }

    #[test]
    fn long_lines_across_buffer_refills() {
        let input = b"0123456789\nok\n";
        let mut r = std::io::BufReader::with_capacity(4, &input[..]);
        assert_eq!(
            read_line_from(&mut r, 6).expect("read"),
            Some(b"012345".to_vec())
        );
        assert_eq!(read_line_from(&mut r, 6).expect("read"), Some(b"ok".to_vec()));
        assert_eq!(read_line_from(&mut r, 6).expect("read"), None);
    }

    #[test]
    fn stashed_line_is_nul_terminated_and_cut_at_nul() {
        let p = stash_line(b"ab\0cd");
        assert_eq!(unsafe { CStr::from_ptr(p) }.to_bytes(), b"ab");
    }

    #[test]
    fn int_text() {
        assert_eq!(int_to_text(-42), "-42");
        assert_eq!(int_to_text(0), "0");
        let p = stash_int(i32::MIN);
        assert_eq!(unsafe { CStr::from_ptr(p) }.to_str(), Ok("-2147483648"));
    }

    #[test]
    fn int_buffers_are_per_thread() {
        let mine = stash_int(111);
        let theirs = std::thread::spawn(|| {
            let p = stash_int(-222);
            unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
        })
        .join()
        .expect("join");
        assert_eq!(theirs, "-222");
        assert_eq!(unsafe { CStr::from_ptr(mine) }.to_str(), Ok("111"));
    }
}
