#![no_main]

use libfuzzer_sys::fuzz_target;
use wpp_inspect::staging::StagedText;
use wpp_inspect::{looks_like_plain_ascii, looks_like_text, render_text, Policy, TextView};

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 64 * 1024 {
        &data[..64 * 1024]
    } else {
        data
    };

    let policy = Policy::default();
    let staged = StagedText::from_bytes(data);
    let max_probe = policy.max_probe_bytes as usize;
    let (text_ok, ascii_ok, view) = unsafe {
        (
            looks_like_text(staged.as_ptr(), max_probe),
            looks_like_plain_ascii(staged.as_ptr(), max_probe),
            render_text(staged.as_c_ptr(), &policy),
        )
    };

    let cap = policy.max_visible_bytes as usize;
    if ascii_ok {
        assert!(text_ok);
    }
    match view {
        TextView::Full(b) => {
            assert!(b.len() <= cap);
            assert_eq!(&b[..], &data[..b.len()]);
        }
        TextView::Truncated { shown, omitted } => {
            assert!(omitted > 0);
            assert_eq!(&shown[..], &data[..cap]);
        }
        TextView::Null => panic!("staged text is never null"),
        TextView::Invalid(_) => assert!(!text_ok),
    }
});
