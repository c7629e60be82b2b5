//! Process-wide limits, read from the environment once.

use once_cell::sync::OnceCell;

pub const DEFAULT_MAX_PROBE_BYTES: u32 = 1024;
pub const DEFAULT_MAX_VISIBLE_BYTES: u32 = 300;
pub const DEFAULT_MAX_ELEMENTS: u32 = 64 * 1024;
pub const DEFAULT_MAX_LINE_BYTES: u32 = 1024;

pub const ENV_MAX_PROBE_BYTES: &str = "WPP_INSPECT_MAX_PROBE_BYTES";
pub const ENV_MAX_VISIBLE_BYTES: &str = "WPP_INSPECT_MAX_VISIBLE_BYTES";
pub const ENV_MAX_ELEMENTS: &str = "WPP_INSPECT_MAX_ELEMENTS";
pub const ENV_MAX_LINE_BYTES: &str = "WPP_INSPECT_MAX_LINE_BYTES";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Bytes scanned by the text probes before giving up and accepting.
    pub max_probe_bytes: u32,
    /// Bytes of a text value shown before the truncation marker.
    pub max_visible_bytes: u32,
    /// Array elements / object fields decoded before the rest is elided.
    pub max_elements: u32,
    /// Longest line handed back by `wpp_readline`.
    pub max_line_bytes: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            max_probe_bytes: DEFAULT_MAX_PROBE_BYTES,
            max_visible_bytes: DEFAULT_MAX_VISIBLE_BYTES,
            max_elements: DEFAULT_MAX_ELEMENTS,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

static POLICY: OnceCell<Policy> = OnceCell::new();

fn env_u32_nonzero(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

impl Policy {
    pub fn from_env() -> Self {
        let d = Policy::default();
        Policy {
            max_probe_bytes: env_u32_nonzero(ENV_MAX_PROBE_BYTES, d.max_probe_bytes),
            max_visible_bytes: env_u32_nonzero(ENV_MAX_VISIBLE_BYTES, d.max_visible_bytes),
            max_elements: env_u32_nonzero(ENV_MAX_ELEMENTS, d.max_elements),
            max_line_bytes: env_u32_nonzero(ENV_MAX_LINE_BYTES, d.max_line_bytes),
        }
    }
}

/// The policy used by the C exports. Loaded on first use.
pub fn policy() -> &'static Policy {
    POLICY.get_or_init(Policy::from_env)
}
