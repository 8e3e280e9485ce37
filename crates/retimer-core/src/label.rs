//! Label attribute rendering
//!
//! The label is a static human-readable string describing a retimer's
//! purpose, sourced from the parent device's configuration. It is computed
//! on every read, never stored on the handle. The wire format expected by
//! attribute readers is the value followed by one newline and a NUL
//! terminator; a missing, empty, or unreachable value degrades to
//! `"unknown"` rather than failing.

/// Property key looked up in the parent's configuration
pub const LABEL_PROPERTY: &str = "label";

/// Fallback reported when no usable label is configured
pub const FALLBACK_LABEL: &str = "unknown";

/// Resolve the stored property bytes to the label value to report.
///
/// The backing store may keep a trailing NUL in the stored bytes; one is
/// stripped before the emptiness check so "present but empty" and "absent"
/// collapse to the same fallback.
fn effective(stored: Option<&[u8]>) -> &[u8] {
    let value = match stored {
        Some(v) => v.strip_suffix(&[0]).unwrap_or(v),
        None => return FALLBACK_LABEL.as_bytes(),
    };
    if value.is_empty() {
        FALLBACK_LABEL.as_bytes()
    } else {
        value
    }
}

/// Render the label into a caller-provided fixed buffer.
///
/// Writes the value, a `\n`, and a NUL terminator, truncating the value
/// (then the newline) when capacity is short; the final byte of a nonempty
/// buffer always holds the NUL. Returns the number of bytes written not
/// counting the NUL; for a label of stored length `n + 1` (terminator slot
/// included) and sufficient capacity this is exactly `n + 1`.
pub fn render_into(stored: Option<&[u8]>, buf: &mut [u8]) -> usize {
    if buf.is_empty() {
        return 0;
    }
    let value = effective(stored);
    let cap = buf.len() - 1;
    let copied = value.len().min(cap.saturating_sub(1));
    buf[..copied].copy_from_slice(&value[..copied]);
    let mut written = copied;
    if written < cap {
        buf[written] = b'\n';
        written += 1;
    }
    buf[written] = 0;
    written
}

/// Label value as a plain string, without the transport framing
pub fn text(stored: Option<&[u8]>) -> String {
    String::from_utf8_lossy(effective(stored)).into_owned()
}
