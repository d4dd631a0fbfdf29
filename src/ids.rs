/// Identity helpers for boards, lanes, and items.
///
/// Lanes persist their id in an HTML comment right after the heading
/// (`<!-- kanban-lane-id: xxxx -->`); items persist theirs as a trailing
/// `^blockid` token, which doubles as the host's same-document anchor
/// syntax. Anything without a marker gets a fresh id on every parse, so id
/// stability across reparses is best-effort, not guaranteed.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use regex::Regex;

static BLOCK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\^([a-zA-Z0-9-]+)\s*$").unwrap());

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a new random-looking id (8 chars, lowercase alphanumeric).
/// Uses an atomic counter for intra-process uniqueness combined with a
/// nanosecond timestamp, hashed via SHA-256 for uniform distribution.
pub fn generate_id() -> String {
    use sha2::{Digest, Sha256};
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    hash[..8]
        .iter()
        .map(|b| ID_ALPHABET[(*b as usize) % ID_ALPHABET.len()] as char)
        .collect()
}

/// Extract a trailing block id (`^abc123`) from item text.
/// Looks at the last line only.
pub fn extract_block_id(text: &str) -> Option<String> {
    let last_line = text.lines().last().unwrap_or("");
    BLOCK_ID_RE
        .captures(last_line)
        .map(|caps| caps[1].to_string())
}

/// Strip a trailing block id marker from item text.
pub fn strip_block_id(text: &str) -> String {
    match text.rsplit_once('\n') {
        Some((head, last)) => {
            let cleaned = BLOCK_ID_RE.replace(last, "").trim_end().to_string();
            if cleaned.is_empty() {
                head.to_string()
            } else {
                format!("{}\n{}", head, cleaned)
            }
        }
        None => BLOCK_ID_RE.replace(text, "").trim_end().to_string(),
    }
}

/// Append a block id marker to the last line of item text.
/// Any existing marker is replaced.
pub fn inject_block_id(text: &str, block_id: &str) -> String {
    let cleaned = strip_block_id(text);
    if cleaned.is_empty() {
        return format!("^{}", block_id);
    }
    format!("{} ^{}", cleaned, block_id)
}
