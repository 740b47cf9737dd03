//! Client-side entity id generation.
//!
//! Ids have the form `<kind>-<epoch-millis>` (for example `wall-1699999999999`)
//! so new entities can be persisted without a server round-trip.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Last millisecond stamp handed out, shared by all id kinds.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Next stamp, strictly greater than any previously returned one.
///
/// Two ids requested within the same millisecond get consecutive stamps.
fn next_stamp() -> u64 {
    let now = epoch_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Generate a new id for an entity of the given kind prefix.
pub fn generate_id(kind: &str) -> String {
    format!("{}-{}", kind, next_stamp())
}

/// Extract the kind prefix of an id produced by [`generate_id`].
pub fn id_kind(id: &str) -> Option<&str> {
    let (kind, stamp) = id.rsplit_once('-')?;
    stamp.parse::<u64>().ok().map(|_| kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = generate_id("wall");
        assert!(id.starts_with("wall-"));
        assert_eq!(id_kind(&id), Some("wall"));
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let ids: Vec<String> = (0..100).map(|_| generate_id("door")).collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_id_kind_rejects_foreign_ids() {
        assert_eq!(id_kind("not-an-id"), None);
        assert_eq!(id_kind("plain"), None);
    }
}
