use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for shape ids. The canvas hands ids around on
/// every event, so comparisons and hashing stay O(1).
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Stable identifier of a shape on the canvas (e.g. `shape:webview_3`).
/// A 4-byte interned handle; ids from a restored snapshot re-intern to the
/// same value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(Spur);

impl ShapeId {
    /// Intern a string as a ShapeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ShapeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Look up an already-interned id without allocating a new one.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(ShapeId)
    }

    /// Generate a unique id with a type prefix (e.g. `shape:webview_4`).
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("shape:{prefix}_{n}");
            // Snapshots may already carry ids from an earlier session.
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ShapeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ShapeId::intern("shape:home");
        let b = ShapeId::intern("shape:home");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "shape:home");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        let a = ShapeId::with_prefix("webview");
        let b = ShapeId::with_prefix("webview");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("shape:webview_"));
    }

    #[test]
    fn prefixed_ids_skip_taken_names() {
        // Reserve the next few candidates so the generator has to step over them.
        let probe = ShapeId::with_prefix("taken");
        let n: u64 = probe.as_str().rsplit('_').next().unwrap().parse().unwrap();
        for k in 1..4 {
            ShapeId::intern(&format!("shape:taken_{}", n + k));
        }
        let fresh = ShapeId::with_prefix("taken");
        let m: u64 = fresh.as_str().rsplit('_').next().unwrap().parse().unwrap();
        assert!(m >= n + 4);
    }
}
