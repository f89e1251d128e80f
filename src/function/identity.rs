use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Structural identity of a function.
///
/// Leaf functions are either unique (an opaque closure) or named builtins.
/// Composed functions remember the operation and the identities of their
/// parts, so two compositions of the same parts compare equal without being
/// evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Unique(u64),
    Builtin(&'static str),
    Composed {
        op: &'static str,
        parts: Arc<[Identity]>,
        detail: Option<Arc<str>>,
    },
}

impl Identity {
    pub fn unique() -> Self {
        Identity::Unique(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn builtin(name: &'static str) -> Self {
        Identity::Builtin(name)
    }

    pub fn composed<'a>(op: &'static str, parts: impl IntoIterator<Item = &'a Identity>) -> Self {
        Identity::Composed {
            op,
            parts: parts.into_iter().cloned().collect(),
            detail: None,
        }
    }

    /// Attaches a rendering of a captured value, e.g. a null default.
    pub fn with_detail(self, detail: impl Into<Arc<str>>) -> Self {
        match self {
            Identity::Composed { op, parts, .. } => Identity::Composed {
                op,
                parts,
                detail: Some(detail.into()),
            },
            other => other,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Unique(id) => write!(f, "fn#{}", id),
            Identity::Builtin(name) => f.write_str(name),
            Identity::Composed { op, parts, detail } => {
                write!(f, "{}(", op)?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                if let Some(detail) = detail {
                    write!(f, "; {}", detail)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Identity::unique();
        let b = Identity::builtin("box_int");
        assert_ne!(a, Identity::unique());

        let left = Identity::composed("map", [&a, &b]);
        let right = Identity::composed("map", [&a, &b]);
        assert_eq!(left, right);
        assert_ne!(left, Identity::composed("map", [&b, &a]));
        assert_ne!(left, Identity::composed("map_input", [&a, &b]));
        assert_ne!(left.clone().with_detail("1"), left.clone().with_detail("2"));
        assert_eq!(left.to_string(), format!("map({}, box_int)", a));
    }
}
