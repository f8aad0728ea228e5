use crate::{AzulejoError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Sink for degenerate-input warnings.
///
/// Lenient sinks log and count; strict sinks turn the first warning into an
/// [`AzulejoError::Degenerate`] so the caller can abort the stage.
#[derive(Debug, Default)]
pub struct Diagnostics {
    strict: bool,
    count: AtomicUsize,
}

impl Diagnostics {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            count: AtomicUsize::new(0),
        }
    }

    pub fn lenient() -> Self {
        Self::new(false)
    }

    pub fn strict() -> Self {
        Self::new(true)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Record a degenerate unit that is skipped.
    pub fn degenerate(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.count.fetch_add(1, Ordering::Relaxed);
        warn!("{}", message);
        if self.strict {
            return Err(AzulejoError::Degenerate(message));
        }
        Ok(())
    }

    pub fn warnings(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_counts() {
        let diag = Diagnostics::lenient();
        diag.degenerate("fragment chr9 has no positions").unwrap();
        diag.degenerate("cluster 4 has zero length variance").unwrap();
        assert_eq!(diag.warnings(), 2);
    }

    #[test]
    fn test_strict_fails_fast() {
        let diag = Diagnostics::strict();
        let err = diag.degenerate("proteome x has no positions").unwrap_err();
        assert!(matches!(err, AzulejoError::Degenerate(m) if m.contains("proteome x")));
        assert_eq!(diag.warnings(), 1);
    }
}
