//! Applying every fix of a document in sequence.

use tracing::debug;

use super::{FixError, compute_fix};
use crate::analysis::{CancellationToken, analyze_document};
use crate::semantic::SemanticModel;
use crate::syntax::Document;

#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub document: Document,
    /// Number of fixes applied.
    pub applied: usize,
}

impl FixOutcome {
    pub fn is_modified(&self) -> bool {
        self.applied > 0
    }
}

/// Fix the first finding, re-analyse the new document, and repeat.
///
/// Each round works on a fresh document, so no edit ever targets a node of
/// an older snapshot. The loop runs at most once per initial finding.
pub fn apply_all<M: SemanticModel + ?Sized>(
    document: &Document,
    model: &M,
    cancel: &CancellationToken,
) -> Result<FixOutcome, FixError> {
    let mut current = document.clone();
    let mut findings = analyze_document(&current, model, cancel)?;
    let budget = findings.len();
    let mut applied = 0;

    while applied < budget {
        let Some(first) = findings.first() else {
            break;
        };
        current = compute_fix(&current, first, cancel)?;
        applied += 1;
        findings = analyze_document(&current, model, cancel)?;
    }

    if !findings.is_empty() {
        debug!(
            file = document.path(),
            remaining = findings.len(),
            "findings left after fixing"
        );
    }
    Ok(FixOutcome {
        document: current,
        applied,
    })
}
