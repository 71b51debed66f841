//! Detection of interpolated strings that lose their `FormattableString`
//! form by being passed as `object`.
//!
//! ## Pipeline
//!
//! ```text
//! scanner      invocations with a `$"..."` argument
//!    ↓
//! model        resolve the callee (unresolved → skip)
//!    ↓
//! binding      bind every argument (failure → skip)
//!    ↓
//! suppression  argument already mentions `FormattableString`
//!    ↓
//! emitter      one finding per argument converted to `object`
//! ```

pub mod binding;
pub mod emitter;
pub mod scanner;
pub mod suppression;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use tracing::{debug, debug_span};

use crate::issues::FormattableStringIssue;
use crate::semantic::{CallSite, SemanticModel};
use crate::syntax::Document;
use crate::syntax::tree::MethodBody;

use binding::{bind_arguments, converts_to_object};
use emitter::emit;
use scanner::scan;
use suppression::is_suppressed;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("analysis was cancelled")]
    Cancelled,
}

/// Findings for one method body, in call-site order.
///
/// Nothing is returned for a cancelled body, not even the findings made
/// before the flag was raised.
pub fn analyze_method<M: SemanticModel + ?Sized>(
    document: &Document,
    body: MethodBody<'_>,
    model: &M,
    cancel: &CancellationToken,
) -> Result<Vec<FormattableStringIssue>, AnalysisError> {
    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }
    let mut findings = Vec::new();

    for scanned in scan(body.method) {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let site = CallSite {
            call: scanned.call,
            containing_type: &body.containing_type.name,
            method: Some(body.method),
        };
        let Some(callee) = model.resolve_callee(&site) else {
            debug!(
                method = scanned.call.method_name().unwrap_or_default(),
                at = %scanned.call.span,
                "callee not resolved, call skipped"
            );
            continue;
        };
        let params = match bind_arguments(&scanned.call.args, callee) {
            Ok(params) => params,
            Err(err) => {
                debug!(method = %callee.name, at = %scanned.call.span, "{err}, call skipped");
                continue;
            }
        };

        for ordinal in scanned.candidates {
            let arg = &scanned.call.args[ordinal];
            let param = params[ordinal];
            if !converts_to_object(param) || is_suppressed(document, arg) {
                continue;
            }
            findings.push(emit(document, arg, param, callee));
        }
    }

    Ok(findings)
}

/// Findings for every method body of `document`.
pub fn analyze_document<M: SemanticModel + ?Sized>(
    document: &Document,
    model: &M,
    cancel: &CancellationToken,
) -> Result<Vec<FormattableStringIssue>, AnalysisError> {
    let _span = debug_span!("analyze", file = document.path()).entered();
    let mut findings = Vec::new();
    for body in document.unit().method_bodies() {
        findings.extend(analyze_method(document, body, model, cancel)?);
    }
    debug!(count = findings.len(), "analysis finished");
    Ok(findings)
}
