//! Syntactic pre-filter: invocations with an interpolated string argument.

use crate::syntax::tree::{CallExpr, MethodDecl, Visit, walk_call};

/// An invocation with the positions of its candidate arguments.
#[derive(Debug, Clone)]
pub struct ScannedCall<'a> {
    pub call: &'a CallExpr,
    /// Ordinals of arguments whose expression is directly `$"..."`.
    pub candidates: Vec<usize>,
}

/// Every invocation in `method`, outer calls before the calls nested in
/// their callee or arguments, siblings in source order.
///
/// Lambdas, local functions and interpolation holes are descended into.
/// `new T(...)` is not an invocation.
pub fn call_sites(method: &MethodDecl) -> Vec<&CallExpr> {
    let mut collector = CallCollector::default();
    collector.visit_method(method);
    collector.calls
}

/// Positions of arguments that are an interpolated string literal as a
/// whole. Parenthesized, concatenated or cast literals do not count.
pub fn candidate_positions(call: &CallExpr) -> Vec<usize> {
    call.args
        .iter()
        .enumerate()
        .filter(|(_, arg)| arg.expr.is_interpolated())
        .map(|(ordinal, _)| ordinal)
        .collect()
}

/// Invocations of `method` that have at least one candidate argument.
pub fn scan(method: &MethodDecl) -> Vec<ScannedCall<'_>> {
    call_sites(method)
        .into_iter()
        .filter_map(|call| {
            let candidates = candidate_positions(call);
            (!candidates.is_empty()).then_some(ScannedCall { call, candidates })
        })
        .collect()
}

#[derive(Default)]
struct CallCollector<'ast> {
    calls: Vec<&'ast CallExpr>,
}

impl<'ast> Visit<'ast> for CallCollector<'ast> {
    fn visit_call(&mut self, call: &'ast CallExpr) {
        self.calls.push(call);
        walk_call(self, call);
    }
}
