//! Finding construction and the diagnostic's fixed identity.

use crate::issues::FormattableStringIssue;
use crate::semantic::{CalleeSymbol, ParameterDescriptor};
use crate::syntax::Document;
use crate::syntax::tree::Argument;

pub const DIAGNOSTIC_ID: &str = "PreserveFormattableStringForObjParams";

pub const TITLE: &str = "An Interpolated string ($\"...\") is cast to normal string during argument \
    passing. This will lose information about raw data value. Raw values should be preserved by \
    passing it as FormattableString.";

pub const MESSAGE: &str =
    "Raw data values from interpolated string are lost due to cast to an object.";

pub const DESCRIPTION: &str = "An interpolated string is being passed to an 'object' parameter, \
    this will cast it to a normal string and lose information about raw data values. Raw values \
    should be preserved by passing it as FormattableString.";

pub const CATEGORY: &str = "FormattableString";

/// Finding for `arg`, located at the first character of the argument.
pub fn emit(
    document: &Document,
    arg: &Argument,
    param: &ParameterDescriptor,
    callee: &CalleeSymbol,
) -> FormattableStringIssue {
    FormattableStringIssue {
        context: document.source_context(arg.span.start),
        span: arg.span,
        argument: document.slice(arg.span).to_string(),
        parameter: param.name.clone(),
        callee: format!("{}.{}", callee.containing_type, callee.name),
    }
}
