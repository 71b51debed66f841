//! Argument to parameter binding.

use thiserror::Error;

use crate::semantic::{CalleeSymbol, ParameterDescriptor, is_object_type};
use crate::syntax::tree::Argument;

/// An argument that cannot be bound. The whole call is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("no parameter named `{0}`")]
    UnknownName(String),
    #[error("more than one parameter named `{0}`")]
    AmbiguousName(String),
    #[error("no parameter at position {0}")]
    OutOfRange(usize),
}

/// Bind every argument of a call to a parameter of `callee`.
///
/// A named argument binds to the parameter with that name. Otherwise an
/// argument at or past the position of a trailing `params` parameter binds
/// to it, and any other argument binds by position.
pub fn bind_arguments<'s>(
    args: &[Argument],
    callee: &'s CalleeSymbol,
) -> Result<Vec<&'s ParameterDescriptor>, BindingError> {
    let params = callee.parameters();
    let variadic = callee.variadic();

    args.iter()
        .enumerate()
        .map(|(ordinal, arg)| {
            if let Some(name) = &arg.name {
                let name = name.value();
                let mut matching = params.iter().filter(|p| p.name == name);
                return match (matching.next(), matching.next()) {
                    (Some(param), None) => Ok(param),
                    (None, _) => Err(BindingError::UnknownName(name.to_string())),
                    (Some(_), Some(_)) => Err(BindingError::AmbiguousName(name.to_string())),
                };
            }
            if let Some(param) = variadic
                && ordinal >= param.ordinal
            {
                return Ok(param);
            }
            params.get(ordinal).ok_or(BindingError::OutOfRange(ordinal))
        })
        .collect()
}

/// Whether an argument bound to `param` is converted to `object`.
pub fn converts_to_object(param: &ParameterDescriptor) -> bool {
    param
        .effective_type()
        .is_some_and(|ty| is_object_type(&ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_source;
    use crate::syntax::tree::{Body, Expr, Stmt};

    /// Symbol of the second method and arguments of the call in the first.
    fn setup(source: &str) -> (CalleeSymbol, Vec<Argument>) {
        let unit = parse_source(source).unwrap();
        let bodies = unit.method_bodies();
        let Some(Body::Block(block)) = &bodies[0].method.body else {
            panic!("expected block body");
        };
        let Stmt::Expr {
            expr: Expr::Call(call),
            ..
        } = &block.stmts[0]
        else {
            panic!("expected call statement");
        };
        let symbol = CalleeSymbol::from_decl(bodies[1].method, "C").unwrap();
        (symbol, call.args.clone())
    }

    fn bound_names(source: &str) -> Result<Vec<String>, BindingError> {
        let (symbol, args) = setup(source);
        bind_arguments(&args, &symbol).map(|params| params.iter().map(|p| p.name.clone()).collect())
    }

    #[test]
    fn test_positional_binding() {
        let names = bound_names("class C { void M() { Foo(1, 2); } void Foo(object a, string b) { } }");
        assert_eq!(names.unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_named_binding_out_of_order() {
        let names =
            bound_names("class C { void M() { Foo(b: 1, a: 2); } void Foo(object a, object b) { } }");
        assert_eq!(names.unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_verbatim_names_match() {
        let names =
            bound_names("class C { void M() { Foo(@class: 1); } void Foo(object @class) { } }");
        assert_eq!(names.unwrap(), vec!["class"]);
    }

    #[test]
    fn test_variadic_tail_binding() {
        let names = bound_names(
            "class C { void M() { Foo(\"f\", 1, 2, 3); } void Foo(string format, params object[] args) { } }",
        );
        assert_eq!(names.unwrap(), vec!["format", "args", "args", "args"]);
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = bound_names("class C { void M() { Foo(nope: 1); } void Foo(object a) { } }");
        assert_eq!(err.unwrap_err(), BindingError::UnknownName("nope".to_string()));
    }

    #[test]
    fn test_too_many_positional_fails() {
        let err = bound_names("class C { void M() { Foo(1, 2); } void Foo(object a) { } }");
        assert_eq!(err.unwrap_err(), BindingError::OutOfRange(1));
    }

    #[test]
    fn test_converts_to_object() {
        let (symbol, _) = setup(
            r#"class C { void M() { Foo(); }
               void Foo(object a, object? b, System.Object c, string d, params object[] e) { } }"#,
        );
        let converts: Vec<bool> = symbol.parameters().iter().map(converts_to_object).collect();
        assert_eq!(converts, vec![true, true, true, false, true]);
    }

    #[test]
    fn test_params_of_other_element_types_do_not_convert() {
        let (symbol, _) =
            setup("class C { void M() { Foo(); } void Foo(params string[] e) { } }");
        assert!(!converts_to_object(&symbol.parameters()[0]));

        let (symbol, _) =
            setup("class C { void M() { Foo(); } void Foo(object[] notParams) { } }");
        assert!(!converts_to_object(&symbol.parameters()[0]));
    }
}
