//! Project-wide declaration index.
//!
//! Every method and local function declared in the analysed files is indexed
//! by simple name. Resolution narrows the overloads by the shape of the call
//! (receiver, argument count, argument names) and gives up on anything it
//! cannot pin down to one declaration.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::{CallSite, CalleeSymbol, SemanticModel, is_object_type};
use crate::syntax::tree::{
    Argument, Expr, LambdaExpr, Member, MethodDecl, MethodKind, QueryExpr, SourceUnit, Stmt,
    TypeDecl, TypeRef, Visit, walk_expr, walk_method, walk_stmt,
};

/// How an indexed method can be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// As declared.
    Ordinary,
    /// Extension method called on a receiver: `value.Log(x)`.
    ReducedExtension,
}

#[derive(Debug, Clone)]
struct IndexedMethod {
    symbol: CalleeSymbol,
    form: Form,
    /// Type of the `this` parameter of an extension method.
    extends: Option<TypeRef>,
}

/// What the receiver of `receiver.Method(...)` is known to be.
#[derive(Debug, Clone, Copy)]
enum Receiver<'r> {
    /// `this` or `base`.
    Current,
    /// A project type named directly, for a static call.
    Type(&'r str),
    /// A value whose declared type is known.
    Value(&'r TypeRef),
    /// A value of unknown type.
    Unknown,
}

/// Declarations of every method in a set of source units.
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    by_name: HashMap<String, Vec<IndexedMethod>>,
    types: HashSet<String>,
    /// Declared types of fields and properties, by type name then member name.
    fields: HashMap<String, HashMap<String, TypeRef>>,
}

impl DeclarationIndex {
    pub fn build<'a>(units: impl IntoIterator<Item = &'a SourceUnit>) -> Self {
        let mut index = Self::default();
        for unit in units {
            index.add_unit(unit);
        }
        index
    }

    pub fn add_unit(&mut self, unit: &SourceUnit) {
        for body in unit.method_bodies() {
            self.types.insert(body.containing_type.name.clone());
            self.add_method(body.method, &body.containing_type.name);

            let mut locals = LocalFunctions::default();
            locals.visit_method(body.method);
            for local in locals.found {
                self.add_method(local, &body.containing_type.name);
            }
        }
        for ty in &unit.types {
            self.add_type(ty);
        }
    }

    /// Number of indexed declarations, reduced forms not counted.
    pub fn len(&self) -> usize {
        self.by_name
            .values()
            .flatten()
            .filter(|m| m.form == Form::Ordinary)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_type(&mut self, ty: &TypeDecl) {
        self.types.insert(ty.name.clone());
        for member in &ty.members {
            match member {
                Member::Type(nested) => self.add_type(nested),
                Member::Field(field) => {
                    self.fields
                        .entry(ty.name.clone())
                        .or_default()
                        .insert(field.name.value().to_string(), field.ty.clone());
                }
                Member::Method(_) | Member::Other(_) => {}
            }
        }
    }

    fn add_method(&mut self, method: &MethodDecl, containing_type: &str) {
        // constructors are only reachable through `new`, which is not a call site
        if method.kind == MethodKind::Constructor {
            return;
        }
        let Some(symbol) = CalleeSymbol::from_decl(method, containing_type) else {
            trace!(method = %method.name.text, "params parameter is not last; not indexed");
            return;
        };
        let entries = self.by_name.entry(symbol.name.clone()).or_default();
        if CalleeSymbol::is_extension(method) {
            entries.push(IndexedMethod {
                symbol: symbol.reduced(),
                form: Form::ReducedExtension,
                extends: method.parameters.first().map(|p| p.ty.clone()),
            });
        }
        entries.push(IndexedMethod {
            symbol,
            form: Form::Ordinary,
            extends: None,
        });
    }

    fn field_type(&self, containing_type: &str, name: &str) -> Option<&TypeRef> {
        self.fields.get(containing_type)?.get(name)
    }

    /// Classify the receiver of a member call. Locals shadow fields, which
    /// shadow type names.
    fn receiver<'r>(
        &'r self,
        target: &'r Expr,
        method: Option<&'r MethodDecl>,
        containing_type: &str,
    ) -> Receiver<'r> {
        match target {
            Expr::Name(name) if name.type_args.is_empty() => {
                let name = name.name.strip_prefix('@').unwrap_or(&name.name);
                if name == "this" || name == "base" {
                    return Receiver::Current;
                }
                if let Some(declared) = method.and_then(|m| local_type(m, name)) {
                    return declared.map_or(Receiver::Unknown, Receiver::Value);
                }
                if let Some(ty) = self.field_type(containing_type, name) {
                    return Receiver::Value(ty);
                }
                if self.types.contains(name) {
                    return Receiver::Type(name);
                }
                Receiver::Unknown
            }
            Expr::Member(member) if member.type_args.is_empty() => {
                let name = member.name.value();
                if matches!(member.target.as_ref(), Expr::Name(n) if n.name == "this") {
                    return self
                        .field_type(containing_type, name)
                        .map_or(Receiver::Unknown, Receiver::Value);
                }
                // namespace-qualified type: `Logging.Audit.Write(...)`
                if self.types.contains(name) && is_dotted_name(&member.target) {
                    return Receiver::Type(name);
                }
                Receiver::Unknown
            }
            Expr::New(creation) => creation
                .ty
                .as_ref()
                .map_or(Receiver::Unknown, Receiver::Value),
            Expr::Paren(paren) => self.receiver(&paren.inner, method, containing_type),
            _ => Receiver::Unknown,
        }
    }

    /// Candidates the callee expression can refer to, before looking at the
    /// arguments.
    fn candidates<'s>(&'s self, site: &CallSite<'_>) -> Vec<&'s IndexedMethod> {
        let Some(name) = site.call.method_name() else {
            return Vec::new();
        };
        let Some(all) = self.by_name.get(name) else {
            return Vec::new();
        };
        let ordinary_in = move |ty: &str| {
            all.iter()
                .filter(|m| m.form == Form::Ordinary && m.symbol.containing_type == ty)
                .collect::<Vec<_>>()
        };
        let ordinary_here = || {
            let local = ordinary_in(site.containing_type);
            if local.is_empty() {
                all.iter().filter(|m| m.form == Form::Ordinary).collect()
            } else {
                local
            }
        };
        let extensions = move |receiver: Option<&TypeRef>| {
            all.iter()
                .filter(|m| m.form == Form::ReducedExtension)
                .filter(|m| match (receiver, &m.extends) {
                    (Some(receiver), Some(extends)) => {
                        is_object_type(extends)
                            || (simple_name(extends) == simple_name(receiver)
                                && extends.array_rank == receiver.array_rank)
                    }
                    _ => true,
                })
                .collect::<Vec<_>>()
        };

        match site.call.callee.as_ref() {
            Expr::Name(_) => ordinary_here(),
            Expr::Member(member) => {
                match self.receiver(&member.target, site.method, site.containing_type) {
                    Receiver::Current => ordinary_here(),
                    Receiver::Type(ty) => ordinary_in(ty),
                    Receiver::Value(ty) => {
                        let instance = match ty.array_rank {
                            0 => ordinary_in(simple_name(ty)),
                            _ => Vec::new(),
                        };
                        if instance.is_empty() {
                            extensions(Some(ty))
                        } else {
                            instance
                        }
                    }
                    Receiver::Unknown => extensions(None),
                }
            }
            _ => Vec::new(),
        }
    }
}

impl SemanticModel for DeclarationIndex {
    fn resolve_callee(&self, site: &CallSite<'_>) -> Option<&CalleeSymbol> {
        let mut applicable: Vec<&CalleeSymbol> = self
            .candidates(site)
            .into_iter()
            .map(|m| &m.symbol)
            .filter(|symbol| is_applicable(symbol, &site.call.args))
            .collect();
        dedup_signatures(&mut applicable);

        // a method applicable without expanding `params` wins
        if applicable.len() > 1 && applicable.iter().any(|s| s.variadic().is_none()) {
            applicable.retain(|s| s.variadic().is_none());
        }
        match applicable.as_slice() {
            [symbol] => Some(*symbol),
            _ => {
                trace!(
                    method = site.call.method_name().unwrap_or_default(),
                    candidates = applicable.len(),
                    "callee not resolved"
                );
                None
            }
        }
    }
}

/// Last segment of a type name: `List` for `System.Collections.Generic.List<T>`.
fn simple_name(ty: &TypeRef) -> &str {
    let name = ty.name.rsplit("::").next().unwrap_or(&ty.name);
    name.rsplit('.').next().unwrap_or(name)
}

/// `A` or `A.B.C` made of plain names only.
fn is_dotted_name(expr: &Expr) -> bool {
    match expr {
        Expr::Name(name) => name.type_args.is_empty(),
        Expr::Member(member) => member.type_args.is_empty() && is_dotted_name(&member.target),
        _ => false,
    }
}

/// Declared type of the local or parameter `name` anywhere in `method`,
/// local functions and lambdas included.
///
/// `None` when nothing in the method declares `name`. `Some(None)` when it is
/// declared without a usable type: `var` without `new T(...)`, a lambda
/// parameter, or declarations that disagree.
fn local_type<'m>(method: &'m MethodDecl, name: &str) -> Option<Option<&'m TypeRef>> {
    let mut locals = LocalDeclarations {
        name,
        found: Vec::new(),
    };
    locals.visit_method(method);

    let (first, rest) = locals.found.split_first()?;
    let agreed = (*first).filter(|ty| {
        rest.iter()
            .all(|other| matches!(other, Some(other) if other.to_string() == ty.to_string()))
    });
    Some(agreed)
}

struct LocalDeclarations<'n, 'ast> {
    name: &'n str,
    found: Vec<Option<&'ast TypeRef>>,
}

impl<'ast> Visit<'ast> for LocalDeclarations<'_, 'ast> {
    fn visit_method(&mut self, method: &'ast MethodDecl) {
        for param in &method.parameters {
            if param.name.value() == self.name {
                self.found.push(Some(&param.ty));
            }
        }
        walk_method(self, method);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if let Stmt::Local { ty, declarators, .. } = stmt {
            for declarator in declarators {
                if declarator.name.value() != self.name {
                    continue;
                }
                let declared = match ty {
                    Some(ty) if ty.name != "var" => Some(ty),
                    _ => match &declarator.init {
                        Some(Expr::New(creation)) => creation.ty.as_ref(),
                        _ => None,
                    },
                };
                self.found.push(declared);
            }
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        let untyped = match expr {
            Expr::Lambda(LambdaExpr { parameters, .. }) => parameters.as_slice(),
            Expr::Query(QueryExpr { variables, .. }) => variables.as_slice(),
            _ => &[],
        };
        if untyped.iter().any(|p| p.value() == self.name) {
            self.found.push(None);
        }
        walk_expr(self, expr);
    }
}

/// Whether `args` can be bound to the parameters of `symbol`.
fn is_applicable(symbol: &CalleeSymbol, args: &[Argument]) -> bool {
    let params = symbol.parameters();
    let variadic = symbol.variadic().is_some();

    let positional = args.iter().filter(|a| a.name.is_none()).count();
    if !variadic && positional > params.len() {
        return false;
    }

    let mut bound = vec![false; params.len()];
    for slot in bound.iter_mut().take(positional) {
        *slot = true;
    }
    for arg in args {
        let Some(name) = &arg.name else { continue };
        match params.iter().position(|p| p.name == name.value()) {
            Some(ordinal) => bound[ordinal] = true,
            None => return false,
        }
    }

    params
        .iter()
        .zip(bound)
        .all(|(param, bound)| bound || param.has_default || param.is_variadic)
}

/// Drop repeated declarations of the same signature, such as the two halves
/// of a partial method.
fn dedup_signatures(symbols: &mut Vec<&CalleeSymbol>) {
    let mut seen = HashSet::new();
    symbols.retain(|symbol| {
        let signature: Vec<(String, String, bool)> = symbol
            .parameters()
            .iter()
            .map(|p| (p.name.clone(), p.ty.to_string(), p.is_variadic))
            .collect();
        seen.insert((symbol.containing_type.clone(), signature))
    });
}

#[derive(Default)]
struct LocalFunctions<'ast> {
    found: Vec<&'ast MethodDecl>,
}

impl<'ast> Visit<'ast> for LocalFunctions<'ast> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if let Stmt::LocalFunction(method) = stmt {
            self.found.push(method);
        }
        walk_stmt(self, stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_source;
    use crate::syntax::tree::{CallExpr, walk_call};

    /// Resolve the first call to `method` found in `source`.
    fn resolve(source: &str, method: &str) -> Option<CalleeSymbol> {
        let unit = parse_source(source).unwrap();
        let index = DeclarationIndex::build([&unit]);
        for body in unit.method_bodies() {
            let mut calls = Calls::default();
            calls.visit_method(body.method);
            if let Some(call) = calls.found.iter().find(|c| c.method_name() == Some(method)) {
                let site = CallSite {
                    call,
                    containing_type: &body.containing_type.name,
                    method: Some(body.method),
                };
                return index.resolve_callee(&site).cloned();
            }
        }
        panic!("no call to {method}");
    }

    #[derive(Default)]
    struct Calls<'ast> {
        found: Vec<&'ast CallExpr>,
    }

    impl<'ast> Visit<'ast> for Calls<'ast> {
        fn visit_call(&mut self, call: &'ast CallExpr) {
            self.found.push(call);
            walk_call(self, call);
        }
    }

    fn param_names(symbol: &CalleeSymbol) -> Vec<&str> {
        symbol.parameters().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_resolves_method_in_same_type() {
        let symbol = resolve(
            "class C { void Bar() { Foo(1); } void Foo(object obj) { } }",
            "Foo",
        )
        .unwrap();
        assert_eq!(symbol.containing_type, "C");
        assert_eq!(param_names(&symbol), vec!["obj"]);
    }

    #[test]
    fn test_unknown_method_is_unresolved() {
        assert!(resolve("class C { void Bar() { Console.WriteLine(1); } }", "WriteLine").is_none());
    }

    #[test]
    fn test_overloads_narrowed_by_arity() {
        let source = r#"class C {
            void Bar() { Foo(1, 2); }
            void Foo(object a) { }
            void Foo(object a, object b) { }
        }"#;
        let symbol = resolve(source, "Foo").unwrap();
        assert_eq!(param_names(&symbol), vec!["a", "b"]);
    }

    #[test]
    fn test_overloads_of_same_arity_are_ambiguous() {
        let source = r#"class C {
            void Bar() { Foo($"x{1}"); }
            void Foo(object a) { }
            void Foo(string a) { }
        }"#;
        assert!(resolve(source, "Foo").is_none());
    }

    #[test]
    fn test_named_arguments_select_overload() {
        let source = r#"class C {
            void Bar() { Foo(1, second: 2); }
            void Foo(object first, object other) { }
            void Foo(object first, object second) { }
        }"#;
        let symbol = resolve(source, "Foo").unwrap();
        assert_eq!(param_names(&symbol), vec!["first", "second"]);
    }

    #[test]
    fn test_optional_parameters_and_params() {
        let source = r#"class C {
            void Bar() { Log("a"); Write("b", 1, 2, 3); }
            void Log(string message, object state = null) { }
            void Write(string format, params object[] args) { }
        }"#;
        assert!(resolve(source, "Log").is_some());
        let write = resolve(source, "Write").unwrap();
        assert!(write.variadic().is_some());
    }

    #[test]
    fn test_normal_form_preferred_over_params() {
        let source = r#"class C {
            void Bar() { Foo(1); }
            void Foo(object a) { }
            void Foo(params object[] rest) { }
        }"#;
        let symbol = resolve(source, "Foo").unwrap();
        assert!(symbol.variadic().is_none());
    }

    #[test]
    fn test_qualified_call_restricted_to_named_type() {
        let source = r#"
        class A { public static void Foo(object x) { } }
        class B {
            public static void Foo(string x) { }
            void Bar() { A.Foo(1); }
        }"#;
        let symbol = resolve(source, "Foo").unwrap();
        assert_eq!(symbol.containing_type, "A");
    }

    #[test]
    fn test_extension_method_on_receiver_uses_reduced_form() {
        let source = r#"
        static class Extensions { public static void Log(this string self, object value) { } }
        class C { void Bar(string s) { s.Log(1); } }"#;
        let symbol = resolve(source, "Log").unwrap();
        assert_eq!(param_names(&symbol), vec!["value"]);
        assert_eq!(symbol.parameters()[0].ordinal, 0);
    }

    #[test]
    fn test_call_on_foreign_local_ignores_project_methods() {
        let source = r#"
        class Bag { public void Add(object item) { } }
        class C { void Bar() { var names = new List<string>(); names.Add($"user {1}"); } }"#;
        assert!(resolve(source, "Add").is_none());
    }

    #[test]
    fn test_call_on_unknown_receiver_ignores_project_methods() {
        let source = r#"
        class Bag { public void Add(object item) { } }
        class C { void Bar(List<string> names) { names.Add(1); GetItems().Add(2); } }"#;
        assert!(resolve(source, "Add").is_none());
    }

    #[test]
    fn test_receiver_declared_type_selects_instance_method() {
        let source = r#"
        class Bag { public void Add(object item) { } }
        class Sink { public void Add(string item) { } }
        class C {
            private Bag _bag;
            void Bar(Sink sink) { _bag.Add(1); }
        }"#;
        let symbol = resolve(source, "Add").unwrap();
        assert_eq!(symbol.containing_type, "Bag");

        let source = r#"
        class Bag { public void Add(object item) { } }
        class Sink { public void Add(string item) { } }
        class C { void Bar() { Sink bag = new Sink(); bag.Add("x"); } }"#;
        let symbol = resolve(source, "Add").unwrap();
        assert_eq!(symbol.containing_type, "Sink");
    }

    #[test]
    fn test_local_shadows_field_of_same_name() {
        let source = r#"
        class Bag { public void Add(object item) { } }
        class C {
            private Bag items;
            void Bar() { var items = new List<int>(); items.Add(1); }
        }"#;
        assert!(resolve(source, "Add").is_none());
    }

    #[test]
    fn test_extension_filtered_by_receiver_type() {
        let source = r#"
        static class Extensions {
            public static void Log(this ILogger self, object value) { }
            public static void Log(this Stream self, object value, int level) { }
        }
        class C { void Bar(ILogger logger) { logger.Log(1); } }"#;
        let symbol = resolve(source, "Log").unwrap();
        assert_eq!(param_names(&symbol), vec!["value"]);

        let source = r#"
        static class Extensions { public static void Log(this ILogger self, object value) { } }
        class C { void Bar(Stream stream) { stream.Log(1); } }"#;
        assert!(resolve(source, "Log").is_none());
    }

    #[test]
    fn test_this_member_receiver_uses_field_type() {
        let source = r#"
        class Bag { public void Add(object item) { } }
        class C {
            List<int> Items { get; }
            void Bar() { this.Items.Add(1); }
        }"#;
        assert!(resolve(source, "Add").is_none());
    }

    #[test]
    fn test_local_function_is_indexed() {
        let source = r#"class C {
            void Bar() {
                Local(1);
                void Local(object o) { }
            }
        }"#;
        let symbol = resolve(source, "Local").unwrap();
        assert_eq!(param_names(&symbol), vec!["o"]);
    }

    #[test]
    fn test_partial_method_halves_are_one_symbol() {
        let source = r#"partial class C {
            partial void Foo(object o);
            partial void Foo(object o) { }
            void Bar() { Foo(1); }
        }"#;
        assert!(resolve(source, "Foo").is_some());
    }

    #[test]
    fn test_index_len_counts_declarations() {
        let unit = parse_source(
            "static class E { static void A(this string s) { } void B() { } E() { } }",
        )
        .unwrap();
        let index = DeclarationIndex::build([&unit]);
        assert_eq!(index.len(), 2);
    }
}
