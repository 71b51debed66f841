//! Syntax tree for the C# subset.
//!
//! Every node kind is a variant of a closed enum so traversals match
//! exhaustively. Nodes carry the byte span of the source text they were parsed
//! from; nodes created by a rewrite reuse the span of the node they wrap and
//! are marked [`Origin::Synthetic`].

use super::lexer::Keyword;
use super::span::Span;

// ============================================================
// Declarations
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub types: Vec<TypeDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    /// Enclosing namespace, if any (`A.B` for nested namespace blocks).
    pub namespace: Option<String>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Method(MethodDecl),
    Type(TypeDecl),
    /// Field or property. Only the declared type is kept.
    Field(FieldDecl),
    /// Event, indexer, operator or enum: not analysed.
    Other(Span),
}

/// `Type name ...;` or `Type Name { get; }`. Only the first declarator of
/// `Type a, b;` is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub ty: TypeRef,
    pub name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
    LocalFunction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub name: Ident,
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<ParameterDecl>,
    pub is_static: bool,
    pub body: Option<Body>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Block(Block),
    Expression(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamModifier {
    Params,
    Ref,
    Out,
    In,
    This,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub modifier: Option<ParamModifier>,
    pub default: Option<Expr>,
    pub span: Span,
}

impl ParameterDecl {
    pub fn is_params(&self) -> bool {
        self.modifier == Some(ParamModifier::Params)
    }
}

/// A type as written: `object`, `System.Object`, `List<int>`, `object?[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Dotted name as written, alias qualifier included (`global::System.Object`).
    pub name: String,
    pub type_args: Vec<TypeRef>,
    pub array_rank: usize,
    pub nullable: bool,
    pub span: Span,
}

impl TypeRef {
    /// Type of the elements when this is an array type.
    pub fn element_type(&self) -> Option<TypeRef> {
        (self.array_rank > 0).then(|| TypeRef {
            array_rank: self.array_rank - 1,
            nullable: false,
            ..self.clone()
        })
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_args.is_empty() {
            let args: Vec<String> = self.type_args.iter().map(|t| t.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        for _ in 0..self.array_rank {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// Text as written; a verbatim identifier keeps its `@`.
    pub text: String,
    pub span: Span,
}

impl Ident {
    /// Identifier value with any verbatim `@` prefix removed.
    pub fn value(&self) -> &str {
        self.text.strip_prefix('@').unwrap_or(&self.text)
    }
}

// ============================================================
// Statements
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Return,
    Throw,
    YieldReturn,
    YieldBreak,
    Break,
    Continue,
    Goto,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Block),
    Expr {
        expr: Expr,
        span: Span,
    },
    Local {
        ty: Option<TypeRef>,
        declarators: Vec<Declarator>,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    /// `while`, `do`, `for`, `foreach`, `lock`, `using`, `fixed` and
    /// `checked` blocks: header expressions followed by a body.
    Loop {
        keyword: Keyword,
        header: Vec<Stmt>,
        body: Box<Stmt>,
        span: Span,
    },
    Switch {
        governing: Expr,
        sections: Vec<SwitchSection>,
        span: Span,
    },
    Jump {
        kind: JumpKind,
        value: Option<Expr>,
        span: Span,
    },
    Try {
        block: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
        span: Span,
    },
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
        span: Span,
    },
    LocalFunction(Box<MethodDecl>),
    Empty(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    /// `when` guards of the section's case labels; patterns are not modelled.
    pub guards: Vec<Expr>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub filter: Option<Expr>,
    pub block: Block,
    pub span: Span,
}

// ============================================================
// Expressions
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Parsed from the document text.
    Source,
    /// Created by a rewrite; rendered from its operand.
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Char,
    True,
    False,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Await,
    AddressOf,
    Deref,
    NullForgiving,
    FromEnd,
    Ref,
    /// `..x`, `x..` or a collection spread.
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    CompoundAssign,
    Coalesce,
    CoalesceAssign,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    As,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Range,
    /// `record with { ... }`; the right operand is an initializer.
    With,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(NameExpr),
    Literal(LiteralExpr),
    Interpolated(InterpolatedString),
    Member(MemberAccess),
    Call(CallExpr),
    Index(ElementAccess),
    New(ObjectCreation),
    Cast(CastExpr),
    Paren(ParenExpr),
    Tuple(TupleExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Conditional(ConditionalExpr),
    Lambda(LambdaExpr),
    Is(IsExpr),
    Switch(SwitchExpr),
    Initializer(InitializerExpr),
    TypeOperator(TypeOperatorExpr),
    Declaration(DeclarationExpr),
    Throw(ThrowExpr),
    Query(QueryExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name(e) => e.span,
            Expr::Literal(e) => e.span,
            Expr::Interpolated(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::New(e) => e.span,
            Expr::Cast(e) => e.span,
            Expr::Paren(e) => e.span,
            Expr::Tuple(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Conditional(e) => e.span,
            Expr::Lambda(e) => e.span,
            Expr::Is(e) => e.span,
            Expr::Switch(e) => e.span,
            Expr::Initializer(e) => e.span,
            Expr::TypeOperator(e) => e.span,
            Expr::Declaration(e) => e.span,
            Expr::Throw(e) => e.span,
            Expr::Query(e) => e.span,
        }
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, Expr::Interpolated(_))
    }
}

/// Identifier, `this`, `base` or a predefined type keyword used as a value.
#[derive(Debug, Clone, PartialEq)]
pub struct NameExpr {
    pub name: String,
    pub type_args: Vec<TypeRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub kind: LiteralKind,
    pub span: Span,
}

/// `$"text {expr,alignment:format} text"`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedString {
    pub holes: Vec<Interpolation>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pub expr: Expr,
    pub alignment: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub target: Box<Expr>,
    pub name: Ident,
    pub type_args: Vec<TypeRef>,
    /// `?.` rather than `.`.
    pub conditional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Argument>,
    pub span: Span,
}

impl CallExpr {
    /// Simple name of the invoked method (`Foo` for `a.b.Foo<T>(...)`).
    pub fn method_name(&self) -> Option<&str> {
        match self.callee.as_ref() {
            Expr::Name(name) => Some(name.name.strip_prefix('@').unwrap_or(&name.name)),
            Expr::Member(member) => Some(member.name.value()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgModifier {
    Ref,
    Out,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Explicit parameter name of a named argument (`name: expr`).
    pub name: Option<Ident>,
    pub modifier: Option<ArgModifier>,
    pub expr: Expr,
    /// Covers the name prefix, when present, and the expression.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementAccess {
    pub target: Box<Expr>,
    pub args: Vec<Argument>,
    pub conditional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCreation {
    /// `None` for target-typed `new(...)` and anonymous objects.
    pub ty: Option<TypeRef>,
    pub args: Vec<Argument>,
    pub initializer: Option<InitializerExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub ty: TypeRef,
    pub operand: Box<Expr>,
    pub origin: Origin,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub inner: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpr {
    pub elements: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub condition: Box<Expr>,
    pub when_true: Box<Expr>,
    pub when_false: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub parameters: Vec<Ident>,
    pub body: LambdaBody,
    pub span: Span,
}

/// `expr is pattern`; the pattern is not modelled.
#[derive(Debug, Clone, PartialEq)]
pub struct IsExpr {
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArm {
    pub guard: Option<Expr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchExpr {
    pub governing: Box<Expr>,
    pub arms: Vec<SwitchArm>,
    pub span: Span,
}

/// `{ a, b }` or `{ X = a, [k] = b }` after `new`, or a bare array initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializerExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

/// `typeof(T)`, `sizeof(T)`, `default(T)` or bare `default`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOperatorExpr {
    pub keyword: Keyword,
    pub span: Span,
}

/// `var x` / `int x` in an `out` argument or deconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationExpr {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowExpr {
    pub operand: Box<Expr>,
    pub span: Span,
}

/// LINQ query: `from x in xs where ... select ...`. Clause keywords are not
/// modelled; only the expressions they carry, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpr {
    /// Range variables from `from`, `join`, `let` and `into`.
    pub variables: Vec<Ident>,
    pub clauses: Vec<Expr>,
    pub span: Span,
}

// ============================================================
// Method bodies
// ============================================================

/// A method or constructor body together with the type declaring it.
#[derive(Debug, Clone, Copy)]
pub struct MethodBody<'a> {
    pub method: &'a MethodDecl,
    pub containing_type: &'a TypeDecl,
}

impl SourceUnit {
    /// Every method and constructor declared in the unit, nested types included,
    /// in source order.
    pub fn method_bodies(&self) -> Vec<MethodBody<'_>> {
        let mut bodies = Vec::new();
        for ty in &self.types {
            collect_bodies(ty, &mut bodies);
        }
        bodies
    }
}

fn collect_bodies<'a>(ty: &'a TypeDecl, out: &mut Vec<MethodBody<'a>>) {
    for member in &ty.members {
        match member {
            Member::Method(method) => out.push(MethodBody {
                method,
                containing_type: ty,
            }),
            Member::Type(nested) => collect_bodies(nested, out),
            Member::Field(_) | Member::Other(_) => {}
        }
    }
}

// ============================================================
// Visitors
// ============================================================

/// Read-only traversal in source order. Override a `visit_*` method and call
/// the matching `walk_*` function to keep descending. Nodes are borrowed for
/// `'ast`, so visitors may keep references to them.
pub trait Visit<'ast> {
    fn visit_method(&mut self, method: &'ast MethodDecl) {
        walk_method(self, method)
    }

    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block)
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr)
    }

    fn visit_call(&mut self, call: &'ast CallExpr) {
        walk_call(self, call)
    }

    fn visit_argument(&mut self, arg: &'ast Argument) {
        walk_argument(self, arg)
    }

    fn visit_interpolated(&mut self, string: &'ast InterpolatedString) {
        walk_interpolated(self, string)
    }

    fn visit_cast(&mut self, cast: &'ast CastExpr) {
        walk_cast(self, cast)
    }
}

pub fn walk_method<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, method: &'ast MethodDecl) {
    for param in &method.parameters {
        if let Some(default) = &param.default {
            v.visit_expr(default);
        }
    }
    match &method.body {
        Some(Body::Block(block)) => v.visit_block(block),
        Some(Body::Expression(expr)) => v.visit_expr(expr),
        None => {}
    }
}

pub fn walk_block<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Block(block) => v.visit_block(block),
        Stmt::Expr { expr, .. } => v.visit_expr(expr),
        Stmt::Local { declarators, .. } => {
            for declarator in declarators {
                if let Some(init) = &declarator.init {
                    v.visit_expr(init);
                }
            }
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            v.visit_expr(condition);
            v.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        Stmt::Loop { header, body, .. } => {
            for part in header {
                v.visit_stmt(part);
            }
            v.visit_stmt(body);
        }
        Stmt::Switch {
            governing,
            sections,
            ..
        } => {
            v.visit_expr(governing);
            for section in sections {
                for guard in &section.guards {
                    v.visit_expr(guard);
                }
                for stmt in &section.stmts {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Jump { value, .. } => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::Try {
            block,
            catches,
            finally,
            ..
        } => {
            v.visit_block(block);
            for catch in catches {
                if let Some(filter) = &catch.filter {
                    v.visit_expr(filter);
                }
                v.visit_block(&catch.block);
            }
            if let Some(finally) = finally {
                v.visit_block(finally);
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::LocalFunction(method) => v.visit_method(method),
        Stmt::Empty(_) => {}
    }
}

pub fn walk_expr<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    match expr {
        Expr::Name(_)
        | Expr::Literal(_)
        | Expr::TypeOperator(_)
        | Expr::Declaration(_) => {}
        Expr::Interpolated(string) => v.visit_interpolated(string),
        Expr::Member(member) => v.visit_expr(&member.target),
        Expr::Call(call) => v.visit_call(call),
        Expr::Index(access) => {
            v.visit_expr(&access.target);
            for arg in &access.args {
                v.visit_argument(arg);
            }
        }
        Expr::New(creation) => {
            for arg in &creation.args {
                v.visit_argument(arg);
            }
            if let Some(init) = &creation.initializer {
                for element in &init.elements {
                    v.visit_expr(element);
                }
            }
        }
        Expr::Cast(cast) => v.visit_cast(cast),
        Expr::Paren(paren) => v.visit_expr(&paren.inner),
        Expr::Tuple(tuple) => {
            for element in &tuple.elements {
                v.visit_argument(element);
            }
        }
        Expr::Unary(unary) => v.visit_expr(&unary.operand),
        Expr::Binary(binary) => {
            v.visit_expr(&binary.left);
            v.visit_expr(&binary.right);
        }
        Expr::Conditional(cond) => {
            v.visit_expr(&cond.condition);
            v.visit_expr(&cond.when_true);
            v.visit_expr(&cond.when_false);
        }
        Expr::Lambda(lambda) => match &lambda.body {
            LambdaBody::Expr(body) => v.visit_expr(body),
            LambdaBody::Block(block) => v.visit_block(block),
        },
        Expr::Is(is) => v.visit_expr(&is.operand),
        Expr::Switch(switch) => {
            v.visit_expr(&switch.governing);
            for arm in &switch.arms {
                if let Some(guard) = &arm.guard {
                    v.visit_expr(guard);
                }
                v.visit_expr(&arm.value);
            }
        }
        Expr::Initializer(init) => {
            for element in &init.elements {
                v.visit_expr(element);
            }
        }
        Expr::Throw(throw) => v.visit_expr(&throw.operand),
        Expr::Query(query) => {
            for clause in &query.clauses {
                v.visit_expr(clause);
            }
        }
    }
}

pub fn walk_call<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, call: &'ast CallExpr) {
    v.visit_expr(&call.callee);
    for arg in &call.args {
        v.visit_argument(arg);
    }
}

pub fn walk_argument<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, arg: &'ast Argument) {
    v.visit_expr(&arg.expr);
}

pub fn walk_interpolated<'ast, V: Visit<'ast> + ?Sized>(
    v: &mut V,
    string: &'ast InterpolatedString,
) {
    for hole in &string.holes {
        v.visit_expr(&hole.expr);
        if let Some(alignment) = &hole.alignment {
            v.visit_expr(alignment);
        }
    }
}

pub fn walk_cast<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, cast: &'ast CastExpr) {
    v.visit_expr(&cast.operand);
}

/// Mutable traversal used by tree rewrites. Same order as [`Visit`].
pub trait VisitMut {
    fn visit_mut_block(&mut self, block: &mut Block) {
        walk_mut_block(self, block)
    }

    fn visit_mut_stmt(&mut self, stmt: &mut Stmt) {
        walk_mut_stmt(self, stmt)
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        walk_mut_expr(self, expr)
    }

    fn visit_mut_argument(&mut self, arg: &mut Argument) {
        self.visit_mut_expr(&mut arg.expr)
    }
}

pub fn walk_mut_block<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_mut_stmt(stmt);
    }
}

pub fn walk_mut_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Block(block) => v.visit_mut_block(block),
        Stmt::Expr { expr, .. } => v.visit_mut_expr(expr),
        Stmt::Local { declarators, .. } => {
            for declarator in declarators {
                if let Some(init) = &mut declarator.init {
                    v.visit_mut_expr(init);
                }
            }
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            v.visit_mut_expr(condition);
            v.visit_mut_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_mut_stmt(else_branch);
            }
        }
        Stmt::Loop { header, body, .. } => {
            for part in header {
                v.visit_mut_stmt(part);
            }
            v.visit_mut_stmt(body);
        }
        Stmt::Switch {
            governing,
            sections,
            ..
        } => {
            v.visit_mut_expr(governing);
            for section in sections {
                for guard in &mut section.guards {
                    v.visit_mut_expr(guard);
                }
                for stmt in &mut section.stmts {
                    v.visit_mut_stmt(stmt);
                }
            }
        }
        Stmt::Jump { value, .. } => {
            if let Some(value) = value {
                v.visit_mut_expr(value);
            }
        }
        Stmt::Try {
            block,
            catches,
            finally,
            ..
        } => {
            v.visit_mut_block(block);
            for catch in catches {
                if let Some(filter) = &mut catch.filter {
                    v.visit_mut_expr(filter);
                }
                v.visit_mut_block(&mut catch.block);
            }
            if let Some(finally) = finally {
                v.visit_mut_block(finally);
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_mut_stmt(stmt),
        Stmt::LocalFunction(method) => match &mut method.body {
            Some(Body::Block(block)) => v.visit_mut_block(block),
            Some(Body::Expression(expr)) => v.visit_mut_expr(expr),
            None => {}
        },
        Stmt::Empty(_) => {}
    }
}

pub fn walk_mut_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Name(_)
        | Expr::Literal(_)
        | Expr::TypeOperator(_)
        | Expr::Declaration(_) => {}
        Expr::Interpolated(string) => {
            for hole in &mut string.holes {
                v.visit_mut_expr(&mut hole.expr);
                if let Some(alignment) = &mut hole.alignment {
                    v.visit_mut_expr(alignment);
                }
            }
        }
        Expr::Member(member) => v.visit_mut_expr(&mut member.target),
        Expr::Call(call) => {
            v.visit_mut_expr(&mut call.callee);
            for arg in &mut call.args {
                v.visit_mut_argument(arg);
            }
        }
        Expr::Index(access) => {
            v.visit_mut_expr(&mut access.target);
            for arg in &mut access.args {
                v.visit_mut_argument(arg);
            }
        }
        Expr::New(creation) => {
            for arg in &mut creation.args {
                v.visit_mut_argument(arg);
            }
            if let Some(init) = &mut creation.initializer {
                for element in &mut init.elements {
                    v.visit_mut_expr(element);
                }
            }
        }
        Expr::Cast(cast) => v.visit_mut_expr(&mut cast.operand),
        Expr::Paren(paren) => v.visit_mut_expr(&mut paren.inner),
        Expr::Tuple(tuple) => {
            for element in &mut tuple.elements {
                v.visit_mut_argument(element);
            }
        }
        Expr::Unary(unary) => v.visit_mut_expr(&mut unary.operand),
        Expr::Binary(binary) => {
            v.visit_mut_expr(&mut binary.left);
            v.visit_mut_expr(&mut binary.right);
        }
        Expr::Conditional(cond) => {
            v.visit_mut_expr(&mut cond.condition);
            v.visit_mut_expr(&mut cond.when_true);
            v.visit_mut_expr(&mut cond.when_false);
        }
        Expr::Lambda(lambda) => match &mut lambda.body {
            LambdaBody::Expr(body) => v.visit_mut_expr(body),
            LambdaBody::Block(block) => v.visit_mut_block(block),
        },
        Expr::Is(is) => v.visit_mut_expr(&mut is.operand),
        Expr::Switch(switch) => {
            v.visit_mut_expr(&mut switch.governing);
            for arm in &mut switch.arms {
                if let Some(guard) = &mut arm.guard {
                    v.visit_mut_expr(guard);
                }
                v.visit_mut_expr(&mut arm.value);
            }
        }
        Expr::Initializer(init) => {
            for element in &mut init.elements {
                v.visit_mut_expr(element);
            }
        }
        Expr::Throw(throw) => v.visit_mut_expr(&mut throw.operand),
        Expr::Query(query) => {
            for clause in &mut query.clauses {
                v.visit_mut_expr(clause);
            }
        }
    }
}
