//! Recursive-descent parser for the C# subset.
//!
//! Declarations the analysis never looks into (events, operators, enums,
//! delegates, top-level statements) are skipped as balanced token runs. Fields
//! and properties keep their type and name only. Method and constructor bodies are parsed in full; any token the
//! grammar below does not accept makes the whole file a parse error.

use super::SyntaxError;
use super::lexer::{Keyword, Token, TokenKind, lex};
use super::span::Span;
use super::tree::*;

type PResult<T> = Result<T, SyntaxError>;

/// Modifiers that are identifiers rather than reserved keywords.
const CONTEXTUAL_MODIFIERS: &[&str] = &["partial", "async", "required", "file"];

/// Lex and parse `source`.
pub fn parse_source(source: &str) -> PResult<SourceUnit> {
    let tokens = lex(source)?;
    parse(source, &tokens)
}

/// Parse an already tokenized file. `tokens` must end with [`TokenKind::Eof`].
pub fn parse(source: &str, tokens: &[Token]) -> PResult<SourceUnit> {
    if !tokens.last().is_some_and(|t| t.kind == TokenKind::Eof) {
        return Err(SyntaxError::new("token stream is not terminated", source.len()));
    }
    let mut parser = Parser {
        source,
        tokens,
        cursor: 0,
    };
    parser.parse_source_unit()
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    cursor: usize,
}

impl<'a> Parser<'a> {
    // ============================================================
    // Declarations
    // ============================================================

    fn parse_source_unit(&mut self) -> PResult<SourceUnit> {
        let mut types = Vec::new();
        self.parse_namespace_body(None, &mut types, false)?;
        Ok(SourceUnit {
            types,
            span: Span::new(0, self.source.len()),
        })
    }

    fn parse_namespace_body(
        &mut self,
        namespace: Option<String>,
        types: &mut Vec<TypeDecl>,
        braced: bool,
    ) -> PResult<()> {
        let mut namespace = namespace;
        loop {
            match self.kind() {
                TokenKind::Eof if braced => return self.error("expected '}' to close namespace"),
                TokenKind::Eof => return Ok(()),
                TokenKind::RBrace if braced => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::LBracket => self.skip_balanced()?,
                TokenKind::Keyword(Keyword::Using) if self.kind_at(1) != &TokenKind::LParen => {
                    self.skip_to_semicolon()?;
                }
                TokenKind::Keyword(Keyword::Extern) => self.skip_to_semicolon()?,
                TokenKind::Identifier(text)
                    if text == "global" && self.kind_at(1) == &TokenKind::Keyword(Keyword::Using) =>
                {
                    self.skip_to_semicolon()?;
                }
                TokenKind::Keyword(Keyword::Namespace) => {
                    self.advance();
                    let name = self.parse_dotted_name()?;
                    let full = match &namespace {
                        Some(outer) => format!("{outer}.{name}"),
                        None => name,
                    };
                    if self.eat(&TokenKind::Semicolon) {
                        namespace = Some(full);
                        continue;
                    }
                    self.expect(&TokenKind::LBrace, "'{' after namespace name")?;
                    self.parse_namespace_body(Some(full), types, true)?;
                }
                _ => match self.try_parse_type_declaration(namespace.as_deref())? {
                    Some(Member::Type(decl)) => types.push(decl),
                    Some(_) => {}
                    None => {
                        // Top-level statements are parsed for validity but not analysed.
                        self.parse_stmt()?;
                    }
                },
            }
        }
    }

    fn parse_dotted_name(&mut self) -> PResult<String> {
        let mut name = self.expect_ident("name")?.text;
        while self.eat(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident("name after '.'")?.text);
        }
        Ok(name)
    }

    /// Parse a class, struct, interface or record. Enums and delegates are
    /// skipped and reported as [`Member::Other`]. Returns `None`, with the
    /// cursor unchanged, when no type declaration starts here.
    fn try_parse_type_declaration(&mut self, namespace: Option<&str>) -> PResult<Option<Member>> {
        let save = self.cursor;
        let start = self.start();
        self.skip_modifiers()?;

        let kind = if self.eat_keyword(Keyword::Class) {
            TypeKind::Class
        } else if self.eat_keyword(Keyword::Struct) {
            TypeKind::Struct
        } else if self.eat_keyword(Keyword::Interface) {
            TypeKind::Interface
        } else if self.at_ident("record")
            && matches!(
                self.kind_at(1),
                TokenKind::Identifier(_) | TokenKind::Keyword(Keyword::Class | Keyword::Struct)
            )
        {
            self.advance();
            if !self.eat_keyword(Keyword::Class) {
                self.eat_keyword(Keyword::Struct);
            }
            TypeKind::Record
        } else if self.at_keyword(Keyword::Enum)
            || (self.at_keyword(Keyword::Delegate)
                && !matches!(self.kind_at(1), TokenKind::LParen | TokenKind::LBrace))
        {
            self.skip_member_rest()?;
            return Ok(Some(Member::Other(self.span_from(start))));
        } else {
            self.cursor = save;
            return Ok(None);
        };

        let name = self.expect_ident("type name")?;
        if self.at(&TokenKind::Lt) {
            self.skip_angle_brackets()?;
        }
        // primary constructor, base list and constraints
        self.skip_until(|k| matches!(k, TokenKind::LBrace | TokenKind::Semicolon))?;

        let mut members = Vec::new();
        if !self.eat(&TokenKind::Semicolon) {
            self.expect(&TokenKind::LBrace, "'{' to open type body")?;
            while !self.eat(&TokenKind::RBrace) {
                if self.at(&TokenKind::Eof) {
                    return self.error("expected '}' to close type body");
                }
                members.push(self.parse_member(name.value(), namespace)?);
            }
            self.eat(&TokenKind::Semicolon);
        }

        Ok(Some(Member::Type(TypeDecl {
            kind,
            name: name.value().to_string(),
            namespace: namespace.map(str::to_string),
            members,
            span: self.span_from(start),
        })))
    }

    fn parse_member(&mut self, type_name: &str, namespace: Option<&str>) -> PResult<Member> {
        let start = self.start();
        if self.eat(&TokenKind::Semicolon) {
            return Ok(Member::Other(self.span_from(start)));
        }
        if let Some(member) = self.try_parse_type_declaration(namespace)? {
            return Ok(member);
        }

        let is_static = self.skip_modifiers()?;
        match self.kind() {
            TokenKind::Keyword(
                Keyword::Event | Keyword::Implicit | Keyword::Explicit | Keyword::Operator,
            )
            | TokenKind::Tilde => {
                self.skip_member_rest()?;
                return Ok(Member::Other(self.span_from(start)));
            }
            TokenKind::Identifier(text)
                if text.strip_prefix('@').unwrap_or(text) == type_name
                    && self.kind_at(1) == &TokenKind::LParen =>
            {
                let name = self.expect_ident("constructor name")?;
                let method =
                    self.parse_method_rest(MethodKind::Constructor, name, None, is_static, start)?;
                return Ok(Member::Method(method));
            }
            _ => {}
        }

        if self.eat_keyword(Keyword::Ref) {
            self.eat_keyword(Keyword::Readonly);
        }
        let return_type = self.parse_type()?;
        if !self.is_ident() {
            // indexer, operator or something else without a simple name
            self.skip_member_rest()?;
            return Ok(Member::Other(self.span_from(start)));
        }
        let mut name = self.expect_ident("member name")?;
        loop {
            if self.at(&TokenKind::Lt) {
                self.skip_angle_brackets()?;
            }
            // explicit interface implementation: `IFoo.Bar`
            if self.at(&TokenKind::Dot) && matches!(self.kind_at(1), TokenKind::Identifier(_)) {
                self.advance();
                name = self.expect_ident("member name")?;
                continue;
            }
            break;
        }

        if self.at(&TokenKind::LParen) {
            let method = self.parse_method_rest(
                MethodKind::Method,
                name,
                Some(return_type),
                is_static,
                start,
            )?;
            return Ok(Member::Method(method));
        }
        self.skip_member_rest()?;
        Ok(Member::Field(FieldDecl {
            ty: return_type,
            name,
            span: self.span_from(start),
        }))
    }

    /// Parameters, constructor initializer, constraints and body of a method
    /// whose name has just been consumed.
    fn parse_method_rest(
        &mut self,
        kind: MethodKind,
        name: Ident,
        return_type: Option<TypeRef>,
        is_static: bool,
        start: usize,
    ) -> PResult<MethodDecl> {
        if self.at(&TokenKind::Lt) {
            self.skip_angle_brackets()?;
        }
        let parameters = self.parse_parameter_list()?;
        if self.eat(&TokenKind::Colon) || self.at_ident("where") {
            self.skip_until(|k| {
                matches!(
                    k,
                    TokenKind::LBrace | TokenKind::FatArrow | TokenKind::Semicolon
                )
            })?;
        }
        let body = if self.at(&TokenKind::LBrace) {
            Some(Body::Block(self.parse_block()?))
        } else if self.eat(&TokenKind::FatArrow) {
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::Semicolon, "';' after expression body")?;
            Some(Body::Expression(expr))
        } else {
            self.expect(&TokenKind::Semicolon, "method body or ';'")?;
            None
        };
        Ok(MethodDecl {
            kind,
            name,
            return_type,
            parameters,
            is_static,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_parameter_list(&mut self) -> PResult<Vec<ParameterDecl>> {
        self.expect(&TokenKind::LParen, "'(' to open parameter list")?;
        let mut parameters = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(parameters);
        }
        loop {
            let start = self.start();
            while self.at(&TokenKind::LBracket) {
                self.skip_balanced()?;
            }
            let mut modifier = None;
            loop {
                let next = match self.kind() {
                    TokenKind::Keyword(Keyword::Params) => Some(ParamModifier::Params),
                    TokenKind::Keyword(Keyword::Ref) => Some(ParamModifier::Ref),
                    TokenKind::Keyword(Keyword::Out) => Some(ParamModifier::Out),
                    TokenKind::Keyword(Keyword::In) => Some(ParamModifier::In),
                    TokenKind::Keyword(Keyword::This) => Some(ParamModifier::This),
                    TokenKind::Keyword(Keyword::Readonly) => None,
                    TokenKind::Identifier(text)
                        if text == "scoped"
                            && matches!(
                                self.kind_at(1),
                                TokenKind::Identifier(_) | TokenKind::Keyword(_)
                            ) =>
                    {
                        None
                    }
                    _ => break,
                };
                if modifier.is_none() || next == Some(ParamModifier::Params) {
                    modifier = next.or(modifier);
                }
                self.advance();
            }
            let ty = self.parse_type()?;
            let name = self.expect_ident("parameter name")?;
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            parameters.push(ParameterDecl {
                name,
                ty,
                modifier,
                default,
                span: self.span_from(start),
            });
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RParen, "',' or ')' in parameter list")?;
            return Ok(parameters);
        }
    }

    /// Skip attributes and modifiers. Returns whether `static` was among them.
    fn skip_modifiers(&mut self) -> PResult<bool> {
        let mut is_static = false;
        loop {
            match self.kind() {
                TokenKind::LBracket => self.skip_balanced()?,
                TokenKind::Keyword(keyword) if keyword.is_modifier() => {
                    is_static |= *keyword == Keyword::Static;
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Ref)
                    if matches!(self.kind_at(1), TokenKind::Keyword(Keyword::Struct))
                        || matches!(self.kind_at(1), TokenKind::Identifier(t) if t == "partial") =>
                {
                    self.advance();
                }
                TokenKind::Identifier(text)
                    if CONTEXTUAL_MODIFIERS.contains(&text.as_str())
                        && matches!(
                            self.kind_at(1),
                            TokenKind::Identifier(_) | TokenKind::Keyword(_)
                        ) =>
                {
                    self.advance();
                }
                _ => return Ok(is_static),
            }
        }
    }

    /// Skip the remainder of a member the tree does not model: up to a `;` at
    /// depth zero, or through an accessor/body block and an optional
    /// `= initializer;` that follows it.
    fn skip_member_rest(&mut self) -> PResult<()> {
        let mut in_initializer = false;
        loop {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Eq | TokenKind::FatArrow => {
                    in_initializer = true;
                    self.advance();
                }
                TokenKind::LBrace if !in_initializer => {
                    self.skip_balanced()?;
                    if self.at(&TokenKind::Eq) {
                        continue;
                    }
                    self.eat(&TokenKind::Semicolon);
                    return Ok(());
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    self.skip_balanced()?;
                }
                TokenKind::Eof => return self.error("unexpected end of file in declaration"),
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    return self.error("unbalanced closing delimiter");
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ============================================================
    // Types
    // ============================================================

    fn parse_type(&mut self) -> PResult<TypeRef> {
        let start = self.start();
        let mut ty = self.parse_non_array_type()?;
        loop {
            match self.kind() {
                TokenKind::Question if self.nullable_marker_follows() => {
                    self.advance();
                    ty.nullable = true;
                }
                TokenKind::LBracket
                    if matches!(self.kind_at(1), TokenKind::RBracket | TokenKind::Comma) =>
                {
                    self.skip_balanced()?;
                    ty.array_rank += 1;
                }
                TokenKind::Star => {
                    self.advance();
                }
                _ => break,
            }
        }
        ty.span = self.span_from(start);
        Ok(ty)
    }

    fn parse_non_array_type(&mut self) -> PResult<TypeRef> {
        let start = self.start();
        let token = self.peek();
        let mut type_args = Vec::new();
        let name = match &token.kind {
            TokenKind::LParen => {
                self.advance();
                loop {
                    type_args.push(self.parse_type()?);
                    if self.is_ident() {
                        self.advance();
                    }
                    if self.eat(&TokenKind::Comma) {
                        continue;
                    }
                    self.expect(&TokenKind::RParen, "')' to close tuple type")?;
                    break;
                }
                "ValueTuple".to_string()
            }
            TokenKind::Keyword(keyword) if keyword.is_predefined_type() => {
                self.advance();
                self.text(token).to_string()
            }
            TokenKind::Identifier(text) => {
                self.advance();
                let mut name = text.clone();
                if self.eat(&TokenKind::ColonColon) {
                    name.push_str("::");
                    name.push_str(&self.expect_ident("name after '::'")?.text);
                }
                loop {
                    if self.at(&TokenKind::Lt) {
                        type_args = self.parse_type_args()?;
                    }
                    if self.at(&TokenKind::Dot)
                        && matches!(self.kind_at(1), TokenKind::Identifier(_))
                    {
                        self.advance();
                        name.push('.');
                        name.push_str(&self.expect_ident("name after '.'")?.text);
                        continue;
                    }
                    break;
                }
                name
            }
            _ => return self.error("expected type"),
        };
        Ok(TypeRef {
            name,
            type_args,
            array_rank: 0,
            nullable: false,
            span: self.span_from(start),
        })
    }

    fn parse_type_args(&mut self) -> PResult<Vec<TypeRef>> {
        self.expect(&TokenKind::Lt, "'<'")?;
        let mut args = Vec::new();
        // unbound generic: `typeof(Dictionary<,>)`
        while self.eat(&TokenKind::Comma) {}
        if self.eat(&TokenKind::Gt) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_type()?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::Gt, "'>' to close type arguments")?;
            return Ok(args);
        }
    }

    /// Type arguments after a name in expression context, kept only when the
    /// token after `>` disambiguates them from a less-than comparison.
    fn try_generic_args(&mut self) -> Vec<TypeRef> {
        if !self.at(&TokenKind::Lt) {
            return Vec::new();
        }
        let save = self.cursor;
        if let Ok(args) = self.parse_type_args()
            && matches!(
                self.kind(),
                TokenKind::LParen
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::Colon
                    | TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::Dot
                    | TokenKind::QuestionDot
                    | TokenKind::Question
                    | TokenKind::EqEq
                    | TokenKind::BangEq
                    | TokenKind::Pipe
                    | TokenKind::Caret
                    | TokenKind::AmpAmp
                    | TokenKind::PipePipe
                    | TokenKind::Amp
                    | TokenKind::LBracket
                    | TokenKind::InterpolationClose
                    | TokenKind::InterpolationFormat
                    | TokenKind::Eof
            )
        {
            return args;
        }
        self.cursor = save;
        Vec::new()
    }

    fn nullable_marker_follows(&self) -> bool {
        matches!(
            self.kind_at(1),
            TokenKind::Identifier(_)
                | TokenKind::RParen
                | TokenKind::Comma
                | TokenKind::Gt
                | TokenKind::RBracket
                | TokenKind::LBracket
                | TokenKind::Semicolon
                | TokenKind::Eq
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Eof
        )
    }

    fn skip_angle_brackets(&mut self) -> PResult<()> {
        let open = self.start();
        let mut depth = 0usize;
        loop {
            match self.advance().kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(SyntaxError::new("unterminated '<'", open)),
                _ => {}
            }
        }
    }

    // ============================================================
    // Statements
    // ============================================================

    fn parse_block(&mut self) -> PResult<Block> {
        let start = self.start();
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return self.error("expected '}' to close block");
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Block {
            stmts,
            span: self.span_from(start),
        })
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        match self.kind() {
            TokenKind::LBrace => return self.parse_block().map(Stmt::Block),
            TokenKind::Semicolon => {
                self.advance();
                return Ok(Stmt::Empty(self.span_from(start)));
            }
            TokenKind::Keyword(Keyword::If) => {
                self.advance();
                let condition = self.parse_paren_expr()?;
                let then_branch = Box::new(self.parse_stmt()?);
                let else_branch = if self.eat_keyword(Keyword::Else) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                return Ok(Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    span: self.span_from(start),
                });
            }
            TokenKind::Keyword(keyword @ (Keyword::While | Keyword::Lock)) => {
                let keyword = *keyword;
                self.advance();
                let condition = self.parse_paren_expr()?;
                let header = vec![self.expr_stmt(condition)];
                let body = Box::new(self.parse_stmt()?);
                return Ok(self.loop_stmt(keyword, header, body, start));
            }
            TokenKind::Keyword(Keyword::Do) => {
                self.advance();
                let body = Box::new(self.parse_stmt()?);
                self.expect_keyword(Keyword::While, "'while' after do body")?;
                let condition = self.parse_paren_expr()?;
                self.expect(&TokenKind::Semicolon, "';' after do-while")?;
                let header = vec![self.expr_stmt(condition)];
                return Ok(self.loop_stmt(Keyword::Do, header, body, start));
            }
            TokenKind::Keyword(Keyword::For) => return self.parse_for(start),
            TokenKind::Keyword(Keyword::Foreach) => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after foreach")?;
                self.skip_until(|k| matches!(k, TokenKind::Keyword(Keyword::In)))?;
                self.advance();
                let collection = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')' after foreach collection")?;
                let header = vec![self.expr_stmt(collection)];
                let body = Box::new(self.parse_stmt()?);
                return Ok(self.loop_stmt(Keyword::Foreach, header, body, start));
            }
            TokenKind::Keyword(keyword @ (Keyword::Using | Keyword::Fixed))
                if self.kind_at(1) == &TokenKind::LParen =>
            {
                let keyword = *keyword;
                self.advance();
                self.advance();
                let resource = match self.try_local_declaration()? {
                    Some(local) => local,
                    None => {
                        let expr = self.parse_expr()?;
                        self.expr_stmt(expr)
                    }
                };
                self.expect(&TokenKind::RParen, "')' after resource")?;
                let body = Box::new(self.parse_stmt()?);
                return Ok(self.loop_stmt(keyword, vec![resource], body, start));
            }
            TokenKind::Keyword(Keyword::Using) => {
                // using declaration: `using var x = ...;`
                self.advance();
                let Some(local) = self.try_local_declaration()? else {
                    return self.error("expected declaration after 'using'");
                };
                self.expect(&TokenKind::Semicolon, "';' after using declaration")?;
                return Ok(local);
            }
            TokenKind::Keyword(
                keyword @ (Keyword::Checked | Keyword::Unchecked | Keyword::Unsafe),
            ) if self.kind_at(1) == &TokenKind::LBrace => {
                let keyword = *keyword;
                self.advance();
                let body = Box::new(Stmt::Block(self.parse_block()?));
                return Ok(self.loop_stmt(keyword, Vec::new(), body, start));
            }
            TokenKind::Keyword(Keyword::Switch) => return self.parse_switch_stmt(start),
            TokenKind::Keyword(Keyword::Try) => return self.parse_try(start),
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                return self.finish_jump(JumpKind::Return, start);
            }
            TokenKind::Keyword(Keyword::Throw) => {
                self.advance();
                return self.finish_jump(JumpKind::Throw, start);
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                return self.finish_jump(JumpKind::Break, start);
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                return self.finish_jump(JumpKind::Continue, start);
            }
            TokenKind::Keyword(Keyword::Goto) => {
                self.skip_to_semicolon()?;
                return Ok(Stmt::Jump {
                    kind: JumpKind::Goto,
                    value: None,
                    span: self.span_from(start),
                });
            }
            TokenKind::Identifier(text) if text == "yield" => {
                if self.kind_at(1) == &TokenKind::Keyword(Keyword::Return) {
                    self.advance();
                    self.advance();
                    return self.finish_jump(JumpKind::YieldReturn, start);
                }
                if self.kind_at(1) == &TokenKind::Keyword(Keyword::Break) {
                    self.advance();
                    self.advance();
                    return self.finish_jump(JumpKind::YieldBreak, start);
                }
            }
            TokenKind::Identifier(text)
                if text == "await"
                    && matches!(
                        self.kind_at(1),
                        TokenKind::Keyword(Keyword::Using | Keyword::Foreach)
                    ) =>
            {
                self.advance();
                return self.parse_stmt();
            }
            TokenKind::Identifier(_) if self.kind_at(1) == &TokenKind::Colon => {
                let label = self.expect_ident("label")?;
                self.advance();
                let stmt = Box::new(self.parse_stmt()?);
                return Ok(Stmt::Labeled {
                    label,
                    stmt,
                    span: self.span_from(start),
                });
            }
            _ => {}
        }

        if let Some(function) = self.try_local_function()? {
            return Ok(Stmt::LocalFunction(Box::new(function)));
        }
        if let Some(local) = self.try_local_declaration()? {
            self.expect(&TokenKind::Semicolon, "';' after declaration")?;
            return Ok(local);
        }
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "';' after expression")?;
        Ok(Stmt::Expr {
            expr,
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self, start: usize) -> PResult<Stmt> {
        self.advance();
        self.expect(&TokenKind::LParen, "'(' after for")?;
        let mut header = Vec::new();
        if !self.at(&TokenKind::Semicolon) {
            match self.try_local_declaration()? {
                Some(local) => header.push(local),
                None => self.parse_expr_list(&mut header, &TokenKind::Semicolon)?,
            }
        }
        self.expect(&TokenKind::Semicolon, "';' in for header")?;
        if !self.at(&TokenKind::Semicolon) {
            let condition = self.parse_expr()?;
            header.push(self.expr_stmt(condition));
        }
        self.expect(&TokenKind::Semicolon, "';' in for header")?;
        if !self.at(&TokenKind::RParen) {
            self.parse_expr_list(&mut header, &TokenKind::RParen)?;
        }
        self.expect(&TokenKind::RParen, "')' after for header")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(self.loop_stmt(Keyword::For, header, body, start))
    }

    fn parse_expr_list(&mut self, out: &mut Vec<Stmt>, end: &TokenKind) -> PResult<()> {
        loop {
            let expr = self.parse_expr()?;
            out.push(self.expr_stmt(expr));
            if self.at(end) || !self.eat(&TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    fn parse_switch_stmt(&mut self, start: usize) -> PResult<Stmt> {
        self.advance();
        let governing = self.parse_paren_expr()?;
        self.expect(&TokenKind::LBrace, "'{' after switch")?;
        let mut sections = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let section_start = self.start();
            let mut guards = Vec::new();
            let mut labelled = false;
            loop {
                if self.eat_keyword(Keyword::Default) {
                    self.expect(&TokenKind::Colon, "':' after default")?;
                } else if self.eat_keyword(Keyword::Case) {
                    self.skip_until(|k| {
                        matches!(k, TokenKind::Colon)
                            || matches!(k, TokenKind::Identifier(t) if t == "when")
                    })?;
                    if self.at_ident("when") {
                        self.advance();
                        guards.push(self.parse_expr()?);
                    }
                    self.expect(&TokenKind::Colon, "':' after case label")?;
                } else {
                    break;
                }
                labelled = true;
            }
            if !labelled {
                return self.error("expected 'case' or 'default'");
            }
            let mut stmts = Vec::new();
            while !matches!(
                self.kind(),
                TokenKind::Keyword(Keyword::Case | Keyword::Default) | TokenKind::RBrace
            ) || (self.at_keyword(Keyword::Default) && self.kind_at(1) == &TokenKind::LParen)
            {
                if self.at(&TokenKind::Eof) {
                    return self.error("expected '}' to close switch");
                }
                stmts.push(self.parse_stmt()?);
            }
            sections.push(SwitchSection {
                guards,
                stmts,
                span: self.span_from(section_start),
            });
        }
        Ok(Stmt::Switch {
            governing,
            sections,
            span: self.span_from(start),
        })
    }

    fn parse_try(&mut self, start: usize) -> PResult<Stmt> {
        self.advance();
        let block = self.parse_block()?;
        let mut catches = Vec::new();
        while self.at_keyword(Keyword::Catch) {
            let catch_start = self.start();
            self.advance();
            if self.at(&TokenKind::LParen) {
                self.skip_balanced()?;
            }
            let filter = if self.at_ident("when") {
                self.advance();
                Some(self.parse_paren_expr()?)
            } else {
                None
            };
            let block = self.parse_block()?;
            catches.push(CatchClause {
                filter,
                block,
                span: self.span_from(catch_start),
            });
        }
        let finally = if self.eat_keyword(Keyword::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            return self.error("expected 'catch' or 'finally'");
        }
        Ok(Stmt::Try {
            block,
            catches,
            finally,
            span: self.span_from(start),
        })
    }

    fn finish_jump(&mut self, kind: JumpKind, start: usize) -> PResult<Stmt> {
        let value = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Jump {
            kind,
            value,
            span: self.span_from(start),
        })
    }

    /// `Type name = init, ...` without the trailing `;`. Returns `None`, with
    /// the cursor unchanged, when the tokens are not a declaration.
    fn try_local_declaration(&mut self) -> PResult<Option<Stmt>> {
        let save = self.cursor;
        let start = self.start();
        self.eat_keyword(Keyword::Const);
        if self.eat_keyword(Keyword::Ref) {
            self.eat_keyword(Keyword::Readonly);
        }
        if self.at_ident("scoped") && matches!(self.kind_at(1), TokenKind::Identifier(_)) {
            self.advance();
        }
        if !self.at_type_start() {
            self.cursor = save;
            return Ok(None);
        }
        let Ok(ty) = self.parse_type() else {
            self.cursor = save;
            return Ok(None);
        };
        if !(self.is_ident()
            && matches!(
                self.kind_at(1),
                TokenKind::Eq | TokenKind::Semicolon | TokenKind::Comma | TokenKind::RParen
            ))
        {
            self.cursor = save;
            return Ok(None);
        }

        let mut declarators = Vec::new();
        loop {
            let name = self.expect_ident("variable name")?;
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            declarators.push(Declarator { name, init });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Some(Stmt::Local {
            ty: Some(ty),
            declarators,
            span: self.span_from(start),
        }))
    }

    fn try_local_function(&mut self) -> PResult<Option<MethodDecl>> {
        let save = self.cursor;
        let start = self.start();
        let mut is_static = false;
        loop {
            match self.kind() {
                TokenKind::Keyword(Keyword::Static) => is_static = true,
                TokenKind::Keyword(Keyword::Unsafe | Keyword::Extern) => {}
                TokenKind::Identifier(text)
                    if text == "async"
                        && matches!(
                            self.kind_at(1),
                            TokenKind::Identifier(_) | TokenKind::Keyword(_)
                        ) => {}
                _ => break,
            }
            self.advance();
        }
        if !self.at_type_start() {
            self.cursor = save;
            return Ok(None);
        }
        let Ok(return_type) = self.parse_type() else {
            self.cursor = save;
            return Ok(None);
        };
        if !(self.is_ident() && matches!(self.kind_at(1), TokenKind::LParen | TokenKind::Lt)) {
            self.cursor = save;
            return Ok(None);
        }
        let name = self.expect_ident("function name")?;
        if self.at(&TokenKind::Lt) {
            let after_name = self.cursor;
            if self.skip_angle_brackets().is_err() || !self.at(&TokenKind::LParen) {
                self.cursor = save;
                return Ok(None);
            }
            self.cursor = after_name;
        }
        let method = self.parse_method_rest(
            MethodKind::LocalFunction,
            name,
            Some(return_type),
            is_static,
            start,
        )?;
        Ok(Some(method))
    }

    fn at_type_start(&self) -> bool {
        match self.kind() {
            TokenKind::Identifier(text) => text != "await",
            TokenKind::Keyword(keyword) => keyword.is_predefined_type(),
            TokenKind::LParen => true,
            _ => false,
        }
    }

    fn expr_stmt(&self, expr: Expr) -> Stmt {
        let span = expr.span();
        Stmt::Expr { expr, span }
    }

    fn loop_stmt(&self, keyword: Keyword, header: Vec<Stmt>, body: Box<Stmt>, start: usize) -> Stmt {
        Stmt::Loop {
            keyword,
            header,
            body,
            span: self.span_from(start),
        }
    }

    // ============================================================
    // Expressions
    // ============================================================

    fn parse_paren_expr(&mut self) -> PResult<Expr> {
        self.expect(&TokenKind::LParen, "'('")?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        if self.query_follows() {
            return self.parse_query().map(Expr::Query);
        }
        if let Some(lambda) = self.try_parse_lambda()? {
            return Ok(lambda);
        }
        let left = self.parse_conditional()?;
        let Some((op, width)) = self.assignment_op() else {
            return Ok(left);
        };
        for _ in 0..width {
            self.advance();
        }
        let right = self.parse_expr()?;
        Ok(binary(op, left, right))
    }

    fn assignment_op(&self) -> Option<(BinaryOp, usize)> {
        let op = match self.kind() {
            TokenKind::Eq => BinaryOp::Assign,
            TokenKind::QuestionQuestionEq => BinaryOp::CoalesceAssign,
            TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::ShlEq => BinaryOp::CompoundAssign,
            TokenKind::Gt if self.kind_at(1) == &TokenKind::GtEq && self.adjacent(1) => {
                return Some((BinaryOp::CompoundAssign, 2));
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_conditional(&mut self) -> PResult<Expr> {
        let condition = self.parse_binary(0)?;
        if !self.at(&TokenKind::Question) {
            return Ok(condition);
        }
        self.advance();
        let when_true = self.parse_expr()?;
        self.expect(&TokenKind::Colon, "':' in conditional expression")?;
        let when_false = self.parse_expr()?;
        let span = condition.span().to(when_false.span());
        Ok(Expr::Conditional(ConditionalExpr {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
            span,
        }))
    }

    /// Binary operator at the cursor: operator, precedence and token count.
    fn binary_op(&self) -> Option<(BinaryOp, u8, usize)> {
        let (op, precedence) = match self.kind() {
            TokenKind::QuestionQuestion => (BinaryOp::Coalesce, 1),
            TokenKind::PipePipe => (BinaryOp::Or, 2),
            TokenKind::AmpAmp => (BinaryOp::And, 3),
            TokenKind::Pipe => (BinaryOp::BitOr, 4),
            TokenKind::Caret => (BinaryOp::BitXor, 5),
            TokenKind::Amp => (BinaryOp::BitAnd, 6),
            TokenKind::EqEq => (BinaryOp::Eq, 7),
            TokenKind::BangEq => (BinaryOp::Ne, 7),
            TokenKind::Lt => (BinaryOp::Lt, 8),
            TokenKind::LtEq => (BinaryOp::Le, 8),
            TokenKind::GtEq => (BinaryOp::Ge, 8),
            TokenKind::Keyword(Keyword::As) => (BinaryOp::As, 8),
            TokenKind::Gt => {
                if self.kind_at(1) == &TokenKind::Gt && self.adjacent(1) {
                    return Some((BinaryOp::Shr, 9, 2));
                }
                if self.kind_at(1) == &TokenKind::GtEq && self.adjacent(1) {
                    return None;
                }
                (BinaryOp::Gt, 8)
            }
            TokenKind::Shl => (BinaryOp::Shl, 9),
            TokenKind::Plus => (BinaryOp::Add, 10),
            TokenKind::Minus => (BinaryOp::Sub, 10),
            TokenKind::Star => (BinaryOp::Mul, 11),
            TokenKind::Slash => (BinaryOp::Div, 11),
            TokenKind::Percent => (BinaryOp::Rem, 11),
            TokenKind::DotDot => (BinaryOp::Range, 12),
            _ => return None,
        };
        Some((op, precedence, 1))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            if self.at_keyword(Keyword::Is) && min_precedence <= 8 {
                self.advance();
                self.skip_pattern()?;
                let span = Span::new(left.span().start, self.prev_end());
                left = Expr::Is(IsExpr {
                    operand: Box::new(left),
                    span,
                });
                continue;
            }
            let Some((op, precedence, width)) = self.binary_op() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            for _ in 0..width {
                self.advance();
            }
            if op == BinaryOp::Range && !self.at_expr_start() {
                // open-ended range: `x..`
                let span = Span::new(left.span().start, self.prev_end());
                left = Expr::Unary(UnaryExpr {
                    op: UnaryOp::Range,
                    operand: Box::new(left),
                    span,
                });
                continue;
            }
            let right = match op {
                BinaryOp::As => {
                    let ty = self.parse_type()?;
                    Expr::Name(NameExpr {
                        name: ty.to_string(),
                        type_args: Vec::new(),
                        span: ty.span,
                    })
                }
                BinaryOp::Coalesce => self.parse_binary(precedence)?,
                _ => self.parse_binary(precedence + 1)?,
            };
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// Skip a pattern after `is`, `case` or in a switch arm.
    fn skip_pattern(&mut self) -> PResult<()> {
        loop {
            match self.kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    self.skip_balanced()?;
                }
                TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::AmpAmp
                | TokenKind::PipePipe
                | TokenKind::Question
                | TokenKind::QuestionQuestion
                | TokenKind::Colon
                | TokenKind::FatArrow
                | TokenKind::EqEq
                | TokenKind::BangEq
                | TokenKind::InterpolationClose
                | TokenKind::InterpolationFormat
                | TokenKind::Eof => return Ok(()),
                TokenKind::Identifier(text) if text == "when" => return Ok(()),
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let op = match self.kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::PlusPlus => Some(UnaryOp::PreInc),
            TokenKind::MinusMinus => Some(UnaryOp::PreDec),
            TokenKind::Caret => Some(UnaryOp::FromEnd),
            TokenKind::Amp => Some(UnaryOp::AddressOf),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Keyword(Keyword::Ref) => Some(UnaryOp::Ref),
            TokenKind::DotDot => Some(UnaryOp::Range),
            TokenKind::Identifier(text) if text == "await" && self.await_operand_follows() => {
                Some(UnaryOp::Await)
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            if op == UnaryOp::Range && !self.at_expr_start() {
                // whole range: `..`
                return Ok(Expr::Name(NameExpr {
                    name: "..".to_string(),
                    type_args: Vec::new(),
                    span: self.span_from(start),
                }));
            }
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                span: self.span_from(start),
            }));
        }
        if self.at(&TokenKind::LParen)
            && let Some(cast) = self.try_parse_cast()?
        {
            return Ok(cast);
        }
        self.parse_postfix()
    }

    fn await_operand_follows(&self) -> bool {
        match self.kind_at(1) {
            TokenKind::Keyword(Keyword::As | Keyword::Is) => false,
            TokenKind::Identifier(_)
            | TokenKind::Keyword(_)
            | TokenKind::LParen
            | TokenKind::NumericLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::InterpolatedStart => true,
            _ => false,
        }
    }

    fn try_parse_cast(&mut self) -> PResult<Option<Expr>> {
        let save = self.cursor;
        let start = self.start();
        self.advance();
        let predefined = matches!(self.kind(), TokenKind::Keyword(k) if k.is_predefined_type());
        let Ok(ty) = self.parse_type() else {
            self.cursor = save;
            return Ok(None);
        };
        if !self.eat(&TokenKind::RParen) {
            self.cursor = save;
            return Ok(None);
        }
        let is_cast = (predefined && ty.type_args.is_empty()) || self.cast_operand_follows();
        if !is_cast || self.at(&TokenKind::FatArrow) {
            self.cursor = save;
            return Ok(None);
        }
        let operand = self.parse_unary()?;
        Ok(Some(Expr::Cast(CastExpr {
            ty,
            operand: Box::new(operand),
            origin: Origin::Source,
            span: self.span_from(start),
        })))
    }

    fn cast_operand_follows(&self) -> bool {
        match self.kind() {
            TokenKind::Keyword(Keyword::As | Keyword::Is) => false,
            TokenKind::Identifier(_)
            | TokenKind::Keyword(_)
            | TokenKind::LParen
            | TokenKind::NumericLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::InterpolatedStart
            | TokenKind::Bang
            | TokenKind::Tilde => true,
            _ => false,
        }
    }

    fn at_expr_start(&self) -> bool {
        match self.kind() {
            TokenKind::Keyword(Keyword::As | Keyword::Is) => false,
            TokenKind::Identifier(_)
            | TokenKind::Keyword(_)
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::NumericLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::InterpolatedStart
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Caret
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => true,
            _ => false,
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = expr.span().start;
            match self.kind() {
                TokenKind::Dot | TokenKind::Arrow | TokenKind::QuestionDot => {
                    let conditional = self.at(&TokenKind::QuestionDot);
                    self.advance();
                    let name = self.expect_ident("member name")?;
                    let type_args = self.try_generic_args();
                    expr = Expr::Member(MemberAccess {
                        target: Box::new(expr),
                        name,
                        type_args,
                        conditional,
                        span: self.span_from(start),
                    });
                }
                TokenKind::LParen => {
                    let args = self.parse_arguments(&TokenKind::RParen)?;
                    expr = Expr::Call(CallExpr {
                        callee: Box::new(expr),
                        args,
                        span: self.span_from(start),
                    });
                }
                TokenKind::LBracket => {
                    let args = self.parse_arguments(&TokenKind::RBracket)?;
                    expr = Expr::Index(ElementAccess {
                        target: Box::new(expr),
                        args,
                        conditional: false,
                        span: self.span_from(start),
                    });
                }
                TokenKind::Question
                    if self.kind_at(1) == &TokenKind::LBracket && self.adjacent(1) =>
                {
                    self.advance();
                    let args = self.parse_arguments(&TokenKind::RBracket)?;
                    expr = Expr::Index(ElementAccess {
                        target: Box::new(expr),
                        args,
                        conditional: true,
                        span: self.span_from(start),
                    });
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus | TokenKind::Bang => {
                    let op = match self.advance().kind {
                        TokenKind::PlusPlus => UnaryOp::PostInc,
                        TokenKind::MinusMinus => UnaryOp::PostDec,
                        _ => UnaryOp::NullForgiving,
                    };
                    expr = Expr::Unary(UnaryExpr {
                        op,
                        operand: Box::new(expr),
                        span: self.span_from(start),
                    });
                }
                TokenKind::Keyword(Keyword::Switch) => {
                    self.advance();
                    expr = self.parse_switch_expr(expr, start)?;
                }
                TokenKind::Identifier(text)
                    if text == "with" && self.kind_at(1) == &TokenKind::LBrace =>
                {
                    self.advance();
                    let init = self.parse_initializer()?;
                    expr = binary(BinaryOp::With, expr, Expr::Initializer(init));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_switch_expr(&mut self, governing: Expr, start: usize) -> PResult<Expr> {
        self.expect(&TokenKind::LBrace, "'{' after switch")?;
        let mut arms = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let arm_start = self.start();
            self.skip_pattern()?;
            let guard = if self.at_ident("when") {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect(&TokenKind::FatArrow, "'=>' in switch arm")?;
            let value = self.parse_expr()?;
            arms.push(SwitchArm {
                guard,
                value,
                span: self.span_from(arm_start),
            });
            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RBrace, "'}' to close switch expression")?;
                break;
            }
        }
        Ok(Expr::Switch(SwitchExpr {
            governing: Box::new(governing),
            arms,
            span: self.span_from(start),
        }))
    }

    /// Argument list starting at the opening token, through `close`.
    fn parse_arguments(&mut self, close: &TokenKind) -> PResult<Vec<Argument>> {
        self.advance();
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_argument(false)?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(close, "',' or closing delimiter in argument list")?;
            return Ok(args);
        }
    }

    /// One argument. Declaration expressions (`var x`) are accepted after
    /// `out` and, with `in_tuple`, as tuple elements.
    fn parse_argument(&mut self, in_tuple: bool) -> PResult<Argument> {
        let start = self.start();
        let name = if self.is_ident() && self.kind_at(1) == &TokenKind::Colon {
            let name = self.expect_ident("argument name")?;
            self.advance();
            Some(name)
        } else {
            None
        };
        let modifier = match self.kind() {
            TokenKind::Keyword(Keyword::Ref) => Some(ArgModifier::Ref),
            TokenKind::Keyword(Keyword::Out) => Some(ArgModifier::Out),
            TokenKind::Keyword(Keyword::In) => Some(ArgModifier::In),
            _ => None,
        };
        if modifier.is_some() {
            self.advance();
        }
        let declaration = if in_tuple || modifier == Some(ArgModifier::Out) {
            self.try_declaration_expr()
        } else {
            None
        };
        let expr = match declaration {
            Some(decl) => decl,
            None => self.parse_expr()?,
        };
        Ok(Argument {
            name,
            modifier,
            expr,
            span: self.span_from(start),
        })
    }

    /// `var x` or `int x` in argument position.
    fn try_declaration_expr(&mut self) -> Option<Expr> {
        if !self.at_type_start() {
            return None;
        }
        let save = self.cursor;
        let start = self.start();
        if self.parse_type().is_ok()
            && self.is_ident()
            && matches!(
                self.kind_at(1),
                TokenKind::Comma | TokenKind::RParen | TokenKind::RBracket
            )
        {
            self.advance();
            return Some(Expr::Declaration(DeclarationExpr {
                span: self.span_from(start),
            }));
        }
        self.cursor = save;
        None
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let token = self.peek();
        let literal = match &token.kind {
            TokenKind::NumericLiteral => Some(LiteralKind::Number),
            TokenKind::StringLiteral => Some(LiteralKind::String),
            TokenKind::CharLiteral => Some(LiteralKind::Char),
            TokenKind::Keyword(Keyword::True) => Some(LiteralKind::True),
            TokenKind::Keyword(Keyword::False) => Some(LiteralKind::False),
            TokenKind::Keyword(Keyword::Null) => Some(LiteralKind::Null),
            _ => None,
        };
        if let Some(kind) = literal {
            self.advance();
            return Ok(Expr::Literal(LiteralExpr {
                kind,
                span: token.span,
            }));
        }

        match &token.kind {
            TokenKind::InterpolatedStart => self.parse_interpolated().map(Expr::Interpolated),
            TokenKind::Identifier(text) => {
                self.advance();
                let mut name = text.clone();
                if self.eat(&TokenKind::ColonColon) {
                    name.push_str("::");
                    name.push_str(&self.expect_ident("name after '::'")?.text);
                }
                let type_args = self.try_generic_args();
                Ok(Expr::Name(NameExpr {
                    name,
                    type_args,
                    span: self.span_from(start),
                }))
            }
            TokenKind::Keyword(keyword)
                if matches!(keyword, Keyword::This | Keyword::Base)
                    || keyword.is_predefined_type() =>
            {
                self.advance();
                Ok(Expr::Name(NameExpr {
                    name: self.text(token).to_string(),
                    type_args: Vec::new(),
                    span: token.span,
                }))
            }
            TokenKind::LParen => self.parse_paren_or_tuple(),
            TokenKind::Keyword(Keyword::New | Keyword::Stackalloc) => self.parse_new(),
            TokenKind::Keyword(keyword @ (Keyword::Typeof | Keyword::Sizeof | Keyword::Default)) => {
                let keyword = *keyword;
                self.advance();
                if self.at(&TokenKind::LParen) {
                    self.skip_balanced()?;
                }
                Ok(Expr::TypeOperator(TypeOperatorExpr {
                    keyword,
                    span: self.span_from(start),
                }))
            }
            TokenKind::Keyword(Keyword::Checked | Keyword::Unchecked) => {
                self.advance();
                let inner = self.parse_paren_expr()?;
                Ok(Expr::Paren(ParenExpr {
                    inner: Box::new(inner),
                    span: self.span_from(start),
                }))
            }
            TokenKind::Keyword(Keyword::Delegate) => {
                // anonymous method
                self.advance();
                let parameters = if self.at(&TokenKind::LParen) {
                    self.parse_parameter_list()?
                        .into_iter()
                        .map(|p| p.name)
                        .collect()
                } else {
                    Vec::new()
                };
                let body = LambdaBody::Block(self.parse_block()?);
                Ok(Expr::Lambda(LambdaExpr {
                    parameters,
                    body,
                    span: self.span_from(start),
                }))
            }
            TokenKind::Keyword(Keyword::Throw) => {
                self.advance();
                let operand = self.parse_expr()?;
                Ok(Expr::Throw(ThrowExpr {
                    operand: Box::new(operand),
                    span: self.span_from(start),
                }))
            }
            TokenKind::LBrace => self.parse_initializer().map(Expr::Initializer),
            TokenKind::LBracket => {
                // collection expression: `[a, b, ..rest]`
                let elements = self
                    .parse_arguments(&TokenKind::RBracket)?
                    .into_iter()
                    .map(|arg| arg.expr)
                    .collect();
                Ok(Expr::Initializer(InitializerExpr {
                    elements,
                    span: self.span_from(start),
                }))
            }
            _ => self.error("expected expression"),
        }
    }

    fn parse_paren_or_tuple(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();
        let first = self.parse_argument(true)?;
        if !self.at(&TokenKind::Comma)
            && first.name.is_none()
            && first.modifier.is_none()
            && !matches!(first.expr, Expr::Declaration(_))
        {
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Expr::Paren(ParenExpr {
                inner: Box::new(first.expr),
                span: self.span_from(start),
            }));
        }
        let mut elements = vec![first];
        while self.eat(&TokenKind::Comma) {
            elements.push(self.parse_argument(true)?);
        }
        self.expect(&TokenKind::RParen, "')' to close tuple")?;
        Ok(Expr::Tuple(TupleExpr {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_new(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();
        let mut ty = None;
        let mut args = Vec::new();
        match self.kind() {
            TokenKind::LBracket => {
                // implicitly typed array: `new[] { ... }`
                self.skip_balanced()?;
            }
            TokenKind::LBrace => {}
            TokenKind::LParen => args = self.parse_arguments(&TokenKind::RParen)?,
            _ => {
                let mut created = self.parse_non_array_type()?;
                if self.at(&TokenKind::Question) && self.nullable_marker_follows() {
                    self.advance();
                    created.nullable = true;
                }
                while self.at(&TokenKind::LBracket) {
                    if matches!(self.kind_at(1), TokenKind::RBracket | TokenKind::Comma) {
                        self.skip_balanced()?;
                    } else {
                        args.extend(self.parse_arguments(&TokenKind::RBracket)?);
                    }
                    created.array_rank += 1;
                }
                if created.array_rank == 0 && self.at(&TokenKind::LParen) {
                    args = self.parse_arguments(&TokenKind::RParen)?;
                }
                created.span = self.span_from(created.span.start);
                ty = Some(created);
            }
        }
        let initializer = if self.at(&TokenKind::LBrace) {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        Ok(Expr::New(ObjectCreation {
            ty,
            args,
            initializer,
            span: self.span_from(start),
        }))
    }

    fn parse_initializer(&mut self) -> PResult<InitializerExpr> {
        let start = self.start();
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut elements = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            elements.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RBrace, "',' or '}' in initializer")?;
                break;
            }
        }
        Ok(InitializerExpr {
            elements,
            span: self.span_from(start),
        })
    }

    fn parse_interpolated(&mut self) -> PResult<InterpolatedString> {
        let start = self.start();
        self.expect(&TokenKind::InterpolatedStart, "interpolated string")?;
        let mut holes = Vec::new();
        loop {
            match self.kind() {
                TokenKind::InterpolatedText => {
                    self.advance();
                }
                TokenKind::InterpolationOpen => {
                    let hole_start = self.start();
                    self.advance();
                    let expr = self.parse_expr()?;
                    let alignment = if self.eat(&TokenKind::Comma) {
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    self.eat(&TokenKind::InterpolationFormat);
                    self.expect(&TokenKind::InterpolationClose, "'}' to close interpolation")?;
                    holes.push(Interpolation {
                        expr,
                        alignment,
                        span: self.span_from(hole_start),
                    });
                }
                TokenKind::InterpolatedEnd => {
                    self.advance();
                    return Ok(InterpolatedString {
                        holes,
                        span: self.span_from(start),
                    });
                }
                _ => return self.error("expected end of interpolated string"),
            }
        }
    }

    /// `from x in` or `from T x in` at the cursor.
    fn query_follows(&self) -> bool {
        if !self.at_ident("from") {
            return false;
        }
        let in_at = |ahead| self.kind_at(ahead) == &TokenKind::Keyword(Keyword::In);
        let typed = matches!(self.kind_at(2), TokenKind::Identifier(_)) && in_at(3);
        match self.kind_at(1) {
            TokenKind::Identifier(_) => in_at(2) || typed,
            TokenKind::Keyword(keyword) => keyword.is_predefined_type() && typed,
            _ => false,
        }
    }

    fn parse_query(&mut self) -> PResult<QueryExpr> {
        let start = self.start();
        let mut variables = Vec::new();
        let mut clauses = Vec::new();
        loop {
            let TokenKind::Identifier(clause) = self.kind() else {
                return self.error("expected query clause");
            };
            match clause.as_str() {
                "from" | "join" => {
                    self.advance();
                    variables.push(self.parse_range_variable()?);
                    self.expect_keyword(Keyword::In, "'in' in query clause")?;
                    clauses.push(self.parse_expr()?);
                    if clause == "join" {
                        self.expect_contextual("on", "'on' in join clause")?;
                        clauses.push(self.parse_expr()?);
                        self.expect_contextual("equals", "'equals' in join clause")?;
                        clauses.push(self.parse_expr()?);
                        if self.at_ident("into") {
                            self.advance();
                            variables.push(self.expect_ident("join variable")?);
                        }
                    }
                }
                "let" => {
                    self.advance();
                    variables.push(self.expect_ident("let variable")?);
                    self.expect(&TokenKind::Eq, "'=' in let clause")?;
                    clauses.push(self.parse_expr()?);
                }
                "where" => {
                    self.advance();
                    clauses.push(self.parse_expr()?);
                }
                "orderby" => {
                    self.advance();
                    loop {
                        clauses.push(self.parse_expr()?);
                        if self.at_ident("ascending") || self.at_ident("descending") {
                            self.advance();
                        }
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                "select" | "group" => {
                    self.advance();
                    clauses.push(self.parse_expr()?);
                    if clause == "group" {
                        self.expect_contextual("by", "'by' in group clause")?;
                        clauses.push(self.parse_expr()?);
                    }
                    // continuation: `... into g from ...` or `... into g select ...`
                    if !self.at_ident("into") {
                        break;
                    }
                    self.advance();
                    variables.push(self.expect_ident("query continuation")?);
                }
                _ => return self.error("expected query clause"),
            }
        }
        Ok(QueryExpr {
            variables,
            clauses,
            span: self.span_from(start),
        })
    }

    /// `x` or `T x` before `in`.
    fn parse_range_variable(&mut self) -> PResult<Ident> {
        if self.kind_at(1) != &TokenKind::Keyword(Keyword::In) {
            self.parse_type()?;
        }
        self.expect_ident("range variable")
    }

    fn expect_contextual(&mut self, word: &str, what: &str) -> PResult<()> {
        if !self.at_ident(word) {
            return self.error(&format!("expected {what}"));
        }
        self.advance();
        Ok(())
    }

    /// Lambda at the cursor, if any: `x => ...`, `(a, b) => ...`,
    /// `async x => ...`, `static () => ...`.
    fn try_parse_lambda(&mut self) -> PResult<Option<Expr>> {
        let save = self.cursor;
        let start = self.start();
        loop {
            let modifier = match self.kind() {
                TokenKind::Keyword(Keyword::Static) => true,
                TokenKind::Identifier(text) => {
                    text == "async"
                        && matches!(self.kind_at(1), TokenKind::Identifier(_) | TokenKind::LParen)
                }
                _ => false,
            };
            if !modifier {
                break;
            }
            self.advance();
        }

        let parameters = match self.kind() {
            TokenKind::Identifier(_) if self.kind_at(1) == &TokenKind::FatArrow => {
                vec![self.expect_ident("lambda parameter")?]
            }
            TokenKind::LParen => match self.matching_close(self.cursor) {
                Some(close) if self.tokens[close + 1].kind == TokenKind::FatArrow => {
                    let parameters = self.lambda_parameters(self.cursor + 1, close);
                    self.cursor = close + 1;
                    parameters
                }
                _ => {
                    self.cursor = save;
                    return Ok(None);
                }
            },
            _ => {
                self.cursor = save;
                return Ok(None);
            }
        };

        self.expect(&TokenKind::FatArrow, "'=>'")?;
        let body = if self.at(&TokenKind::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            LambdaBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(Some(Expr::Lambda(LambdaExpr {
            parameters,
            body,
            span: self.span_from(start),
        })))
    }

    /// Last identifier of each comma-separated segment in `tokens[from..to]`.
    fn lambda_parameters(&self, from: usize, to: usize) -> Vec<Ident> {
        let mut parameters = Vec::new();
        let mut last = None;
        let mut depth = 0usize;
        for token in &self.tokens[from..to] {
            match &token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::Lt => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::Gt => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => parameters.extend(last.take()),
                TokenKind::Identifier(text) if depth == 0 => {
                    last = Some(Ident {
                        text: text.clone(),
                        span: token.span,
                    })
                }
                _ => {}
            }
        }
        parameters.extend(last);
        parameters
    }

    /// Index of the token closing the delimiter at `open`.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    // ============================================================
    // Token helpers
    // ============================================================

    fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &'a Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + ahead).min(last)]
    }

    fn kind(&self) -> &'a TokenKind {
        &self.peek().kind
    }

    fn kind_at(&self, ahead: usize) -> &'a TokenKind {
        &self.peek_at(ahead).kind
    }

    /// True when the token `ahead` starts exactly where the previous one ends.
    fn adjacent(&self, ahead: usize) -> bool {
        self.peek_at(ahead - 1).span.end == self.peek_at(ahead).span.start
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.kind() == &TokenKind::Keyword(keyword)
    }

    fn at_ident(&self, text: &str) -> bool {
        matches!(self.kind(), TokenKind::Identifier(t) if t == text)
    }

    fn is_ident(&self) -> bool {
        matches!(self.kind(), TokenKind::Identifier(_))
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(&TokenKind::Keyword(keyword))
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<&'a Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            self.error(&format!("expected {what}"))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, what: &str) -> PResult<&'a Token> {
        self.expect(&TokenKind::Keyword(keyword), what)
    }

    fn expect_ident(&mut self, what: &str) -> PResult<Ident> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Identifier(text) => {
                self.advance();
                Ok(Ident {
                    text: text.clone(),
                    span: token.span,
                })
            }
            _ => self.error(&format!("expected {what}")),
        }
    }

    fn start(&self) -> usize {
        self.peek().span.start
    }

    fn prev_end(&self) -> usize {
        match self.cursor.checked_sub(1) {
            Some(prev) => self.tokens[prev].span.end,
            None => 0,
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn text(&self, token: &Token) -> &'a str {
        &self.source[token.span.start..token.span.end]
    }

    fn error<T>(&self, message: &str) -> PResult<T> {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", self.text(token)),
        };
        Err(SyntaxError::new(
            format!("{message}, found {found}"),
            token.span.start,
        ))
    }

    /// Consume a delimited group starting at the cursor.
    fn skip_balanced(&mut self) -> PResult<()> {
        let open = self.start();
        let mut depth = 0usize;
        loop {
            match self.advance().kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(SyntaxError::new("unbalanced delimiter", open)),
                _ => {}
            }
        }
    }

    /// Advance to the first depth-zero token matching `stop`, skipping
    /// delimited groups whole.
    fn skip_until(&mut self, stop: impl Fn(&TokenKind) -> bool) -> PResult<()> {
        loop {
            let kind = self.kind();
            if stop(kind) {
                return Ok(());
            }
            match kind {
                TokenKind::Eof => return self.error("unexpected end of file"),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    self.skip_balanced()?
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    return self.error("unbalanced closing delimiter");
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_to_semicolon(&mut self) -> PResult<()> {
        self.skip_until(|k| matches!(k, TokenKind::Semicolon))?;
        self.advance();
        Ok(())
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary(BinaryExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn method_body(source: &str) -> Vec<Stmt> {
        let unit = parse_source(source).unwrap();
        let bodies = unit.method_bodies();
        match &bodies[0].method.body {
            Some(Body::Block(block)) => block.stmts.clone(),
            other => panic!("expected block body, got {other:?}"),
        }
    }

    fn single_expr(body: &str) -> Expr {
        let source = format!("class C {{ void M() {{ {body} }} }}");
        match method_body(&source).remove(0) {
            Stmt::Expr { expr, .. } => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn as_call(expr: &Expr) -> &CallExpr {
        match expr {
            Expr::Call(call) => call,
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_class_with_methods() {
        let source = r#"
using System;

namespace ConsoleApplication1
{
    class TypeName
    {
        public void Foo(object obj) { }
        private static int Bar(params object[] args) => args.Length;
    }
}
"#;
        let unit = parse_source(source).unwrap();
        assert_eq!(unit.types.len(), 1);
        let ty = &unit.types[0];
        assert_eq!(ty.name, "TypeName");
        assert_eq!(ty.namespace.as_deref(), Some("ConsoleApplication1"));

        let bodies = unit.method_bodies();
        assert_eq!(bodies.len(), 2);
        let foo = bodies[0].method;
        assert_eq!(foo.name.text, "Foo");
        assert_eq!(foo.parameters[0].ty.name, "object");
        let bar = bodies[1].method;
        assert!(bar.is_static);
        assert!(bar.parameters[0].is_params());
        assert_eq!(bar.parameters[0].ty.array_rank, 1);
        assert!(matches!(bar.body, Some(Body::Expression(_))));
    }

    #[test]
    fn test_parse_file_scoped_namespace_and_constructor() {
        let source = "namespace A.B;\npublic sealed class Widget { public Widget(string name, int size = 3) { } }";
        let unit = parse_source(source).unwrap();
        assert_eq!(unit.types[0].namespace.as_deref(), Some("A.B"));
        let ctor = unit.method_bodies()[0].method;
        assert_eq!(ctor.kind, MethodKind::Constructor);
        assert!(ctor.parameters[1].default.is_some());
    }

    #[test]
    fn test_parse_skips_fields_properties_and_enums() {
        let source = r#"
class C
{
    private readonly List<int> _items = new List<int> { 1, 2 };
    public string Name { get; set; } = "x";
    public int Count => _items.Count;
    public event EventHandler Changed;
    enum Kind { A, B }
    public int this[int i] { get { return i; } }
    public static C operator +(C a, C b) => a;
    void M() { }
}
"#;
        let unit = parse_source(source).unwrap();
        let bodies = unit.method_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].method.name.text, "M");

        let fields: Vec<(&str, String)> = unit.types[0]
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Field(field) => Some((field.name.value(), field.ty.to_string())),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                ("_items", "List<int>".to_string()),
                ("Name", "string".to_string()),
                ("Count", "int".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_named_argument_span_includes_name() {
        let expr = single_expr("Foo(obj2 : $\"abc{2}\");");
        let call = as_call(&expr);
        let arg = &call.args[0];
        assert_eq!(arg.name.as_ref().unwrap().text, "obj2");
        assert!(arg.expr.is_interpolated());
        assert_eq!(arg.span.len(), "obj2 : $\"abc{2}\"".len());
        assert_eq!(arg.span.start, arg.name.as_ref().unwrap().span.start);
    }

    #[test]
    fn test_parse_out_declaration_argument() {
        let expr = single_expr("int.TryParse(s, out var n);");
        let call = as_call(&expr);
        assert_eq!(call.method_name(), Some("TryParse"));
        assert_eq!(call.args[1].modifier, Some(ArgModifier::Out));
        assert!(matches!(call.args[1].expr, Expr::Declaration(_)));
    }

    #[test]
    fn test_parse_interpolation_holes_are_expressions() {
        let expr = single_expr("Log($\"{a.B(c),5:N2} and {Inner($\"x{y}\")}\");");
        let call = as_call(&expr);
        let Expr::Interpolated(string) = &call.args[0].expr else {
            panic!("expected interpolated string");
        };
        assert_eq!(string.holes.len(), 2);
        assert!(matches!(string.holes[0].expr, Expr::Call(_)));
        assert!(string.holes[0].alignment.is_some());
        let inner = as_call(&string.holes[1].expr);
        assert!(inner.args[0].expr.is_interpolated());
    }

    #[test]
    fn test_parse_cast_and_parenthesized_expressions() {
        let expr = single_expr("Foo((FormattableString)$\"a{1}\", (x), (object)null);");
        let call = as_call(&expr);
        let Expr::Cast(cast) = &call.args[0].expr else {
            panic!("expected cast");
        };
        assert_eq!(cast.ty.name, "FormattableString");
        assert_eq!(cast.origin, Origin::Source);
        assert!(matches!(call.args[1].expr, Expr::Paren(_)));
        assert!(matches!(call.args[2].expr, Expr::Cast(_)));
    }

    #[test]
    fn test_parse_generic_call_versus_comparison() {
        let expr = single_expr("Foo(Bar<int>(1), a < b, c > d);");
        let call = as_call(&expr);
        assert_eq!(call.args.len(), 3);
        let generic = as_call(&call.args[0].expr);
        let Expr::Name(name) = generic.callee.as_ref() else {
            panic!("expected name callee");
        };
        assert_eq!(name.type_args.len(), 1);
        assert!(matches!(call.args[1].expr, Expr::Binary(_)));
    }

    #[test]
    fn test_parse_lambdas_and_local_functions() {
        let source = r#"
class C
{
    void M()
    {
        Run(() => Log($"a{1}"));
        Run(async x => { await Log($"b{x}"); });
        void Local(object o) { Log(o); }
        Local($"c{2}");
    }
}
"#;
        let stmts = method_body(source);
        assert_eq!(stmts.len(), 4);
        assert!(matches!(stmts[2], Stmt::LocalFunction(_)));
    }

    #[test]
    fn test_parse_query_expressions() {
        let source = r#"
class C
{
    void M(int[] xs)
    {
        var q = from x in xs
                join int y in ys on x equals y into pairs
                let z = x * 2
                where z > 1 && Check($"a{z}")
                orderby z descending, x
                select Format($"b{x}");
        Run(from x in xs group x by x % 2 into g select g.Key);
        Run((from x in xs select x).Count());
    }
}
"#;
        let stmts = method_body(source);
        assert_eq!(stmts.len(), 3);
        let Stmt::Local { declarators, .. } = &stmts[0] else {
            panic!("expected local declaration");
        };
        let Some(Expr::Query(query)) = &declarators[0].init else {
            panic!("expected query expression");
        };
        let names: Vec<&str> = query.variables.iter().map(|v| v.value()).collect();
        assert_eq!(names, vec!["x", "y", "pairs", "z"]);
        assert_eq!(query.clauses.len(), 9);
        assert!(matches!(query.clauses.last(), Some(Expr::Call(_))));

        let Stmt::Expr { expr, .. } = &stmts[1] else {
            panic!("expected expression statement");
        };
        let Expr::Query(grouped) = &as_call(expr).args[0].expr else {
            panic!("expected query argument");
        };
        assert_eq!(grouped.variables.len(), 2);
        assert_eq!(grouped.clauses.len(), 4);
    }

    #[test]
    fn test_parse_from_as_plain_identifier() {
        let call = single_expr("Send(from, to);");
        assert_eq!(as_call(&call).args.len(), 2);
    }

    #[test]
    fn test_parse_statements() {
        let source = r#"
class C
{
    IEnumerable<int> M(int[] xs)
    {
        var total = 0;
        for (int i = 0; i < xs.Length; i++) { total += xs[i]; }
        foreach (var (a, b) in pairs) Log(a);
        while (total > 0) total--;
        do { total++; } while (total < 3);
        using (var s = Open()) { }
        using var t = Open();
        switch (total) { case 1 when total > 0: case 2: break; default: return; }
        try { Throw(); } catch (Exception e) when (e != null) { } finally { }
        if (xs is { Length: > 0 } && xs?[0] == 1) { yield return xs[0]!; } else yield break;
        var y = total switch { 0 => "zero", _ => $"{total}" };
        lock (this) { }
        label: total = total >> 1;
    }
}
"#;
        let stmts = method_body(source);
        assert_eq!(stmts.len(), 13);
    }

    #[test]
    fn test_parse_object_creation_forms() {
        let expr = single_expr("Use(new Foo(1) { A = 2 }, new[] { 1 }, new { X = 1 }, new int[3], new());");
        let call = as_call(&expr);
        assert_eq!(call.args.len(), 5);
        let Expr::New(first) = &call.args[0].expr else {
            panic!("expected object creation");
        };
        assert_eq!(first.ty.as_ref().unwrap().name, "Foo");
        assert_eq!(first.args.len(), 1);
        assert!(first.initializer.is_some());
    }

    #[test]
    fn test_parse_qualified_object_type() {
        let unit =
            parse_source("class C { void M(global::System.Object a, object?[] b, System.Object c) { } }")
                .unwrap();
        let params = &unit.method_bodies()[0].method.parameters;
        assert_eq!(params[0].ty.name, "global::System.Object");
        assert!(params[1].ty.nullable);
        assert_eq!(params[1].ty.array_rank, 1);
        assert_eq!(params[2].ty.name, "System.Object");
    }

    #[test]
    fn test_parse_top_level_statements_are_accepted() {
        let unit = parse_source("using System;\nConsole.WriteLine($\"hi {1}\");\nclass C { }").unwrap();
        assert_eq!(unit.types.len(), 1);
    }

    #[test]
    fn test_parse_error_reports_offset() {
        let err = parse_source("class C { void M() { Foo(; } }").unwrap_err();
        assert_eq!(err.offset, 25);
        assert!(err.message.starts_with("expected expression"));
    }

    #[test]
    fn test_parse_missing_close_brace_is_error() {
        assert!(parse_source("class C { void M() { Foo(1);").is_err());
    }
}
