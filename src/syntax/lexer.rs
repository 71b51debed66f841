//! Tokenizer for the C# subset read by the reference host.
//!
//! Interpolated strings are split the way the host compiler exposes them: a
//! start token, literal text runs, and for each hole an open token, the hole's
//! ordinary tokens, an optional format token and a close token. Identifiers
//! inside holes are therefore visible to token-level checks.

use super::SyntaxError;
use super::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or contextual keyword, as written (a verbatim `@name` keeps its `@`).
    Identifier(String),
    Keyword(Keyword),
    NumericLiteral,
    StringLiteral,
    CharLiteral,
    /// `$"`, `$@"` or `@$"`.
    InterpolatedStart,
    InterpolatedText,
    /// `{` opening an interpolation hole.
    InterpolationOpen,
    /// `:format` part of a hole, colon included.
    InterpolationFormat,
    /// `}` closing an interpolation hole.
    InterpolationClose,
    /// Closing `"` of an interpolated string.
    InterpolatedEnd,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    DotDot,
    Colon,
    ColonColon,
    Question,
    QuestionDot,
    QuestionQuestion,
    QuestionQuestionEq,
    Eq,
    EqEq,
    BangEq,
    Bang,
    Tilde,
    Lt,
    LtEq,
    Shl,
    ShlEq,
    /// `>` is never merged with a following `>`; the parser joins adjacent
    /// tokens for shifts so that nested generics close cleanly.
    Gt,
    GtEq,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Arrow,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    FatArrow,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abstract,
    As,
    Base,
    Bool,
    Break,
    Byte,
    Case,
    Catch,
    Char,
    Checked,
    Class,
    Const,
    Continue,
    Decimal,
    Default,
    Delegate,
    Do,
    Double,
    Else,
    Enum,
    Event,
    Explicit,
    Extern,
    False,
    Finally,
    Fixed,
    Float,
    For,
    Foreach,
    Goto,
    If,
    Implicit,
    In,
    Int,
    Interface,
    Internal,
    Is,
    Lock,
    Long,
    Namespace,
    New,
    Null,
    Object,
    Operator,
    Out,
    Override,
    Params,
    Private,
    Protected,
    Public,
    Readonly,
    Ref,
    Return,
    Sbyte,
    Sealed,
    Short,
    Sizeof,
    Stackalloc,
    Static,
    String,
    Struct,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Uint,
    Ulong,
    Unchecked,
    Unsafe,
    Ushort,
    Using,
    Virtual,
    Void,
    Volatile,
    While,
}

impl Keyword {
    pub fn from_ident(text: &str) -> Option<Self> {
        use Keyword::*;
        let keyword = match text {
            "abstract" => Abstract,
            "as" => As,
            "base" => Base,
            "bool" => Bool,
            "break" => Break,
            "byte" => Byte,
            "case" => Case,
            "catch" => Catch,
            "char" => Char,
            "checked" => Checked,
            "class" => Class,
            "const" => Const,
            "continue" => Continue,
            "decimal" => Decimal,
            "default" => Default,
            "delegate" => Delegate,
            "do" => Do,
            "double" => Double,
            "else" => Else,
            "enum" => Enum,
            "event" => Event,
            "explicit" => Explicit,
            "extern" => Extern,
            "false" => False,
            "finally" => Finally,
            "fixed" => Fixed,
            "float" => Float,
            "for" => For,
            "foreach" => Foreach,
            "goto" => Goto,
            "if" => If,
            "implicit" => Implicit,
            "in" => In,
            "int" => Int,
            "interface" => Interface,
            "internal" => Internal,
            "is" => Is,
            "lock" => Lock,
            "long" => Long,
            "namespace" => Namespace,
            "new" => New,
            "null" => Null,
            "object" => Object,
            "operator" => Operator,
            "out" => Out,
            "override" => Override,
            "params" => Params,
            "private" => Private,
            "protected" => Protected,
            "public" => Public,
            "readonly" => Readonly,
            "ref" => Ref,
            "return" => Return,
            "sbyte" => Sbyte,
            "sealed" => Sealed,
            "short" => Short,
            "sizeof" => Sizeof,
            "stackalloc" => Stackalloc,
            "static" => Static,
            "string" => String,
            "struct" => Struct,
            "switch" => Switch,
            "this" => This,
            "throw" => Throw,
            "true" => True,
            "try" => Try,
            "typeof" => Typeof,
            "uint" => Uint,
            "ulong" => Ulong,
            "unchecked" => Unchecked,
            "unsafe" => Unsafe,
            "ushort" => Ushort,
            "using" => Using,
            "virtual" => Virtual,
            "void" => Void,
            "volatile" => Volatile,
            "while" => While,
            _ => return None,
        };
        Some(keyword)
    }

    /// Built-in type keywords (`int`, `object`, `string`, ...).
    pub fn is_predefined_type(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            Bool | Byte
                | Char
                | Decimal
                | Double
                | Float
                | Int
                | Long
                | Object
                | Sbyte
                | Short
                | String
                | Uint
                | Ulong
                | Ushort
                | Void
        )
    }

    /// Declaration modifiers that may precede a member or local function.
    pub fn is_modifier(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            Abstract
                | Const
                | Extern
                | Internal
                | Override
                | Private
                | Protected
                | Public
                | Readonly
                | Sealed
                | Static
                | Unsafe
                | Virtual
                | Volatile
                | New
        )
    }
}

/// Tokenize `source`. Trivia (whitespace, comments, preprocessor lines) is dropped.
pub fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    lexer.lex_all()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    cursor: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            cursor: 0,
            tokens: Vec::new(),
        }
    }

    fn lex_all(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.skip_trivia()?;
            if self.is_at_end() {
                break;
            }
            self.lex_token()?;
        }
        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end),
        });
        Ok(())
    }

    /// Lex one token at the cursor. Interpolated strings push their whole token run.
    fn lex_token(&mut self) -> Result<(), SyntaxError> {
        let start = self.offset();
        let current = self.advance();
        match current {
            '{' => self.push(TokenKind::LBrace, start),
            '}' => self.push(TokenKind::RBrace, start),
            '(' => self.push(TokenKind::LParen, start),
            ')' => self.push(TokenKind::RParen, start),
            '[' => self.push(TokenKind::LBracket, start),
            ']' => self.push(TokenKind::RBracket, start),
            ';' => self.push(TokenKind::Semicolon, start),
            ',' => self.push(TokenKind::Comma, start),
            '~' => self.push(TokenKind::Tilde, start),
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.lex_number_tail();
                    self.push(TokenKind::NumericLiteral, start);
                } else if self.eat('.') {
                    self.push(TokenKind::DotDot, start);
                } else {
                    self.push(TokenKind::Dot, start);
                }
            }
            ':' => {
                let kind = if self.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                };
                self.push(kind, start);
            }
            '?' => {
                let kind = if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::QuestionQuestionEq
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else if self.peek() == Some('.')
                    && !self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                {
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                };
                self.push(kind, start);
            }
            '=' => {
                let kind = if self.eat('=') {
                    TokenKind::EqEq
                } else if self.eat('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Eq
                };
                self.push(kind, start);
            }
            '!' => {
                let kind = if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                };
                self.push(kind, start);
            }
            '<' => {
                let kind = if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::ShlEq
                    } else {
                        TokenKind::Shl
                    }
                } else if self.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                };
                self.push(kind, start);
            }
            '>' => {
                let kind = if self.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                };
                self.push(kind, start);
            }
            '+' => {
                let kind = if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                };
                self.push(kind, start);
            }
            '-' => {
                let kind = if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                };
                self.push(kind, start);
            }
            '*' => {
                let kind = if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                };
                self.push(kind, start);
            }
            '/' => {
                let kind = if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                };
                self.push(kind, start);
            }
            '%' => {
                let kind = if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                };
                self.push(kind, start);
            }
            '&' => {
                let kind = if self.eat('&') {
                    TokenKind::AmpAmp
                } else if self.eat('=') {
                    TokenKind::AmpEq
                } else {
                    TokenKind::Amp
                };
                self.push(kind, start);
            }
            '|' => {
                let kind = if self.eat('|') {
                    TokenKind::PipePipe
                } else if self.eat('=') {
                    TokenKind::PipeEq
                } else {
                    TokenKind::Pipe
                };
                self.push(kind, start);
            }
            '^' => {
                let kind = if self.eat('=') {
                    TokenKind::CaretEq
                } else {
                    TokenKind::Caret
                };
                self.push(kind, start);
            }
            '"' if self.peek() == Some('"') && self.peek_at(1) == Some('"') => {
                self.lex_raw_string(start)?;
                self.push(TokenKind::StringLiteral, start);
            }
            '"' => {
                self.lex_string_body(start, false)?;
                self.push(TokenKind::StringLiteral, start);
            }
            '\'' => self.lex_char(start)?,
            '$' => {
                let dollars = 1 + self.eat_run('$');
                match (self.peek(), self.peek_at(1), self.peek_at(2)) {
                    (Some('"'), Some('"'), Some('"')) => {
                        self.lex_raw_interpolated(start, dollars)?;
                    }
                    (Some('"'), _, _) if dollars == 1 => {
                        self.advance();
                        self.lex_interpolated(start, false)?;
                    }
                    (Some('@'), Some('"'), _) if dollars == 1 => {
                        self.advance();
                        self.advance();
                        self.lex_interpolated(start, true)?;
                    }
                    _ => return Err(SyntaxError::new("unexpected character '$'", start)),
                }
            }
            '@' => match (self.peek(), self.peek_at(1)) {
                (Some('"'), _) => {
                    self.advance();
                    self.lex_string_body(start, true)?;
                    self.push(TokenKind::StringLiteral, start);
                }
                (Some('$'), Some('"')) => {
                    self.advance();
                    self.advance();
                    self.lex_interpolated(start, true)?;
                }
                (Some(c), _) if is_ident_start(c) => {
                    self.lex_ident_tail();
                    let text = self.slice(start).to_string();
                    self.push(TokenKind::Identifier(text), start);
                }
                _ => return Err(SyntaxError::new("unexpected character '@'", start)),
            },
            c if c.is_ascii_digit() => {
                self.lex_number_tail();
                self.push(TokenKind::NumericLiteral, start);
            }
            c if is_ident_start(c) => {
                self.lex_ident_tail();
                let text = self.slice(start);
                let kind = match Keyword::from_ident(text) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier(text.to_string()),
                };
                self.push(kind, start);
            }
            other => {
                return Err(SyntaxError::new(
                    format!("unexpected character '{}'", other),
                    start,
                ));
            }
        }
        Ok(())
    }

    fn lex_interpolated(&mut self, start: usize, verbatim: bool) -> Result<(), SyntaxError> {
        self.push(TokenKind::InterpolatedStart, start);

        let mut text_start = self.offset();
        loop {
            let Some(c) = self.peek() else {
                return Err(SyntaxError::new("unterminated interpolated string", start));
            };
            match c {
                '"' if verbatim && self.peek_at(1) == Some('"') => {
                    self.advance();
                    self.advance();
                }
                '"' => {
                    self.push_text(text_start);
                    let end_start = self.offset();
                    self.advance();
                    self.push(TokenKind::InterpolatedEnd, end_start);
                    return Ok(());
                }
                '\\' if !verbatim => {
                    self.advance();
                    if self.advance_opt().is_none() {
                        return Err(SyntaxError::new("unterminated interpolated string", start));
                    }
                }
                '\n' if !verbatim => {
                    return Err(SyntaxError::new("newline in interpolated string", start));
                }
                '{' if self.peek_at(1) == Some('{') => {
                    self.advance();
                    self.advance();
                }
                '}' if self.peek_at(1) == Some('}') => {
                    self.advance();
                    self.advance();
                }
                '{' => {
                    self.push_text(text_start);
                    let open = self.offset();
                    self.advance();
                    self.push(TokenKind::InterpolationOpen, open);
                    self.lex_hole(open, 1)?;
                    text_start = self.offset();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// `$"""..."""` with any number of leading `$`, cursor on the first quote.
    ///
    /// A hole opens with as many `{` as there are `$` and closes with as many
    /// `}`. Shorter brace runs are text. The literal ends at a quote run as
    /// long as the opening one.
    fn lex_raw_interpolated(&mut self, start: usize, dollars: usize) -> Result<(), SyntaxError> {
        let quotes = self.eat_run('"');
        self.push(TokenKind::InterpolatedStart, start);

        let mut text_start = self.offset();
        loop {
            let Some(c) = self.peek() else {
                return Err(SyntaxError::new(
                    "unterminated raw interpolated string",
                    start,
                ));
            };
            match c {
                '"' => {
                    let run_start = self.offset();
                    if self.eat_run('"') >= quotes {
                        self.push_span(TokenKind::InterpolatedText, text_start, run_start);
                        self.push(TokenKind::InterpolatedEnd, run_start);
                        return Ok(());
                    }
                }
                '{' => {
                    let run_start = self.offset();
                    let run = self.eat_run('{');
                    if run < dollars {
                        continue;
                    }
                    // outer braces of a longer run are text
                    let open = run_start + (run - dollars);
                    self.push_span(TokenKind::InterpolatedText, text_start, open);
                    self.push(TokenKind::InterpolationOpen, open);
                    self.lex_hole(open, dollars)?;
                    text_start = self.offset();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Lex the tokens of one hole, up to and including the `braces` closing `}`.
    fn lex_hole(&mut self, open: usize, braces: usize) -> Result<(), SyntaxError> {
        let mut depth = 0usize;
        loop {
            self.skip_trivia()?;
            let Some(c) = self.peek() else {
                return Err(SyntaxError::new("unterminated interpolation hole", open));
            };
            if depth == 0 && c == '}' {
                let close = self.offset();
                if !(0..braces).all(|_| self.eat('}')) {
                    return Err(SyntaxError::new("unterminated interpolation hole", open));
                }
                self.push(TokenKind::InterpolationClose, close);
                return Ok(());
            }
            if depth == 0 && c == ':' && self.peek_at(1) != Some(':') {
                let format_start = self.offset();
                while self.peek().is_some_and(|c| c != '}' && c != '"') {
                    self.advance();
                }
                self.push(TokenKind::InterpolationFormat, format_start);
                continue;
            }
            self.lex_token()?;
            match self.tokens.last().map(|t| &t.kind) {
                Some(TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace) => depth += 1,
                Some(TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace) => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
        }
    }

    fn lex_string_body(&mut self, start: usize, verbatim: bool) -> Result<(), SyntaxError> {
        loop {
            let Some(c) = self.advance_opt() else {
                return Err(SyntaxError::new("unterminated string literal", start));
            };
            match c {
                '"' if verbatim && self.peek() == Some('"') => {
                    self.advance();
                }
                '"' => return Ok(()),
                '\\' if !verbatim => {
                    if self.advance_opt().is_none() {
                        return Err(SyntaxError::new("unterminated string literal", start));
                    }
                }
                '\n' if !verbatim => {
                    return Err(SyntaxError::new("newline in string literal", start));
                }
                _ => {}
            }
        }
    }

    /// `"""..."""`, first quote already consumed. No escapes; ends at a quote
    /// run as long as the opening one.
    fn lex_raw_string(&mut self, start: usize) -> Result<(), SyntaxError> {
        let quotes = 1 + self.eat_run('"');
        loop {
            match self.peek() {
                None => return Err(SyntaxError::new("unterminated raw string literal", start)),
                Some('"') => {
                    if self.eat_run('"') >= quotes {
                        return Ok(());
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_char(&mut self, start: usize) -> Result<(), SyntaxError> {
        loop {
            match self.advance_opt() {
                Some('\\') => {
                    self.advance_opt();
                }
                Some('\'') => break,
                Some('\n') | None => {
                    return Err(SyntaxError::new("unterminated character literal", start));
                }
                Some(_) => {}
            }
        }
        self.push(TokenKind::CharLiteral, start);
        Ok(())
    }

    fn lex_number_tail(&mut self) {
        while let Some(c) = self.peek() {
            let continues = c.is_ascii_alphanumeric()
                || c == '_'
                || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()));
            if !continues {
                break;
            }
            self.advance();
        }
    }

    fn lex_ident_tail(&mut self) {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                // byte order mark
                Some('\u{FEFF}') if self.cursor == 0 => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.offset();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance_opt() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(SyntaxError::new("unterminated comment", start)),
                        }
                    }
                }
                Some('#') if self.at_line_start() => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// True when only whitespace precedes the cursor on the current line.
    fn at_line_start(&self) -> bool {
        let before = &self.source[..self.offset()];
        let line = before.rsplit('\n').next().unwrap_or("");
        line.trim().is_empty()
    }

    fn push_text(&mut self, text_start: usize) {
        if self.offset() > text_start {
            self.push(TokenKind::InterpolatedText, text_start);
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let span = Span::new(start, self.offset());
        self.tokens.push(Token { kind, span });
    }

    /// Push a non-empty token that ends before the cursor.
    fn push_span(&mut self, kind: TokenKind, start: usize, end: usize) {
        if end > start {
            self.tokens.push(Token {
                kind,
                span: Span::new(start, end),
            });
        }
    }

    fn slice(&self, start: usize) -> &'a str {
        &self.source[start..self.offset()]
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.cursor)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len())
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.cursor + ahead).map(|(_, c)| *c)
    }

    fn advance(&mut self) -> char {
        self.advance_opt().unwrap_or('\0')
    }

    fn advance_opt(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += 1;
        Some(c)
    }

    /// Consume consecutive `expected` characters and return how many.
    fn eat_run(&mut self, expected: char) -> usize {
        let mut count = 0;
        while self.eat(expected) {
            count += 1;
        }
        count
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
