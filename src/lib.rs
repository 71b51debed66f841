//! fmtguard - keeps C# interpolated strings from losing their raw values
//!
//! An interpolated string (`$"..."`) passed to a parameter of type `object`
//! is formatted into a plain `string` on the spot. A `FormattableString`
//! parameter would have kept the format and the raw argument values, which
//! loggers and SQL builders rely on. fmtguard finds such arguments and can
//! rewrite them to `(FormattableString)$"..."`.
//!
//! ## Module Structure
//!
//! - `syntax`: C# lexer, parser, syntax tree and `Document`
//! - `semantic`: callee resolution over a project-wide declaration index
//! - `analysis`: detection of affected arguments
//! - `fix`: the `(FormattableString)` rewrite
//! - `core`: file collection and the project pipeline
//! - `issues`: issue type definitions and reporting
//! - `cli`: command-line interface layer
//! - `mcp`: Model Context Protocol server implementation
//! - `config`: configuration file loading
//! - `logging`: diagnostic logging setup

pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod fix;
pub mod issues;
pub mod logging;
pub mod mcp;
pub mod semantic;
pub mod source;
pub mod syntax;
