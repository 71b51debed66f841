//! Actions for fixing reported issues.
//!
//! ## Architecture
//!
//! ```text
//! Issue (problem detected)
//!     ↓
//! Action (Issue → Operation conversion)
//!     ↓
//! Operation (rewritten file contents)
//!     ↓
//! execute (file modification)
//! ```
//!
//! ## Actions
//!
//! - [`InsertFormattableCast`]: wrap flagged arguments in `(FormattableString)` (fix)

mod insert_cast;
mod operation;
mod traits;

pub use insert_cast::InsertFormattableCast;
pub use operation::{ChangedLine, Operation};
pub(crate) use traits::execute_operations;
pub use traits::{Action, ActionStats};
