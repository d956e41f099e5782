//! Rewrites relative module specifiers so that each one names the file it
//! resolves to, extension included.

pub mod decide;
pub mod engine;
pub mod error;
pub mod guard;
pub mod relative_path;
pub mod rewriter;

pub use decide::{decide, extname, Decision, ResolvedSpecifier, SpecifierMap};
pub use engine::{FileEngine, FileOutcome};
pub use error::RewriteError;
pub use guard::{has_escaped_unicode, unescape_string_literals, BlankLineGuard};
pub use relative_path::{longest_common_prefix, relative_specifier, PathStyle};
pub use rewriter::SpecifierRewriter;
