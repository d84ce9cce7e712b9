//! Process-wide index of the builtin service table.
//!
//! Built on first use under a single-execution guard and never rebuilt.
//! Servers that load configuration inject their own index instead.

use once_cell::sync::OnceCell;

use crate::index::{IndexBuilder, IndexResult, PatternIndex};
use crate::registry::TableRegistry;

static BUILTIN_INDEX: OnceCell<PatternIndex> = OnceCell::new();

/// The builtin index, building it on the first call.
///
/// A failed build is returned to the caller and not cached; the next call
/// tries again.
pub fn builtin() -> IndexResult<&'static PatternIndex> {
    BUILTIN_INDEX.get_or_try_init(|| IndexBuilder::with_defaults().build(&TableRegistry::builtin()))
}

/// The builtin index if some caller already built it.
pub fn try_get() -> Option<&'static PatternIndex> {
    BUILTIN_INDEX.get()
}
