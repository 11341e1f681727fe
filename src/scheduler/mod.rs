mod conflicts;
mod registry;
mod types;
mod util;

pub use conflicts::evaluate;
pub use registry::ShiftRegistry;
pub use types::{
    ConflictFinding, ConflictKind, OvertimePolicy, Placement, RuleOptions, SchedError,
    MAX_WINDOW_DAYS,
};

pub(crate) use util::ranges_overlap;
