//! Ledger access primitives: store filters, patches and due-date arithmetic.

pub mod filter;
pub mod recurrence;

pub use filter::{CycleMatch, InstallmentFilter, InstallmentOrder, InstallmentPatch};
pub use recurrence::{add_months_safe, months_between, next_due_date, project_schedule};
