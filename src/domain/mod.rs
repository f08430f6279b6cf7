//! Pure data types for installments, cycles and the feeds reconciled into reports.

pub mod account;
pub mod common;
pub mod cycle;
pub mod expense;
pub mod installment;
pub mod record;
pub mod report;

pub use account::Account;
pub use common::{compare_display_names, Amounted, Displayable, Identifiable, NamedEntity};
pub use cycle::{CycleRange, CycleState, CycleView};
pub use expense::{Expense, ExpenseStatus};
pub use installment::{
    DisplayStatus, Installment, InstallmentId, ItemCategory, PaymentStatus, SourcePartition,
};
pub use record::{LegacyRow, UnifiedRecord};
pub use report::{
    AgingTotals, Balance, BucketTotal, CategoryRevenue, FinancialOverview, MonthlyRevenue,
    RevenueDimension, UpcomingDue,
};
