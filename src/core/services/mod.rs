pub mod cycle_service;
pub mod reconciliation_service;
pub mod report_service;
pub mod schedule_service;

pub use cycle_service::CycleService;
pub use reconciliation_service::{ReconciledRecords, ReconciliationService, RecordQuery};
pub use report_service::ReportService;
pub use schedule_service::ScheduleService;
