//! Authorization hook consulted before any cycle mutation.

use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    Assign,
    Edit,
    Close,
}

impl fmt::Display for CycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleAction::Assign => "assign cycle",
            CycleAction::Edit => "edit cycle",
            CycleAction::Close => "close cycle",
        };
        f.write_str(label)
    }
}

/// Decides whether the current caller may perform `action` on an account.
///
/// Returning `Err(reason)` aborts the operation before the store is touched.
pub trait MutationGate: Send + Sync {
    fn authorize(&self, action: CycleAction, account_id: Uuid) -> Result<(), String>;
}

/// Gate that permits every mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl MutationGate for AllowAll {
    fn authorize(&self, _action: CycleAction, _account_id: Uuid) -> Result<(), String> {
        Ok(())
    }
}

/// Gate that rejects every mutation, for read-only roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl MutationGate for ReadOnly {
    fn authorize(&self, action: CycleAction, _account_id: Uuid) -> Result<(), String> {
        Err(format!("{action} requires write access"))
    }
}
