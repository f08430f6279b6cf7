use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A billing relationship, typically one per enrolled student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            notes: None,
        }
    }
}

impl Identifiable for Account {
    type Id = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.name, self.id)
    }
}
