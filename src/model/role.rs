use strum_macros::{Display, EnumIter};

/// Role id carried in the access token.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Accountant = 2,
    Employee = 3,
    System = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Accountant),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            _ => None,
        }
    }

    /// Roles allowed to preview, commit and resend payroll.
    pub fn can_settle_payroll(self) -> bool {
        matches!(self, Role::Admin | Role::Accountant | Role::System)
    }
}
