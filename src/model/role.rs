#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Md = 1,
    DeptHead = 2,
    Hr = 3,
    Accounts = 4,
    Employee = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Md),
            2 => Some(Role::DeptHead),
            3 => Some(Role::Hr),
            4 => Some(Role::Accounts),
            5 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Roles allowed to maintain branches and close other people's sessions.
    pub fn manages_attendance(self) -> bool {
        matches!(self, Role::Md | Role::Hr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_map_to_roles() {
        assert_eq!(Role::from_id(1), Some(Role::Md));
        assert_eq!(Role::from_id(5), Some(Role::Employee));
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(6), None);
    }

    #[test]
    fn only_md_and_hr_manage_attendance() {
        assert!(Role::Md.manages_attendance());
        assert!(Role::Hr.manages_attendance());
        assert!(!Role::DeptHead.manages_attendance());
        assert!(!Role::Accounts.manages_attendance());
        assert!(!Role::Employee.manages_attendance());
    }
}
