/// Pure user model (no serde); REST and storage have their own shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Storage-generated, immutable.
    pub id: String,
    pub email: String,
    pub email_visibility: bool,
    /// Read-only through this API.
    pub verified: bool,
    pub name: String,
    /// Opaque file reference, read-only through this API.
    pub avatar: String,
    pub created: String,
    pub updated: String,
}

/// Data for creating a new user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub email: String,
    pub email_visibility: bool,
    pub name: String,
}

/// Partial update data for a user.
///
/// `None` leaves the column untouched; `Some` (including `Some("")` and
/// `Some(false)`) overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub email_visibility: Option<bool>,
    pub name: Option<String>,
}

impl UserPatch {
    /// Number of fields present in the patch.
    pub fn field_count(&self) -> usize {
        [
            self.email.is_some(),
            self.email_visibility.is_some(),
            self.name.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}
