use serde::Deserialize;

/// Row from the `user_profiles` collection. The approval flag gates
/// borrowing and is flipped by an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct CopiesForm {
    pub copies_total: i64,
}

/// Projection used by the pre-mutation borrowed-count checks.
#[derive(Debug, Deserialize)]
pub struct BorrowedCountRow {
    #[serde(default)]
    pub copies_borrowed: Option<i64>,
}
