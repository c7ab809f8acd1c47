use serde::Deserialize;

/// A row from the `books_with_ratings` view (or the raw `books` table for
/// admin pages). The remote schema owns these records; unknown or missing
/// fields default rather than fail the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookRow {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub copies_total: Option<i64>,
    #[serde(default)]
    pub copies_borrowed: Option<i64>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingRow {
    pub book_id: i64,
    pub rating: i64,
}

/// Active borrow for the caller, pulled from the `borrow_history` view with
/// `status=eq.borrowed`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveBorrowRow {
    pub book_id: i64,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRow {
    #[serde(default)]
    pub book_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub borrowed_at: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub returned_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalRow {
    #[serde(default)]
    pub is_approved: bool,
}

/// A book as the caller sees it: the remote row plus the fields derived by
/// joining the caller's ratings and active borrows.
#[derive(Debug, Clone)]
pub struct BookView {
    pub book: BookRow,
    pub available_copies: i64,
    pub my_rating: Option<i64>,
    pub my_borrowed: bool,
    pub my_due_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BooksQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateForm {
    pub rating: i64,
}
