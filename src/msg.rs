use axum::response::Redirect;
use serde::Deserialize;

/// Every user-facing outcome travels as a short opaque code in a redirect's
/// `?msg=` query parameter; the destination page turns it back into text.
/// Keeping codes, text, and remote-failure classification in one table is
/// deliberate: the remote error bodies are matched by substring, and that
/// coupling should live in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    // books
    Borrowed,
    Returned,
    NoCopiesLeft,
    BorrowError,
    ReturnError,
    NotYourBook,
    AwaitApproval,
    Rated,
    AlreadyRated,
    RateError,
    NotAdmin,
    // admin books
    Created,
    UploadError,
    Updated,
    UpdateError,
    CopiesTooLow,
    Deleted,
    DeleteError,
    CantDeleteReserved,
    // admin users
    Approved,
    ApproveError,
    // auth
    Confirm,
    SignupError,
    LoginError,
    Sent,
    ForgotError,
}

impl Msg {
    pub fn code(self) -> &'static str {
        match self {
            Msg::Borrowed => "borrowed",
            Msg::Returned => "returned",
            Msg::NoCopiesLeft => "no_copies_left",
            Msg::BorrowError => "borrow_error",
            Msg::ReturnError => "return_error",
            Msg::NotYourBook => "not_your_book",
            Msg::AwaitApproval => "await_approval",
            Msg::Rated => "rated",
            Msg::AlreadyRated => "already_rated",
            Msg::RateError => "rate_error",
            Msg::NotAdmin => "not_admin",
            Msg::Created => "created",
            Msg::UploadError => "upload_error",
            Msg::Updated => "updated",
            Msg::UpdateError => "update_error",
            Msg::CopiesTooLow => "copies_too_low",
            Msg::Deleted => "deleted",
            Msg::DeleteError => "delete_error",
            Msg::CantDeleteReserved => "cant_delete_reserved",
            Msg::Approved => "approved",
            Msg::ApproveError => "approve_error",
            Msg::Confirm => "confirm",
            Msg::SignupError => "signup_error",
            Msg::LoginError => "login_error",
            Msg::Sent => "sent",
            Msg::ForgotError => "forgot_error",
        }
    }

    /// Human-readable banner for a code carried by an incoming request.
    /// Unknown codes render no banner at all.
    pub fn text(code: &str) -> Option<&'static str> {
        Some(match code {
            "borrowed" => "✅ Copy borrowed.",
            "returned" => "✅ Copy returned.",
            "no_copies_left" => "⚠️ No copies left.",
            "borrow_error" => "❌ Borrow failed. Try again.",
            "return_error" => "❌ Return failed. Try again.",
            "not_your_book" => "⚠️ You are not the one borrowing this book.",
            "await_approval" => "⚠️ Your account is awaiting admin approval.",
            "rated" => "✅ Thanks! Your rating was saved.",
            "already_rated" => "⚠️ You already rated this book.",
            "rate_error" => "❌ Rating failed. Try again.",
            "not_admin" => "⚠️ You do not have admin access.",
            "created" => "✅ Book added.",
            "upload_error" => "❌ Upload failed.",
            "updated" => "✅ Updated.",
            "update_error" => "❌ Update error.",
            "copies_too_low" => "⚠️ copies_total cannot be lower than copies_borrowed.",
            "deleted" => "✅ Deleted.",
            "delete_error" => "❌ Delete error.",
            "cant_delete_reserved" => "⚠️ Can't delete (some copies borrowed).",
            "approved" => "✅ User approved.",
            "approve_error" => "❌ Approval failed.",
            "confirm" => "Account created. Check your email to confirm, then login.",
            "signup_error" => "❌ Signup failed. Try again.",
            "login_error" => "Login failed. Check email/password.",
            "sent" => "✅ Check your email (including spam).",
            "forgot_error" => "❌ Something went wrong. Try again.",
            _ => return None,
        })
    }
}

/// Query parameters of pages that show a status banner.
#[derive(Debug, Default, Deserialize)]
pub struct MsgQuery {
    #[serde(default)]
    pub msg: Option<String>,
}

impl MsgQuery {
    pub fn banner(&self) -> Option<&'static str> {
        self.msg.as_deref().and_then(Msg::text)
    }
}

/// 303 redirect to the book list carrying a status code.
pub fn to_books(msg: Msg) -> Redirect {
    Redirect::to(&format!("/books?filter=all&msg={}", msg.code()))
}

/// 303 redirect to an arbitrary page carrying a status code.
pub fn to_page(path: &str, msg: Msg) -> Redirect {
    Redirect::to(&format!("{path}?msg={}", msg.code()))
}

// Failure classification. The remote contract exposes no structured error
// codes, so known failure modes are recognized by substring in the
// lowercased response body, falling back to the per-action generic code.

pub fn classify_borrow(body: &str) -> Msg {
    if body.to_lowercase().contains("no_copies_left") {
        Msg::NoCopiesLeft
    } else {
        Msg::BorrowError
    }
}

pub fn classify_return(body: &str) -> Msg {
    if body.to_lowercase().contains("not_your_book") {
        Msg::NotYourBook
    } else {
        Msg::ReturnError
    }
}

pub fn classify_rating(body: &str) -> Msg {
    let body = body.to_lowercase();
    if body.contains("duplicate") || body.contains("unique") {
        Msg::AlreadyRated
    } else {
        Msg::RateError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_maps_to_text() {
        let all = [
            Msg::Borrowed,
            Msg::Returned,
            Msg::NoCopiesLeft,
            Msg::BorrowError,
            Msg::ReturnError,
            Msg::NotYourBook,
            Msg::AwaitApproval,
            Msg::Rated,
            Msg::AlreadyRated,
            Msg::RateError,
            Msg::NotAdmin,
            Msg::Created,
            Msg::UploadError,
            Msg::Updated,
            Msg::UpdateError,
            Msg::CopiesTooLow,
            Msg::Deleted,
            Msg::DeleteError,
            Msg::CantDeleteReserved,
            Msg::Approved,
            Msg::ApproveError,
            Msg::Confirm,
            Msg::SignupError,
            Msg::LoginError,
            Msg::Sent,
            Msg::ForgotError,
        ];
        for msg in all {
            assert!(Msg::text(msg.code()).is_some(), "no text for {:?}", msg);
        }
    }

    #[test]
    fn unknown_code_renders_no_banner() {
        assert_eq!(Msg::text("nonsense"), None);
        assert_eq!(Msg::text(""), None);
    }

    #[test]
    fn borrow_failures_classified_by_substring() {
        assert_eq!(
            classify_borrow(r#"{"message":"NO_COPIES_LEFT"}"#),
            Msg::NoCopiesLeft
        );
        assert_eq!(classify_borrow("permission denied"), Msg::BorrowError);
    }

    #[test]
    fn return_failures_classified_by_substring() {
        assert_eq!(
            classify_return(r#"{"message":"not_your_book"}"#),
            Msg::NotYourBook
        );
        assert_eq!(classify_return("whatever"), Msg::ReturnError);
    }

    #[test]
    fn rating_failures_classified_by_substring() {
        assert_eq!(
            classify_rating("duplicate key value violates unique constraint"),
            Msg::AlreadyRated
        );
        assert_eq!(
            classify_rating("UNIQUE violation on ratings_user_book"),
            Msg::AlreadyRated
        );
        assert_eq!(classify_rating("row level security"), Msg::RateError);
    }
}
