//! Server-rendered pages. Deliberately plain: a shared layout, small
//! `format!`-assembled bodies, and a banner slot fed by the `?msg=` code.

use axum::response::Html;
use std::fmt::Write;

use crate::admin::dto::ProfileRow;
use crate::books::dto::{BookRow, BookView, HistoryRow};
use crate::session::Session;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, session: Option<&Session>, banner: Option<&str>, body: &str) -> Html<String> {
    let nav = match session {
        Some(s) => format!(
            r#"<nav><a href="/books?filter=all">Books</a> <a href="/history">History</a> <a href="/logout">Logout ({})</a></nav>"#,
            escape(&s.email)
        ),
        None => r#"<nav><a href="/login">Login</a> <a href="/signup">Signup</a> <a href="/faq">FAQ</a> <a href="/about">About</a></nav>"#.into(),
    };
    let banner = banner
        .map(|b| format!(r#"<p class="banner">{}</p>"#, escape(b)))
        .unwrap_or_default();
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>{nav}{banner}{body}</body></html>",
        title = escape(title),
    ))
}

pub fn welcome() -> Html<String> {
    layout(
        "Home",
        None,
        Some("Welcome! Please login or signup."),
        r#"<h1>Class Library</h1><p><a href="/login">Login</a> or <a href="/signup">Signup</a></p>"#,
    )
}

pub fn signup_page(banner: Option<&str>) -> Html<String> {
    layout(
        "Signup",
        None,
        banner,
        r#"<h1>Signup</h1>
<form method="post" action="/signup">
<input name="full_name" placeholder="Full name" required>
<input name="email" type="email" placeholder="Email" required>
<input name="password" type="password" placeholder="Password" required>
<button type="submit">Signup</button>
</form>"#,
    )
}

pub fn login_page(banner: Option<&str>) -> Html<String> {
    layout(
        "Login",
        None,
        banner,
        r#"<h1>Login</h1>
<form method="post" action="/login">
<input name="email" type="email" placeholder="Email" required>
<input name="password" type="password" placeholder="Password" required>
<button type="submit">Login</button>
</form>
<p><a href="/forgot">Forgot password?</a></p>"#,
    )
}

pub fn forgot_page(banner: Option<&str>) -> Html<String> {
    layout(
        "Forgot Password",
        None,
        banner,
        r#"<h1>Forgot Password</h1>
<form method="post" action="/forgot">
<input name="email" type="email" placeholder="Email" required>
<button type="submit">Send reset link</button>
</form>"#,
    )
}

pub fn reset_page() -> Html<String> {
    layout(
        "Reset Password",
        None,
        None,
        r#"<h1>Reset Password</h1><p>Open the link from your email and follow the instructions to set a new password, then <a href="/login">login</a>.</p>"#,
    )
}

pub fn faq_page(session: Option<&Session>) -> Html<String> {
    layout(
        "FAQ",
        session,
        None,
        r#"<h1>FAQ</h1><p>Borrowed copies are due back in two weeks. Ask an admin to approve your account before your first borrow.</p>"#,
    )
}

pub fn about_page(session: Option<&Session>) -> Html<String> {
    layout(
        "About",
        session,
        None,
        r#"<h1>About</h1><p>A small shared library for our class: browse, borrow, return, and rate books.</p>"#,
    )
}

pub fn books_page(
    session: &Session,
    views: &[BookView],
    q: &str,
    filter: &str,
    banner: Option<&str>,
) -> Html<String> {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<h1>Books</h1>
<form method="get" action="/books">
<input name="q" value="{q}" placeholder="Search title, author, code">
<input type="hidden" name="filter" value="{filter}">
<button type="submit">Search</button>
</form>
<p><a href="/books?filter=all">All</a> <a href="/books?filter=available">Available</a> <a href="/books?filter=reserved">Reserved</a> <a href="/books?filter=mine">Mine</a></p>"#,
        q = escape(q),
        filter = escape(filter),
    );
    body.push_str("<ul>");
    for v in views {
        let b = &v.book;
        let image = b
            .image_url
            .as_deref()
            .map(|u| format!(r#"<img src="{}" alt="" width="60">"#, escape(u)))
            .unwrap_or_default();
        let rating = match v.my_rating {
            Some(r) => format!("my rating: {r}"),
            None => format!(
                r#"<form method="post" action="/rate/{id}"><select name="rating">
<option>1</option><option>2</option><option>3</option><option>4</option><option selected>5</option>
</select><button type="submit">Rate</button></form>"#,
                id = b.id
            ),
        };
        let action = if v.my_borrowed {
            let due = v
                .my_due_date
                .as_deref()
                .map(|d| format!(" (due {})", escape(d)))
                .unwrap_or_default();
            format!(
                r#"<form method="post" action="/return/{id}"><button type="submit">Return{due}</button></form>"#,
                id = b.id
            )
        } else if v.available_copies > 0 {
            format!(
                r#"<form method="post" action="/borrow/{id}"><button type="submit">Borrow</button></form>"#,
                id = b.id
            )
        } else {
            "<em>No copies left</em>".into()
        };
        let _ = write!(
            body,
            "<li>{image}<strong>{title}</strong> by {author} [{code}] - {avail} available. {rating} {action}</li>",
            title = escape(&b.title),
            author = escape(&b.author),
            code = escape(&b.code),
            avail = v.available_copies,
        );
    }
    body.push_str("</ul>");
    layout("Books", Some(session), banner, &body)
}

pub fn history_page(session: &Session, rows: &[HistoryRow]) -> Html<String> {
    let mut body = String::from("<h1>My History</h1><table><tr><th>Book</th><th>Borrowed</th><th>Due</th><th>Returned</th><th>Status</th></tr>");
    for r in rows {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(r.title.as_deref().unwrap_or("-")),
            escape(r.borrowed_at.as_deref().unwrap_or("-")),
            escape(r.due_date.as_deref().unwrap_or("-")),
            escape(r.returned_at.as_deref().unwrap_or("-")),
            escape(r.status.as_deref().unwrap_or("-")),
        );
    }
    body.push_str("</table>");
    layout("My History", Some(session), None, &body)
}

pub fn admin_books_page(session: &Session, books: &[BookRow], banner: Option<&str>) -> Html<String> {
    let mut body = String::from(
        r#"<h1>Admin Books</h1><p><a href="/admin/books/new">Add book</a> <a href="/admin/users">Users</a></p><table>
<tr><th>Title</th><th>Author</th><th>Code</th><th>Total</th><th>Borrowed</th><th></th></tr>"#,
    );
    for b in books {
        let _ = write!(
            body,
            r#"<tr><td>{title}</td><td>{author}</td><td>{code}</td>
<td><form method="post" action="/admin/books/{id}/copies"><input name="copies_total" type="number" value="{total}" min="0"><button type="submit">Update</button></form></td>
<td>{borrowed}</td>
<td><form method="post" action="/admin/books/{id}/delete"><button type="submit">Delete</button></form></td></tr>"#,
            id = b.id,
            title = escape(&b.title),
            author = escape(&b.author),
            code = escape(&b.code),
            total = b.copies_total.unwrap_or(1),
            borrowed = b.copies_borrowed.unwrap_or(0),
        );
    }
    body.push_str("</table>");
    layout("Admin Books", Some(session), banner, &body)
}

pub fn admin_add_book_page(session: &Session, banner: Option<&str>) -> Html<String> {
    layout(
        "Add Book",
        Some(session),
        banner,
        r#"<h1>Add Book</h1>
<form method="post" action="/admin/books/new" enctype="multipart/form-data">
<input name="title" placeholder="Title" required>
<input name="author" placeholder="Author" required>
<input name="code" placeholder="Code" required>
<textarea name="description" placeholder="Description"></textarea>
<input name="copies_total" type="number" value="1" min="1">
<input name="image" type="file" accept="image/*">
<button type="submit">Add</button>
</form>"#,
    )
}

pub fn admin_users_page(
    session: &Session,
    profiles: &[ProfileRow],
    banner: Option<&str>,
) -> Html<String> {
    let mut body = String::from(
        "<h1>Users</h1><table><tr><th>Name</th><th>Email</th><th>Approved</th><th></th></tr>",
    );
    for p in profiles {
        let approve = if p.is_approved {
            String::new()
        } else {
            format!(
                r#"<form method="post" action="/admin/users/{}/approve"><button type="submit">Approve</button></form>"#,
                escape(&p.user_id)
            )
        };
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(p.full_name.as_deref().unwrap_or("-")),
            escape(p.email.as_deref().unwrap_or("-")),
            if p.is_approved { "yes" } else { "no" },
            approve,
        );
    }
    body.push_str("</table>");
    layout("Admin Users", Some(session), banner, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<b>"Tom & Jerry's"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn book_titles_are_escaped_in_the_list() {
        let session = Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user_id: "u".into(),
            email: "reader@example.com".into(),
        };
        let view = BookView {
            book: BookRow {
                id: 1,
                title: "<script>alert(1)</script>".into(),
                ..Default::default()
            },
            available_copies: 1,
            my_rating: None,
            my_borrowed: false,
            my_due_date: None,
        };
        let Html(page) = books_page(&session, &[view], "", "all", None);
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
