use std::collections::HashMap;

use super::dto::{ActiveBorrowRow, BookRow, BookView, RatingRow};

/// Join the three independently fetched collections by book id and derive
/// the per-caller fields. A book with no `copies_total` counts as a single
/// copy; `available_copies` never goes negative.
pub fn enrich(
    books: Vec<BookRow>,
    my_ratings: &[RatingRow],
    active_borrows: &[ActiveBorrowRow],
) -> Vec<BookView> {
    let rating_by_book: HashMap<i64, i64> =
        my_ratings.iter().map(|r| (r.book_id, r.rating)).collect();
    let borrow_by_book: HashMap<i64, Option<String>> = active_borrows
        .iter()
        .map(|b| (b.book_id, b.due_date.clone()))
        .collect();

    books
        .into_iter()
        .map(|book| {
            let total = book.copies_total.unwrap_or(1);
            let borrowed = book.copies_borrowed.unwrap_or(0);
            let my_borrowed = borrow_by_book.contains_key(&book.id);
            BookView {
                available_copies: (total - borrowed).max(0),
                my_rating: rating_by_book.get(&book.id).copied(),
                my_due_date: borrow_by_book.get(&book.id).cloned().flatten(),
                my_borrowed,
                book,
            }
        })
        .collect()
}

/// Case-insensitive substring match over title, author, and code.
pub fn search(views: Vec<BookView>, q: &str) -> Vec<BookView> {
    let q = q.trim().to_lowercase();
    if q.is_empty() {
        return views;
    }
    views
        .into_iter()
        .filter(|v| {
            let hay = format!("{} {} {}", v.book.title, v.book.author, v.book.code)
                .to_lowercase();
            hay.contains(&q)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Available,
    Reserved,
    Mine,
}

impl Filter {
    /// Unknown filter values behave like `all`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "available" => Filter::Available,
            "reserved" => Filter::Reserved,
            "mine" => Filter::Mine,
            _ => Filter::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Available => "available",
            Filter::Reserved => "reserved",
            Filter::Mine => "mine",
        }
    }
}

pub fn apply_filter(views: Vec<BookView>, filter: Filter) -> Vec<BookView> {
    match filter {
        Filter::All => views,
        Filter::Available => views
            .into_iter()
            .filter(|v| v.available_copies > 0)
            .collect(),
        Filter::Reserved => views
            .into_iter()
            .filter(|v| v.available_copies == 0)
            .collect(),
        Filter::Mine => views.into_iter().filter(|v| v.my_borrowed).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, author: &str, code: &str, total: i64, borrowed: i64) -> BookRow {
        BookRow {
            id,
            title: title.into(),
            author: author.into(),
            code: code.into(),
            copies_total: Some(total),
            copies_borrowed: Some(borrowed),
            ..Default::default()
        }
    }

    fn sample_views() -> Vec<BookView> {
        let books = vec![
            book(1, "Dune", "Frank Herbert", "SF-001", 3, 1),
            book(2, "Hyperion", "Dan Simmons", "SF-002", 2, 2),
            book(3, "The Hobbit", "Tolkien", "FA-001", 1, 0),
        ];
        let ratings = vec![RatingRow {
            book_id: 1,
            rating: 5,
        }];
        let borrows = vec![ActiveBorrowRow {
            book_id: 2,
            due_date: Some("2026-09-10".into()),
        }];
        enrich(books, &ratings, &borrows)
    }

    #[test]
    fn available_copies_never_negative() {
        let books = vec![
            book(1, "a", "b", "c", 2, 5),
            book(2, "d", "e", "f", 4, 1),
        ];
        let views = enrich(books, &[], &[]);
        assert_eq!(views[0].available_copies, 0);
        assert_eq!(views[1].available_copies, 3);
        assert!(views.iter().all(|v| v.available_copies >= 0));
    }

    #[test]
    fn missing_counts_default_to_one_total_zero_borrowed() {
        let row = BookRow {
            id: 9,
            ..Default::default()
        };
        let views = enrich(vec![row], &[], &[]);
        assert_eq!(views[0].available_copies, 1);
    }

    #[test]
    fn enrichment_joins_ratings_and_borrows_by_book_id() {
        let views = sample_views();
        assert_eq!(views[0].my_rating, Some(5));
        assert!(!views[0].my_borrowed);
        assert_eq!(views[0].my_due_date, None);

        assert_eq!(views[1].my_rating, None);
        assert!(views[1].my_borrowed);
        assert_eq!(views[1].my_due_date.as_deref(), Some("2026-09-10"));
    }

    #[test]
    fn active_borrow_without_due_date_still_counts_as_borrowed() {
        let views = enrich(
            vec![book(7, "a", "b", "c", 1, 1)],
            &[],
            &[ActiveBorrowRow {
                book_id: 7,
                due_date: None,
            }],
        );
        assert!(views[0].my_borrowed);
        assert_eq!(views[0].my_due_date, None);
    }

    #[test]
    fn search_is_case_insensitive_over_title_author_code() {
        let views = sample_views();
        let by_title = search(views.clone(), "dUnE");
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].book.id, 1);

        let by_author = search(views.clone(), "simmons");
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].book.id, 2);

        let by_code = search(views.clone(), "fa-001");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].book.id, 3);

        assert!(search(views, "zzz").is_empty());
    }

    #[test]
    fn blank_query_returns_everything() {
        let views = sample_views();
        assert_eq!(search(views.clone(), "").len(), views.len());
        assert_eq!(search(views.clone(), "   ").len(), views.len());
    }

    #[test]
    fn filters_partition_by_availability() {
        let views = sample_views();

        let available = apply_filter(views.clone(), Filter::Available);
        assert!(available.iter().all(|v| v.available_copies > 0));
        assert_eq!(available.len(), 2);

        let reserved = apply_filter(views.clone(), Filter::Reserved);
        assert!(reserved.iter().all(|v| v.available_copies == 0));
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].book.id, 2);

        let mine = apply_filter(views.clone(), Filter::Mine);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].book.id, 2);

        assert_eq!(apply_filter(views.clone(), Filter::All).len(), views.len());
    }

    #[test]
    fn unknown_filter_parses_as_all() {
        assert_eq!(Filter::parse("bogus"), Filter::All);
        assert_eq!(Filter::parse(""), Filter::All);
        assert_eq!(Filter::parse("AVAILABLE"), Filter::Available);
        assert_eq!(Filter::parse(" mine "), Filter::Mine);
    }
}
