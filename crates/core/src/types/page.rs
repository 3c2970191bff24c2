use serde::Serialize;

use crate::error::CoreError;
use crate::types::cursor::Cursor;
use crate::types::sort::SortOrder;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub first: u32,
    pub after: Option<Cursor>,
    pub sort: SortOrder,
}

impl PageRequest {
    pub fn new(first: Option<u32>, cursor: Option<&str>, sort: Option<SortOrder>) -> Result<Self, CoreError> {
        Ok(PageRequest {
            first: first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            after: Cursor::parse_optional(cursor)?,
            sort: sort.unwrap_or_default(),
        })
    }

    pub fn first(first: u32, sort: SortOrder) -> Self {
        PageRequest {
            first: first.clamp(1, MAX_PAGE_SIZE),
            after: None,
            sort,
        }
    }

    pub fn after(&self, cursor: Cursor) -> Self {
        PageRequest {
            after: Some(cursor),
            ..self.clone()
        }
    }

    /// Rows to fetch: one extra tells us whether another page exists.
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.first) + 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::first(DEFAULT_PAGE_SIZE, SortOrder::default())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from up to `request.fetch_limit()` rows already in walk
    /// order.
    pub fn from_fetch<F>(mut rows: Vec<T>, total_count: i64, request: &PageRequest, key: F) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        let has_next_page = rows.len() > request.first as usize;
        rows.truncate(request.first as usize);
        let start_cursor = rows.first().map(|row| key(row).encode());
        let end_cursor = rows.last().map(|row| key(row).encode());
        Page {
            items: rows,
            total_count,
            has_next_page,
            has_prev_page: request.after.is_some(),
            start_cursor,
            end_cursor,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
            start_cursor: self.start_cursor,
            end_cursor: self.end_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn key(n: &i64) -> Cursor {
        Cursor::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(*n),
            Uuid::from_u128(*n as u128),
        )
    }

    #[test]
    fn new_applies_defaults_and_bounds() {
        let request = PageRequest::new(None, None, None).unwrap();
        assert_eq!(request.first, DEFAULT_PAGE_SIZE);
        assert_eq!(request.sort, SortOrder::Desc);
        assert_eq!(PageRequest::new(Some(0), None, None).unwrap().first, 1);
        assert_eq!(PageRequest::new(Some(500), None, None).unwrap().first, MAX_PAGE_SIZE);
    }

    #[test]
    fn new_rejects_bad_cursor() {
        assert!(PageRequest::new(None, Some("%%%"), None).is_err());
    }

    #[test]
    fn from_fetch_detects_next_page() {
        let request = PageRequest::first(2, SortOrder::Asc);
        let page = Page::from_fetch(vec![1, 2, 3], 3, &request, key);
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);
        assert_eq!(page.end_cursor, Some(key(&2).encode()));
        assert_eq!(page.start_cursor, Some(key(&1).encode()));
    }

    #[test]
    fn from_fetch_last_page() {
        let request = PageRequest::first(2, SortOrder::Asc).after(key(&2));
        let page = Page::from_fetch(vec![3], 3, &request, key);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
        assert_eq!(page.end_cursor, Some(key(&3).encode()));
    }

    #[test]
    fn empty_page_has_no_cursors() {
        let page = Page::from_fetch(Vec::<i64>::new(), 0, &PageRequest::default(), key);
        assert!(page.items.is_empty());
        assert_eq!(page.end_cursor, None);
    }
}
