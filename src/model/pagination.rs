use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

/// `?page_num=&page_size=` query parameters, 1-based, defaulting to the
/// first page of 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_num: u64,
    page_size: u64,
}

impl Pagination {
    pub fn new(page_num: u64, page_size: u64) -> Result<Self, Error> {
        if page_num == 0 {
            return Err(Error::bad_request("page_num starts at 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::bad_request(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        // MongoDB takes the skip as a signed 64-bit count.
        let skip = (page_num - 1).checked_mul(page_size);
        if skip.map_or(true, |skip| skip > i64::MAX as u64) {
            return Err(Error::bad_request("page_num is too large"));
        }
        Ok(Self {
            page_num,
            page_size,
        })
    }

    /// Bounded by construction.
    pub fn skip(&self) -> u64 {
        (self.page_num - 1) * self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// Attach pagination details to one page of items.
    pub fn result<T>(self, items: Vec<T>, total: u64) -> Paginated<T> {
        Paginated {
            items,
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Pagination {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let page_num = match req.query_value::<u64>("page_num").unwrap_or(Ok(1)) {
            Ok(page_num) => page_num,
            Err(_) => {
                return request::Outcome::Error((
                    Status::BadRequest,
                    Error::bad_request("page_num must be a positive integer"),
                ))
            }
        };
        let page_size = match req
            .query_value::<u64>("page_size")
            .unwrap_or(Ok(DEFAULT_PAGE_SIZE))
        {
            Ok(page_size) => page_size,
            Err(_) => {
                return request::Outcome::Error((
                    Status::BadRequest,
                    Error::bad_request("page_size must be a positive integer"),
                ))
            }
        };
        match Pagination::new(page_num, page_size) {
            Ok(pagination) => request::Outcome::Success(pagination),
            Err(e) => request::Outcome::Error((Status::BadRequest, e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: u64,
    pub page_size: u64,
    pub total: u64,
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_counts_whole_pages() {
        assert_eq!(Pagination::default().skip(), 0);
        assert_eq!(Pagination::new(3, 20).unwrap().skip(), 40);
    }

    #[test]
    fn bounds() {
        assert!(Pagination::new(0, 10).is_err());
        assert!(Pagination::new(1, 0).is_err());
        assert!(Pagination::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert!(Pagination::new(1, MAX_PAGE_SIZE).is_ok());
    }

    #[test]
    fn huge_page_numbers_are_rejected() {
        assert!(Pagination::new(u64::MAX, MAX_PAGE_SIZE).is_err());
        assert!(Pagination::new(u64::MAX / 2, 3).is_err());

        let last = i64::MAX as u64 / MAX_PAGE_SIZE;
        let pagination = Pagination::new(last, MAX_PAGE_SIZE).unwrap();
        assert_eq!(pagination.skip(), (last - 1) * MAX_PAGE_SIZE);
    }
}
