//! Admin account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_no: Option<String>,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin profile with the OTP fields stripped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_no: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminProfile {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            phone_no: admin.phone_no,
            created_at: admin.created_at,
        }
    }
}

/// Query string for the admin user listings.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// Resolved paging window.
#[derive(Debug, Clone, PartialEq)]
pub struct Paging {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl UserListQuery {
    /// Apply defaults (page 1, limit 10) and clamp nonsense values.
    pub fn paging(&self) -> Paging {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = self.limit.filter(|l| *l >= 1).unwrap_or(10).min(100);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Paging {
            page,
            limit,
            search,
        }
    }
}

impl Paging {
    /// Row offset of the page, rejecting pages past the addressable range.
    pub fn offset(&self) -> Result<i64, AppError> {
        (self.page - 1)
            .checked_mul(self.limit)
            .ok_or_else(|| AppError::invalid("page is too large"))
    }

    /// `ILIKE` pattern matching the search term anywhere, with wildcards escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

/// Paginated listing returned by the admin user endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage<T> {
    pub users: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        let query = UserListQuery {
            page: None,
            limit: None,
            search: Some("   ".into()),
        };
        assert_eq!(
            query.paging(),
            Paging {
                page: 1,
                limit: 10,
                search: None
            }
        );

        let query = UserListQuery {
            page: Some(0),
            limit: Some(1000),
            search: None,
        };
        let paging = query.paging();
        assert_eq!(paging.page, 1);
        assert_eq!(paging.limit, 100);
    }

    #[test]
    fn huge_page_is_rejected_not_overflowed() {
        let paging = UserListQuery {
            page: Some(i64::MAX),
            limit: Some(10),
            search: None,
        }
        .paging();

        assert!(matches!(paging.offset(), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn offset_and_total_pages() {
        let paging = UserListQuery {
            page: Some(3),
            limit: Some(10),
            search: None,
        }
        .paging();

        assert_eq!(paging.offset().unwrap(), 20);
        assert_eq!(paging.total_pages(0), 0);
        assert_eq!(paging.total_pages(10), 1);
        assert_eq!(paging.total_pages(21), 3);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let paging = UserListQuery {
            page: None,
            limit: None,
            search: Some(" 50%_off ".into()),
        }
        .paging();

        assert_eq!(paging.like_pattern().as_deref(), Some("%50\\%\\_off%"));
    }
}
