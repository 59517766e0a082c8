use serde::Deserialize;

use crate::auth::Session;
use crate::donation::DonationInput;
use crate::errors::BackendError;
use crate::filter::{CategoryFilter, Filters, StatusFilter};

/// The query string accepted by the listing routes. Absent parameters mean
/// "no restriction"; unrecognized values are rejected rather than ignored.
#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub q: Option<String>,

    pub category: Option<String>,

    pub status: Option<String>,

    /// When set, list every donation instead of only the available ones.
    #[serde(default)]
    pub all: bool,
}

impl FilterQuery {
    pub fn into_filters(self) -> Result<Filters, BackendError> {
        let category = match self.category {
            None => CategoryFilter::default(),
            Some(value) => {
                CategoryFilter::parse(&value).ok_or(BackendError::InvalidFilter {
                    field: "category",
                    value,
                })?
            }
        };

        let status = match self.status {
            None => StatusFilter::default(),
            Some(value) => StatusFilter::parse(&value).ok_or(BackendError::InvalidFilter {
                field: "status",
                value,
            })?,
        };

        Ok(Filters {
            search: self.q,
            category,
            status,
        })
    }
}

/// The body of a donation submission: the acting session plus the form.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub actor: Session,
    pub donation: DonationInput,
}

/// The body of a lifecycle action on an existing donation.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub actor: Session,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donation::{Category, Status};

    fn query(category: Option<&str>, status: Option<&str>) -> FilterQuery {
        FilterQuery {
            q: None,
            category: category.map(str::to_owned),
            status: status.map(str::to_owned),
            all: false,
        }
    }

    #[test]
    fn absent_parameters_mean_no_restriction() {
        let filters = query(None, None).into_filters().unwrap();

        assert_eq!(filters.category, CategoryFilter::All);
        assert_eq!(filters.status, StatusFilter::All);
    }

    #[test]
    fn known_values_parse() {
        let filters = query(Some("cooked-food"), Some("claimed"))
            .into_filters()
            .unwrap();

        assert_eq!(filters.category, CategoryFilter::Only(Category::CookedFood));
        assert_eq!(filters.status, StatusFilter::Only(Status::Claimed));

        let filters = query(Some("all"), Some("expired")).into_filters().unwrap();
        assert_eq!(filters.category, CategoryFilter::All);
        assert_eq!(filters.status, StatusFilter::Expired);
    }

    #[test]
    fn unrecognized_values_are_rejected() {
        assert!(matches!(
            query(Some("sweets"), None).into_filters(),
            Err(BackendError::InvalidFilter {
                field: "category",
                ..
            })
        ));

        assert!(matches!(
            query(None, Some("pending")).into_filters(),
            Err(BackendError::InvalidFilter { field: "status", .. })
        ));
    }
}
