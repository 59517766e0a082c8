use time::OffsetDateTime;

use crate::donation::{Category, Donation, Status};

/// A conjunction of narrowing criteria over an already-fetched donation
/// list. Pure and synchronous; never reorders its input.
#[derive(Clone, Debug, Default)]
pub struct Filters {
    /// Case-insensitive substring matched against the food type, the
    /// description, and the pickup address. Empty means "no search".
    pub search: Option<String>,

    pub category: CategoryFilter,

    pub status: StatusFilter,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(CategoryFilter::All),
            other => Category::parse(other).map(CategoryFilter::Only),
        }
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        CategoryFilter::All
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusFilter {
    All,

    /// The derived display state: available but past its deadline.
    Expired,

    Only(Status),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(StatusFilter::All),
            "expired" => Some(StatusFilter::Expired),
            other => Status::parse(other).map(StatusFilter::Only),
        }
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::All
    }
}

impl Filters {
    /// Keeps the donations matching every criterion, preserving their
    /// relative order.
    pub fn apply(&self, donations: Vec<Donation>, now: OffsetDateTime) -> Vec<Donation> {
        let needle = self
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty());

        donations
            .into_iter()
            .filter(|donation| self.matches(donation, needle.as_deref(), now))
            .collect()
    }

    fn matches(&self, donation: &Donation, needle: Option<&str>, now: OffsetDateTime) -> bool {
        if let Some(needle) = needle {
            let found = contains(&donation.food_type, needle)
                || contains(&donation.description, needle)
                || contains(&donation.location.address, needle);

            if !found {
                return false;
            }
        }

        match self.category {
            CategoryFilter::All => {}
            CategoryFilter::Only(category) => {
                if donation.category != category {
                    return false;
                }
            }
        }

        match self.status {
            StatusFilter::All => true,
            StatusFilter::Expired => donation.is_expired(now),
            StatusFilter::Only(status) => donation.status == status,
        }
    }
}

fn contains(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}
