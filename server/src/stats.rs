use serde::Serialize;
use time::OffsetDateTime;

use crate::donation::{Donation, Status, Unit};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Aggregate figures over the full donation set. Derived on demand, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    pub total_donations: u64,
    pub total_kg_saved: f64,
    pub total_people_fed: f64,
    pub active_donations: u64,
    pub completed_donations: u64,
    pub monthly_stats: Vec<MonthlyStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub month: String,
    pub donations: u64,
    pub kg_saved: f64,
    pub people_fed: f64,
}

/// Reduces the donation set to its aggregate statistics, including a
/// trailing `months`-month trend bucketed by creation time, oldest first.
/// Deterministic: the same input always yields the same output.
pub fn compute(donations: &[Donation], now: OffsetDateTime, months: u8) -> DonationStats {
    let total_donations = donations.len() as u64;
    let total_kg_saved = donations.iter().map(kg_saved).sum();
    let total_people_fed = donations.iter().map(people_fed).sum();

    let active_donations = donations
        .iter()
        .filter(|d| match d.status() {
            Status::Available | Status::Claimed => true,
            Status::PickedUp | Status::Completed => false,
        })
        .count() as u64;

    let completed_donations = donations
        .iter()
        .filter(|d| d.status() == Status::Completed)
        .count() as u64;

    let monthly_stats = (0..u32::from(months))
        .rev()
        .map(|back| {
            let (year, month) = month_back(now.year(), now.month(), back);

            let in_bucket = donations.iter().filter(|d| {
                let created = d.created_at();
                created.year() == year && created.month() == month
            });

            let mut bucket = MonthlyStats {
                month: MONTH_NAMES[usize::from(month - 1)].to_owned(),
                donations: 0,
                kg_saved: 0.0,
                people_fed: 0.0,
            };

            for donation in in_bucket {
                bucket.donations += 1;
                bucket.kg_saved += kg_saved(donation);
                bucket.people_fed += people_fed(donation);
            }

            bucket
        })
        .collect();

    DonationStats {
        total_donations,
        total_kg_saved,
        total_people_fed,
        active_donations,
        completed_donations,
        monthly_stats,
    }
}

/// Quantity normalized to kilograms: portion and item counts are assumed to
/// average half a kilogram each.
fn kg_saved(donation: &Donation) -> f64 {
    match donation.unit() {
        Unit::Kg => donation.quantity(),
        Unit::Portions | Unit::Items => donation.quantity() * 0.5,
    }
}

/// People-fed estimate: the declared serving size, falling back to the raw
/// quantity.
fn people_fed(donation: &Donation) -> f64 {
    donation
        .serving_size()
        .map(f64::from)
        .unwrap_or_else(|| donation.quantity())
}

/// The (year, month) pair `back` months before the given one.
fn month_back(year: i32, month: u8, back: u32) -> (i32, u8) {
    let total = year * 12 + i32::from(month) - 1 - back as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u8)
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::donation::testing::donation;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000) + Duration::hours(1)
    }

    #[test]
    fn an_empty_set_yields_zeroes() {
        let stats = compute(&[], now(), 6);

        assert_eq!(stats.total_donations, 0);
        assert_eq!(stats.total_kg_saved, 0.0);
        assert_eq!(stats.total_people_fed, 0.0);
        assert_eq!(stats.active_donations, 0);
        assert_eq!(stats.completed_donations, 0);
        assert_eq!(stats.monthly_stats.len(), 6);
        assert!(stats
            .monthly_stats
            .iter()
            .all(|bucket| bucket.donations == 0 && bucket.kg_saved == 0.0));
    }

    #[test]
    fn weight_is_normalized_to_kilograms() {
        let kg = donation("rice", "bags", "depot");

        let mut portions = donation("soup", "cups", "kitchen");
        portions.unit = Unit::Portions;
        portions.quantity = 8.0;

        let stats = compute(&[kg, portions], now(), 1);

        // 5 kg as-is plus 8 portions at half a kilogram each.
        assert_eq!(stats.total_kg_saved, 5.0 + 4.0);
    }

    #[test]
    fn people_fed_prefers_the_serving_size() {
        let mut sized = donation("stew", "pot", "kitchen");
        sized.serving_size = Some(12);

        let unsized_donation = donation("bread", "loaves", "bakery");

        let stats = compute(&[sized, unsized_donation], now(), 1);

        assert_eq!(stats.total_people_fed, 12.0 + 5.0);
    }

    #[test]
    fn active_and_completed_counts_follow_status() {
        let available = donation("a", "a", "a");

        let mut claimed = donation("b", "b", "b");
        claimed.status = Status::Claimed;

        let mut picked_up = donation("c", "c", "c");
        picked_up.status = Status::PickedUp;

        let mut completed = donation("d", "d", "d");
        completed.status = Status::Completed;

        let stats = compute(&[available, claimed, picked_up, completed], now(), 1);

        assert_eq!(stats.total_donations, 4);
        assert_eq!(stats.active_donations, 2);
        assert_eq!(stats.completed_donations, 1);
    }

    #[test]
    fn the_monthly_trend_buckets_by_creation_time() {
        let recent = donation("fresh", "fresh", "here");

        let mut old = donation("old", "old", "there");
        old.created_at = recent.created_at - Duration::days(65);

        let now = recent.created_at + Duration::hours(1);
        let stats = compute(&[recent.clone(), old], now, 4);

        assert_eq!(stats.monthly_stats.len(), 4);

        let counts: Vec<u64> = stats
            .monthly_stats
            .iter()
            .map(|bucket| bucket.donations)
            .collect();

        // Oldest bucket first; 65 days back lands two buckets before the
        // current month.
        assert_eq!(counts, vec![0, 1, 0, 1]);
    }

    #[test]
    fn the_trend_is_deterministic() {
        let donations = vec![
            donation("a", "a", "a"),
            donation("b", "b", "b"),
        ];

        assert_eq!(
            compute(&donations, now(), 6),
            compute(&donations, now(), 6)
        );
    }

    #[test]
    fn month_arithmetic_wraps_across_years() {
        assert_eq!(month_back(2026, 8, 0), (2026, 8));
        assert_eq!(month_back(2026, 2, 3), (2025, 11));
        assert_eq!(month_back(2026, 1, 13), (2024, 12));
    }
}
