use std::collections::HashMap;
use std::sync::RwLock;

use futures::future::BoxFuture;
use futures::FutureExt;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::Db;
use crate::donation::{Claimant, Donation, NewDonation, Status};
use crate::errors::BackendError;

/// An in-memory `Db` for tests, mirroring the conditional-write semantics of
/// the SQL implementation.
#[derive(Default)]
pub(crate) struct MockDb {
    pub(crate) donations: RwLock<HashMap<Uuid, Donation>>,
}

impl MockDb {
    pub(crate) fn new() -> Self {
        MockDb::default()
    }

    fn sorted(&self, keep: impl Fn(&Donation) -> bool) -> Vec<Donation> {
        let mut donations: Vec<Donation> = self
            .donations
            .read()
            .unwrap()
            .values()
            .filter(|d| keep(d))
            .cloned()
            .collect();

        donations.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        donations
    }
}

impl Db for MockDb {
    fn insert(&self, donation: NewDonation) -> BoxFuture<Result<Donation, BackendError>> {
        async move {
            let donation = Donation::from_new(Uuid::new_v4(), OffsetDateTime::now_utc(), donation);

            self.donations
                .write()
                .unwrap()
                .insert(*donation.id(), donation.clone());

            Ok(donation)
        }
        .boxed()
    }

    fn retrieve(&self, id: &Uuid) -> BoxFuture<Result<Option<Donation>, BackendError>> {
        let id = *id;

        async move { Ok(self.donations.read().unwrap().get(&id).cloned()) }.boxed()
    }

    fn list_available(&self) -> BoxFuture<Result<Vec<Donation>, BackendError>> {
        async move { Ok(self.sorted(|d| d.status() == Status::Available)) }.boxed()
    }

    fn list_by_donor(&self, donor_id: &str) -> BoxFuture<Result<Vec<Donation>, BackendError>> {
        let donor_id = donor_id.to_owned();

        async move { Ok(self.sorted(|d| d.donor_id == donor_id)) }.boxed()
    }

    fn list_all(&self) -> BoxFuture<Result<Vec<Donation>, BackendError>> {
        async move { Ok(self.sorted(|_| true)) }.boxed()
    }

    fn claim(
        &self,
        id: &Uuid,
        claimant: Claimant,
    ) -> BoxFuture<Result<Option<Donation>, BackendError>> {
        let id = *id;

        async move {
            let mut donations = self.donations.write().unwrap();

            let donation = match donations.get_mut(&id) {
                Some(donation) if donation.status() == Status::Available => donation,
                _ => return Ok(None),
            };

            donation.status = Status::Claimed;
            donation.claimed_by = Some(claimant);

            Ok(Some(donation.clone()))
        }
        .boxed()
    }

    fn transition(
        &self,
        id: &Uuid,
        from: Status,
        to: Status,
    ) -> BoxFuture<Result<Option<Donation>, BackendError>> {
        let id = *id;

        async move {
            let mut donations = self.donations.write().unwrap();

            let donation = match donations.get_mut(&id) {
                Some(donation) if donation.status() == from => donation,
                _ => return Ok(None),
            };

            donation.status = to;

            let now = OffsetDateTime::now_utc();
            match to {
                Status::PickedUp => donation.pickup_time = Some(now),
                Status::Completed => donation.completed_at = Some(now),
                Status::Available | Status::Claimed => {}
            }

            Ok(Some(donation.clone()))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::donation::testing::donation;

    fn seed(db: &MockDb, donation: Donation) -> Uuid {
        let id = *donation.id();
        db.donations.write().unwrap().insert(id, donation);
        id
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let db = MockDb::new();

        let older = donation("older", "first", "here");
        let mut newer = donation("newer", "second", "there");
        newer.created_at = older.created_at() + Duration::hours(2);

        seed(&db, older);
        seed(&db, newer);

        let listed = db.list_available().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].food_type, "newer");
        assert_eq!(listed[1].food_type, "older");
    }

    #[tokio::test]
    async fn a_second_claim_loses_the_conditional_write() {
        let db = MockDb::new();
        let id = seed(&db, donation("soup", "lentil", "kitchen"));

        let first = Claimant {
            id: "ngo-1".to_owned(),
            name: "Hope Kitchen".to_owned(),
            email: "hope@example.org".to_owned(),
            phone: None,
            organization_name: Some("Hope Kitchen".to_owned()),
            claimed_at: OffsetDateTime::now_utc(),
        };
        let second = Claimant {
            id: "ngo-2".to_owned(),
            ..first.clone()
        };

        assert!(db.claim(&id, first).await.unwrap().is_some());
        assert!(db.claim(&id, second).await.unwrap().is_none());

        let stored = db.retrieve(&id).await.unwrap().unwrap();
        assert_eq!(stored.claimed_by().unwrap().id, "ngo-1");
    }
}
