use futures::future::BoxFuture;
use uuid::Uuid;

use crate::donation::{Claimant, Donation, NewDonation, Status};
use crate::errors::BackendError;

pub trait Db {
    /// Persists a new record with a server-assigned creation timestamp and
    /// initial status `available`.
    fn insert(&self, donation: NewDonation) -> BoxFuture<Result<Donation, BackendError>>;

    fn retrieve(&self, id: &Uuid) -> BoxFuture<Result<Option<Donation>, BackendError>>;

    /// All `available` donations, newest first. An empty set is not an error.
    fn list_available(&self) -> BoxFuture<Result<Vec<Donation>, BackendError>>;

    /// A donor's donations regardless of status, newest first.
    fn list_by_donor(&self, donor_id: &str) -> BoxFuture<Result<Vec<Donation>, BackendError>>;

    /// The full donation set, for the statistics reduction.
    fn list_all(&self) -> BoxFuture<Result<Vec<Donation>, BackendError>>;

    /// Writes the claimant snapshot, the claim timestamp, and
    /// status=`claimed` in a single conditional update gated on the record
    /// still being `available`. `None` means the precondition failed.
    fn claim(
        &self,
        id: &Uuid,
        claimant: Claimant,
    ) -> BoxFuture<Result<Option<Donation>, BackendError>>;

    /// Conditionally advances the status, gated on the expected current
    /// status, stamping pickup/completion timestamps on the corresponding
    /// transitions. `None` means the precondition failed.
    fn transition(
        &self,
        id: &Uuid,
        from: Status,
        to: Status,
    ) -> BoxFuture<Result<Option<Donation>, BackendError>>;
}

#[cfg(test)]
pub(crate) mod mock;

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
    };
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::donation::{
        Category, Claimant, Coordinates, Donation, Location, NewDonation, Status, Unit,
    };
    use crate::errors::BackendError;

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn insert(&self, donation: NewDonation) -> BoxFuture<Result<Donation, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/create.sql"));

                let (id, created_at): (Uuid, OffsetDateTime) = query
                    .bind(&donation.donor_id)
                    .bind(&donation.donor_name)
                    .bind(&donation.donor_email)
                    .bind(&donation.donor_phone)
                    .bind(&donation.food_type)
                    .bind(donation.category.as_str())
                    .bind(donation.quantity)
                    .bind(donation.unit.as_str())
                    .bind(&donation.description)
                    .bind(&donation.location.address)
                    .bind(donation.location.coordinates.map(|c| c.lat))
                    .bind(donation.location.coordinates.map(|c| c.lng))
                    .bind(donation.serving_size)
                    .bind(&donation.allergens)
                    .bind(&donation.special_instructions)
                    .bind(donation.available_until)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(Donation::from_new(id, created_at, donation))
            }
            .boxed()
        }

        fn retrieve(&self, id: &Uuid) -> BoxFuture<Result<Option<Donation>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve.sql"));

                let donation: Option<Donation> = query
                    .bind(id)
                    .try_map(|row: PgRow| donation_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(donation)
            }
            .boxed()
        }

        fn list_available(&self) -> BoxFuture<Result<Vec<Donation>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_available.sql"));

                let donations = query
                    .try_map(|row: PgRow| donation_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(donations)
            }
            .boxed()
        }

        fn list_by_donor(&self, donor_id: &str) -> BoxFuture<Result<Vec<Donation>, BackendError>> {
            let donor_id = donor_id.to_owned();

            async move {
                let query = sqlx::query(include_str!("queries/list_by_donor.sql"));

                let donations = query
                    .bind(donor_id)
                    .try_map(|row: PgRow| donation_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(donations)
            }
            .boxed()
        }

        fn list_all(&self) -> BoxFuture<Result<Vec<Donation>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_all.sql"));

                let donations = query
                    .try_map(|row: PgRow| donation_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(donations)
            }
            .boxed()
        }

        fn claim(
            &self,
            id: &Uuid,
            claimant: Claimant,
        ) -> BoxFuture<Result<Option<Donation>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/claim.sql"));

                let donation: Option<Donation> = query
                    .bind(id)
                    .bind(&claimant.id)
                    .bind(&claimant.name)
                    .bind(&claimant.email)
                    .bind(&claimant.phone)
                    .bind(&claimant.organization_name)
                    .try_map(|row: PgRow| donation_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(donation)
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
                let query = sqlx::query(include_str!("queries/transition.sql"));

                let donation: Option<Donation> = query
                    .bind(id)
                    .bind(from.as_str())
                    .bind(to.as_str())
                    .try_map(|row: PgRow| donation_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(donation)
            }
            .boxed()
        }
    }

    fn donation_from_row(row: &PgRow) -> Result<Donation, sqlx::Error> {
        let id: Uuid = try_get(row, "id")?;

        let category: String = try_get(row, "category")?;
        let category = Category::parse(&category)
            .ok_or_else(|| decode_error("category", category))?;

        let unit: String = try_get(row, "unit")?;
        let unit = Unit::parse(&unit).ok_or_else(|| decode_error("unit", unit))?;

        let status: String = try_get(row, "status")?;
        let status = Status::parse(&status).ok_or_else(|| decode_error("status", status))?;

        let latitude: Option<f64> = try_get(row, "latitude")?;
        let longitude: Option<f64> = try_get(row, "longitude")?;
        let coordinates = match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };

        let claimed_at: Option<OffsetDateTime> = try_get(row, "claimed_at")?;
        let claimed_by = match claimed_at {
            Some(claimed_at) => Some(Claimant {
                id: try_get(row, "claimant_id")?,
                name: try_get(row, "claimant_name")?,
                email: try_get(row, "claimant_email")?,
                phone: try_get(row, "claimant_phone")?,
                organization_name: try_get(row, "claimant_organization")?,
                claimed_at,
            }),
            None => None,
        };

        Ok(Donation {
            id,
            donor_id: try_get(row, "donor_id")?,
            donor_name: try_get(row, "donor_name")?,
            donor_email: try_get(row, "donor_email")?,
            donor_phone: try_get(row, "donor_phone")?,
            food_type: try_get(row, "food_type")?,
            category,
            quantity: try_get(row, "quantity")?,
            unit,
            description: try_get(row, "description")?,
            location: Location {
                address: try_get(row, "address")?,
                coordinates,
            },
            serving_size: try_get(row, "serving_size")?,
            allergens: try_get(row, "allergens")?,
            special_instructions: try_get(row, "special_instructions")?,
            available_until: try_get(row, "available_until")?,
            created_at: try_get(row, "created_at")?,
            status,
            claimed_by,
            pickup_time: try_get(row, "pickup_at")?,
            completed_at: try_get(row, "completed_at")?,
        })
    }

    fn decode_error(column: &'static str, value: String) -> sqlx::Error {
        sqlx::Error::Decode(Box::new(BackendError::UnrecognizedValue { column, value }))
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(source: sqlx::Error) -> BackendError {
        BackendError::Sqlx { source }
    }
}
