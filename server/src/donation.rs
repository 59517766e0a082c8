use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::ValidationError;
use crate::normalization;

/// The kind of food offered.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CookedFood,
    RawIngredients,
    PackagedFood,
    Beverages,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::CookedFood => "cooked-food",
            Category::RawIngredients => "raw-ingredients",
            Category::PackagedFood => "packaged-food",
            Category::Beverages => "beverages",
            Category::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cooked-food" => Some(Category::CookedFood),
            "raw-ingredients" => Some(Category::RawIngredients),
            "packaged-food" => Some(Category::PackagedFood),
            "beverages" => Some(Category::Beverages),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit the quantity is measured in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    Kg,
    Portions,
    Items,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Portions => "portions",
            Unit::Items => "items",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "kg" => Some(Unit::Kg),
            "portions" => Some(Unit::Portions),
            "items" => Some(Unit::Items),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted stage of a donation's lifecycle.
///
/// "Expired" is deliberately absent: it is a display condition derived from
/// the deadline, never a stored status. See [`Donation::is_expired`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Available,
    Claimed,
    PickedUp,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Available => "available",
            Status::Claimed => "claimed",
            Status::PickedUp => "picked-up",
            Status::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Status::Available),
            "claimed" => Some(Status::Claimed),
            "picked-up" => Some(Status::PickedUp),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the food can be picked up.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Location {
    pub(crate) address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) coordinates: Option<Coordinates>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coordinates {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
}

/// A point-in-time copy of the claiming actor, embedded in the donation.
/// Later profile edits do not change it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claimant {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) organization_name: Option<String>,

    /// When the claim happened. The store stamps the authoritative time.
    #[serde(with = "time::serde::timestamp")]
    pub(crate) claimed_at: OffsetDateTime,
}

impl Claimant {
    pub fn from_session(session: &Session, claimed_at: OffsetDateTime) -> Self {
        Claimant {
            id: session.uid.clone(),
            name: session.name.clone(),
            email: session.email.clone(),
            phone: session.phone.clone(),
            organization_name: session.organization.clone(),
            claimed_at,
        }
    }
}

/// A single donation in the database.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    /// The ID of the donation.
    pub(crate) id: Uuid,

    /// The donor snapshot, captured at creation time.
    pub(crate) donor_id: String,
    pub(crate) donor_name: String,
    pub(crate) donor_email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) donor_phone: Option<String>,

    /// The food on offer.
    pub(crate) food_type: String,
    pub(crate) category: Category,
    pub(crate) quantity: f64,
    pub(crate) unit: Unit,
    pub(crate) description: String,
    pub(crate) location: Location,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) serving_size: Option<i32>,

    pub(crate) allergens: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) special_instructions: Option<String>,

    /// The donor-supplied pickup deadline.
    #[serde(with = "time::serde::timestamp")]
    pub(crate) available_until: OffsetDateTime,

    /// The server-assigned creation time.
    #[serde(with = "time::serde::timestamp")]
    pub(crate) created_at: OffsetDateTime,

    pub(crate) status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) claimed_by: Option<Claimant>,

    #[serde(with = "timestamp_option", skip_serializing_if = "Option::is_none")]
    pub(crate) pickup_time: Option<OffsetDateTime>,

    #[serde(with = "timestamp_option", skip_serializing_if = "Option::is_none")]
    pub(crate) completed_at: Option<OffsetDateTime>,
}

impl Donation {
    /// Builds the stored record for a freshly validated donation.
    pub(crate) fn from_new(id: Uuid, created_at: OffsetDateTime, new: NewDonation) -> Self {
        let NewDonation {
            donor_id,
            donor_name,
            donor_email,
            donor_phone,
            food_type,
            category,
            quantity,
            unit,
            description,
            location,
            serving_size,
            allergens,
            special_instructions,
            available_until,
        } = new;

        Donation {
            id,
            donor_id,
            donor_name,
            donor_email,
            donor_phone,
            food_type,
            category,
            quantity,
            unit,
            description,
            location,
            serving_size,
            allergens,
            special_instructions,
            available_until,
            created_at,
            status: Status::Available,
            claimed_by: None,
            pickup_time: None,
            completed_at: None,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn serving_size(&self) -> Option<i32> {
        self.serving_size
    }

    pub fn claimed_by(&self) -> Option<&Claimant> {
        self.claimed_by.as_ref()
    }

    /// Whether the deadline has passed while the donation is still nominally
    /// available. Derived, never persisted.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.available_until && self.status == Status::Available
    }
}

/// A validated donation ready to be persisted. The donor snapshot comes from
/// the submitting session, the timestamps from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDonation {
    pub(crate) donor_id: String,
    pub(crate) donor_name: String,
    pub(crate) donor_email: String,
    pub(crate) donor_phone: Option<String>,
    pub(crate) food_type: String,
    pub(crate) category: Category,
    pub(crate) quantity: f64,
    pub(crate) unit: Unit,
    pub(crate) description: String,
    pub(crate) location: Location,
    pub(crate) serving_size: Option<i32>,
    pub(crate) allergens: Vec<String>,
    pub(crate) special_instructions: Option<String>,
    pub(crate) available_until: OffsetDateTime,
}

/// The user-submitted form for a new donation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationInput {
    #[serde(deserialize_with = "normalization::deserialize")]
    pub(crate) food_type: String,

    pub(crate) category: Category,

    pub(crate) quantity: f64,

    pub(crate) unit: Unit,

    #[serde(deserialize_with = "normalization::deserialize")]
    pub(crate) description: String,

    pub(crate) location: Location,

    #[serde(default)]
    pub(crate) serving_size: Option<i32>,

    /// Comma-separated free text, split into a list during validation.
    #[serde(default)]
    pub(crate) allergens: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) special_instructions: Option<String>,

    #[serde(with = "time::serde::timestamp")]
    pub(crate) available_until: OffsetDateTime,
}

impl DonationInput {
    /// Applies the creation-time rules and attaches the donor snapshot.
    /// Optional fields are normalized but never block submission.
    pub fn validate(
        self,
        donor: &Session,
        now: OffsetDateTime,
    ) -> Result<NewDonation, ValidationError> {
        let DonationInput {
            food_type,
            category,
            quantity,
            unit,
            description,
            location,
            serving_size,
            allergens,
            special_instructions,
            available_until,
        } = self;

        if food_type.is_empty() {
            return Err(ValidationError::MissingField("foodType"));
        }

        if description.is_empty() {
            return Err(ValidationError::MissingField("description"));
        }

        let address = normalization::normalize_text(&location.address);
        if address.is_empty() {
            return Err(ValidationError::MissingField("location.address"));
        }

        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }

        if available_until <= now {
            return Err(ValidationError::DeadlineNotInFuture);
        }

        let allergens = allergens
            .as_deref()
            .map(parse_allergens)
            .unwrap_or_default();

        Ok(NewDonation {
            donor_id: donor.uid.clone(),
            donor_name: donor.name.clone(),
            donor_email: donor.email.clone(),
            donor_phone: donor.phone.clone(),
            food_type,
            category,
            quantity,
            unit,
            description,
            location: Location {
                address,
                coordinates: location.coordinates,
            },
            serving_size,
            allergens,
            special_instructions: special_instructions.filter(|s| !s.is_empty()),
            available_until,
        })
    }
}

fn parse_allergens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalization::normalize_text)
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub(crate) mod timestamp_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(option: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        option
            .as_ref()
            .map(|timestamp| timestamp.unix_timestamp())
            .serialize(serializer)
    }

    #[allow(dead_code)]
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where D: Deserializer<'de> {
        let option: Option<i64> = Deserialize::deserialize(deserializer)?;
        Ok(option.map(OffsetDateTime::from_unix_timestamp))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use time::Duration;

    use super::*;

    /// A baseline available donation for tests; override fields as needed.
    pub(crate) fn donation(food_type: &str, description: &str, address: &str) -> Donation {
        let created_at = OffsetDateTime::from_unix_timestamp(1_700_000_000);

        Donation {
            id: Uuid::new_v4(),
            donor_id: "donor-1".to_owned(),
            donor_name: "Asha".to_owned(),
            donor_email: "asha@example.org".to_owned(),
            donor_phone: None,
            food_type: food_type.to_owned(),
            category: Category::CookedFood,
            quantity: 5.0,
            unit: Unit::Kg,
            description: description.to_owned(),
            location: Location {
                address: address.to_owned(),
                coordinates: None,
            },
            serving_size: None,
            allergens: vec![],
            special_instructions: None,
            available_until: created_at + Duration::hours(24),
            created_at,
            status: Status::Available,
            claimed_by: None,
            pickup_time: None,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::auth::Role;

    fn donor() -> Session {
        Session {
            uid: "donor-1".to_owned(),
            name: "Asha".to_owned(),
            email: "asha@example.org".to_owned(),
            phone: Some("555-0101".to_owned()),
            organization: None,
            role: Role::Donor,
        }
    }

    fn input(now: OffsetDateTime) -> DonationInput {
        DonationInput {
            food_type: "Vegetable biryani".to_owned(),
            category: Category::CookedFood,
            quantity: 5.0,
            unit: Unit::Kg,
            description: "Freshly cooked, mildly spiced".to_owned(),
            location: Location {
                address: "12 Lake Road".to_owned(),
                coordinates: None,
            },
            serving_size: Some(10),
            allergens: Some("nuts, dairy, , ".to_owned()),
            special_instructions: None,
            available_until: now + Duration::hours(24),
        }
    }

    #[test]
    fn validation_captures_the_donor_snapshot() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000);
        let new = input(now).validate(&donor(), now).unwrap();

        assert_eq!(new.donor_id, "donor-1");
        assert_eq!(new.donor_name, "Asha");
        assert_eq!(new.donor_email, "asha@example.org");
        assert_eq!(new.donor_phone.as_deref(), Some("555-0101"));
    }

    #[test]
    fn validation_splits_allergens() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000);
        let new = input(now).validate(&donor(), now).unwrap();

        assert_eq!(new.allergens, vec!["nuts".to_owned(), "dairy".to_owned()]);
    }

    #[test]
    fn validation_rejects_empty_required_fields() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000);

        let mut missing_food = input(now);
        missing_food.food_type = String::new();
        assert_eq!(
            missing_food.validate(&donor(), now),
            Err(ValidationError::MissingField("foodType"))
        );

        let mut missing_description = input(now);
        missing_description.description = String::new();
        assert_eq!(
            missing_description.validate(&donor(), now),
            Err(ValidationError::MissingField("description"))
        );

        let mut missing_address = input(now);
        missing_address.location.address = "   ".to_owned();
        assert_eq!(
            missing_address.validate(&donor(), now),
            Err(ValidationError::MissingField("location.address"))
        );
    }

    #[test]
    fn validation_rejects_non_positive_quantities() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000);

        for quantity in &[0.0, -3.0, f64::NAN] {
            let mut bad = input(now);
            bad.quantity = *quantity;
            assert!(matches!(
                bad.validate(&donor(), now),
                Err(ValidationError::NonPositiveQuantity(_))
            ));
        }
    }

    #[test]
    fn validation_rejects_past_deadlines() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000);

        let mut stale = input(now);
        stale.available_until = now - Duration::hours(1);
        assert_eq!(
            stale.validate(&donor(), now),
            Err(ValidationError::DeadlineNotInFuture)
        );

        // The boundary is strict: a deadline equal to "now" is rejected too.
        let mut boundary = input(now);
        boundary.available_until = now;
        assert_eq!(
            boundary.validate(&donor(), now),
            Err(ValidationError::DeadlineNotInFuture)
        );
    }

    #[test]
    fn expiry_is_derived_from_the_deadline_and_status() {
        let donation = testing::donation("soup", "lentil soup", "12 Lake Road");
        let before = donation.available_until - Duration::hours(1);
        let after = donation.available_until + Duration::hours(1);

        assert!(!donation.is_expired(before));
        assert!(donation.is_expired(after));

        let mut claimed = testing::donation("soup", "lentil soup", "12 Lake Road");
        claimed.status = Status::Claimed;
        assert!(!claimed.is_expired(after));
    }

    #[test]
    fn statuses_round_trip_through_their_labels() {
        for status in &[
            Status::Available,
            Status::Claimed,
            Status::PickedUp,
            Status::Completed,
        ] {
            assert_eq!(Status::parse(status.as_str()), Some(*status));
        }

        assert_eq!(Status::parse("expired"), None);
    }
}
