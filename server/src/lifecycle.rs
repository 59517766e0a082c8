use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use log::{debug, Logger};

use crate::auth::{Role, Session};
use crate::db::Db;
use crate::donation::{Claimant, Donation, DonationInput, Status};
use crate::errors::BackendError;
use crate::notifications::{self, Notifier};

/// Enforces the donation state machine and its role gating. All transition
/// legality lives here; the repository's conditional writes only catch
/// races.
#[derive(Clone)]
pub struct Lifecycle {
    db: Arc<dyn Db + Send + Sync>,
    notifier: Notifier,
    logger: Arc<Logger>,
}

impl Lifecycle {
    pub fn new(db: Arc<dyn Db + Send + Sync>, notifier: Notifier, logger: Arc<Logger>) -> Self {
        Lifecycle {
            db,
            notifier,
            logger,
        }
    }

    /// Validates and persists a new donation, then queues the confirmation
    /// email. Only donors may post.
    pub async fn create(
        &self,
        session: &Session,
        input: DonationInput,
    ) -> Result<Donation, BackendError> {
        match session.role {
            Role::Donor => {}
            role => {
                return Err(BackendError::NotPermitted {
                    role,
                    action: "post donations",
                })
            }
        }

        let new = input.validate(session, OffsetDateTime::now_utc())?;

        debug!(self.logger, "Creating donation..."; "donor" => &session.uid);
        let donation = self.db.insert(new).await?;

        self.notifier.enqueue(notifications::donation_posted(&donation));

        Ok(donation)
    }

    /// Claims an available, unexpired donation for a non-donor actor. The
    /// write is conditional on the record still being available, so a raced
    /// claim surfaces as a conflict instead of overwriting the first one.
    pub async fn claim(&self, session: &Session, id: &Uuid) -> Result<Donation, BackendError> {
        match session.role {
            Role::Ngo | Role::Volunteer | Role::Admin => {}
            Role::Donor => {
                return Err(BackendError::NotPermitted {
                    role: Role::Donor,
                    action: "claim donations",
                })
            }
        }

        let donation = self.retrieve(id).await?;
        let now = OffsetDateTime::now_utc();

        match donation.status() {
            Status::Available if donation.is_expired(now) => {
                return Err(BackendError::Expired(*id))
            }
            Status::Available => {}
            from @ Status::Claimed | from @ Status::PickedUp | from @ Status::Completed => {
                return Err(BackendError::IllegalTransition {
                    from,
                    to: Status::Claimed,
                })
            }
        }

        debug!(self.logger, "Claiming donation..."; "id" => format!("{}", id), "claimant" => &session.uid);

        let claimant = Claimant::from_session(session, now);
        let updated = self
            .db
            .claim(id, claimant)
            .await?
            .ok_or(BackendError::StatusConflict {
                id: *id,
                expected: Status::Available,
            })?;

        if let Some(claimant) = updated.claimed_by() {
            self.notifier
                .enqueue(notifications::donation_claimed(&updated, claimant));
        }

        Ok(updated)
    }

    /// Confirms pickup of a claimed donation. Allowed for the donation's
    /// donor and for the claimant, whichever side hands the food over.
    pub async fn mark_picked_up(
        &self,
        session: &Session,
        id: &Uuid,
    ) -> Result<Donation, BackendError> {
        let donation = self.retrieve(id).await?;

        match donation.status() {
            Status::Claimed => {}
            from => {
                return Err(BackendError::IllegalTransition {
                    from,
                    to: Status::PickedUp,
                })
            }
        }

        let is_donor = donation.donor_id == session.uid;
        let is_claimant = donation
            .claimed_by()
            .map(|claimant| claimant.id == session.uid)
            .unwrap_or(false);

        if !is_donor && !is_claimant {
            return Err(BackendError::NotPermitted {
                role: session.role,
                action: "confirm this pickup",
            });
        }

        debug!(self.logger, "Marking donation picked up..."; "id" => format!("{}", id));
        self.transition(id, Status::Claimed, Status::PickedUp).await
    }

    /// Completes a picked-up donation. Donor only; terminal.
    pub async fn complete(&self, session: &Session, id: &Uuid) -> Result<Donation, BackendError> {
        let donation = self.retrieve(id).await?;

        match donation.status() {
            Status::PickedUp => {}
            from => {
                return Err(BackendError::IllegalTransition {
                    from,
                    to: Status::Completed,
                })
            }
        }

        if donation.donor_id != session.uid {
            return Err(BackendError::NotPermitted {
                role: session.role,
                action: "complete this donation",
            });
        }

        debug!(self.logger, "Completing donation..."; "id" => format!("{}", id));
        self.transition(id, Status::PickedUp, Status::Completed)
            .await
    }

    async fn retrieve(&self, id: &Uuid) -> Result<Donation, BackendError> {
        self.db
            .retrieve(id)
            .await?
            .ok_or(BackendError::NonExistentId(*id))
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: Status,
        to: Status,
    ) -> Result<Donation, BackendError> {
        self.db
            .transition(id, from, to)
            .await?
            .ok_or(BackendError::StatusConflict {
                id: *id,
                expected: from,
            })
    }
}
