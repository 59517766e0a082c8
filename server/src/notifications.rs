use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tokio::sync::mpsc;
use url::Url;

use log::{error, trace, Logger};

use crate::donation::{Claimant, Donation};
use crate::errors::NotificationError;

/// A single transactional message.
#[derive(Clone, Debug, PartialEq)]
pub struct Email {
    pub to_email: String,
    pub to_name: String,
    pub message: String,
}

pub trait Mailer: Send + Sync {
    /// Delivers the message. The caller decides what to do with failures;
    /// within this crate they are always logged and dropped.
    fn send(&self, email: Email) -> BoxFuture<Result<(), NotificationError>>;
}

/// The confirmation sent to the donor when a donation is posted.
pub fn donation_posted(donation: &Donation) -> Email {
    Email {
        to_email: donation.donor_email.clone(),
        to_name: donation.donor_name.clone(),
        message: format!(
            "Your food donation \"{}\" has been successfully posted and is now available for pickup by NGOs and volunteers.",
            donation.food_type
        ),
    }
}

/// The coordination message sent to the claimant after a claim.
pub fn donation_claimed(donation: &Donation, claimant: &Claimant) -> Email {
    Email {
        to_email: claimant.email.clone(),
        to_name: claimant.name.clone(),
        message: format!(
            "You have claimed the donation \"{}\" from {}. Please coordinate the pickup at {}.",
            donation.food_type, donation.donor_name, donation.location.address
        ),
    }
}

/// The write-side handle of the outbound queue. Lifecycle operations enqueue
/// here and move on; delivery happens elsewhere, so a slow or failing email
/// service cannot affect a committed donation.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Email>,
    logger: Arc<Logger>,
}

impl Notifier {
    pub fn new(logger: Arc<Logger>) -> (Self, mpsc::UnboundedReceiver<Email>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (Notifier { sender, logger }, receiver)
    }

    pub fn enqueue(&self, email: Email) {
        if self.sender.send(email).is_err() {
            error!(self.logger, "Notification outbox is closed; dropping email");
        }
    }
}

/// Drains the outbound queue until it closes, logging and absorbing every
/// delivery failure.
pub async fn deliver_all(
    logger: Arc<Logger>,
    mailer: Arc<dyn Mailer>,
    mut outbox: mpsc::UnboundedReceiver<Email>,
) {
    while let Some(email) = outbox.recv().await {
        trace!(logger, "Delivering email..."; "to" => &email.to_email);

        if let Err(e) = mailer.send(email).await {
            error!(logger, "Failed to deliver notification email: {}", e);
        }
    }
}

/// A `Mailer` posting to an EmailJS-compatible transactional endpoint.
pub struct EmailService {
    client: reqwest::Client,
    endpoint: Url,
    service_id: String,
    template_id: String,
    public_key: String,
    from_name: String,
}

impl EmailService {
    pub fn new(
        endpoint: Url,
        service_id: String,
        template_id: String,
        public_key: String,
        from_name: String,
    ) -> Self {
        EmailService {
            client: reqwest::Client::new(),
            endpoint,
            service_id,
            template_id,
            public_key,
            from_name,
        }
    }

    pub fn from_env() -> Self {
        use crate::config::get_variable;

        let endpoint = Url::parse(&get_variable("FOODSHARE_EMAIL_ENDPOINT"))
            .expect("parse FOODSHARE_EMAIL_ENDPOINT as URL");

        Self::new(
            endpoint,
            get_variable("FOODSHARE_EMAIL_SERVICE_ID"),
            get_variable("FOODSHARE_EMAIL_TEMPLATE_ID"),
            get_variable("FOODSHARE_EMAIL_PUBLIC_KEY"),
            get_variable("FOODSHARE_EMAIL_FROM_NAME"),
        )
    }
}

impl Mailer for EmailService {
    fn send(&self, email: Email) -> BoxFuture<Result<(), NotificationError>> {
        use futures::FutureExt;

        let request = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({
                "service_id": self.service_id,
                "template_id": self.template_id,
                "user_id": self.public_key,
                "template_params": {
                    "to_email": email.to_email,
                    "to_name": email.to_name,
                    "from_name": self.from_name,
                    "message": email.message,
                },
            }))
            .send();

        async move {
            let response = request
                .await
                .map_err(|source| NotificationError::Request { source })?;

            let status = response.status();
            if !status.is_success() {
                return Err(NotificationError::Rejected {
                    status: status.as_u16(),
                });
            }

            Ok(())
        }
        .boxed()
    }
}
