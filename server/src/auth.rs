use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::normalization;

/// The declared role of an authenticated actor.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Ngo,
    Volunteer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Ngo => "ngo",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated actor behind a request. Carried explicitly into every
/// lifecycle operation rather than read from shared state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,

    #[serde(deserialize_with = "normalization::deserialize")]
    pub name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    /// The organization an NGO actor belongs to, if any.
    #[serde(default, rename = "organizationName")]
    pub organization: Option<String>,

    pub role: Role,
}

/// The identity provider's view of a signed-in user, as delivered by its
/// state-change subscription.
#[derive(Clone, Debug, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub verified: bool,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub role: Role,
}

impl Session {
    pub fn from_identity(identity: Identity) -> Self {
        let Identity {
            uid,
            email,
            display_name,
            phone,
            organization,
            role,
            ..
        } = identity;

        let name = display_name.unwrap_or_else(|| email.clone());

        Session {
            uid,
            name,
            email,
            phone,
            organization,
            role,
        }
    }
}

/// Translates the identity provider's state-change events into session
/// values. `None` items mean the user signed out.
pub struct SessionEvents {
    receiver: mpsc::Receiver<Option<Identity>>,
}

impl SessionEvents {
    pub fn new(receiver: mpsc::Receiver<Option<Identity>>) -> Self {
        SessionEvents { receiver }
    }

    /// The next session state. The outer `None` means the provider's stream
    /// has closed.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        self.receiver
            .recv()
            .await
            .map(|state| state.map(Session::from_identity))
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::{Identity, Role, SessionEvents};

    fn identity(name: Option<&str>) -> Identity {
        Identity {
            uid: "ngo-1".to_owned(),
            email: "hope@example.org".to_owned(),
            verified: true,
            display_name: name.map(str::to_owned),
            phone: None,
            organization: Some("Hope Kitchen".to_owned()),
            role: Role::Ngo,
        }
    }

    #[tokio::test]
    async fn sessions_follow_identity_events() {
        let (sender, receiver) = mpsc::channel(4);
        let mut events = SessionEvents::new(receiver);

        sender.send(Some(identity(Some("Hope")))).await.unwrap();
        sender.send(None).await.unwrap();
        drop(sender);

        let session = events.next().await.unwrap().unwrap();
        assert_eq!(session.uid, "ngo-1");
        assert_eq!(session.name, "Hope");
        assert_eq!(session.role, Role::Ngo);

        assert_eq!(events.next().await, Some(None));
        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn sessions_fall_back_to_email_for_the_name() {
        let (sender, receiver) = mpsc::channel(1);
        let mut events = SessionEvents::new(receiver);

        sender.send(Some(identity(None))).await.unwrap();

        let session = events.next().await.unwrap().unwrap();
        assert_eq!(session.name, "hope@example.org");
    }
}
