use url::Url;
use uuid::Uuid;

/// Convenience wrapper for URL generation functions.
#[derive(Clone)]
pub struct Urls {
    /// Top-level URL, including trailing slash.
    base: Url,

    /// Path for all donation-related actions.
    pub(crate) donations_path: String,

    /// Prefix for all donation-related actions.
    donations_prefix: String,
}

impl Urls {
    /// Create a new instance. `donations_prefix` should *not* include a trailing slash.
    pub fn new(base: impl AsRef<str>, donations_prefix: impl Into<String>) -> Self {
        let base =
            Url::parse(base.as_ref()).unwrap_or_else(|_| panic!("parse {} as URL", base.as_ref()));
        let donations_path = donations_prefix.into();
        let donations_prefix = format!("{}/", donations_path);

        Urls {
            base,
            donations_path,
            donations_prefix,
        }
    }

    pub fn donations(&self) -> Url {
        self.base
            .join(&self.donations_prefix)
            .expect("get donations URL")
    }

    pub fn donation(&self, id: &Uuid) -> Url {
        let id = format!("{}", id);
        self.donations()
            .join(&id)
            .unwrap_or_else(|_| panic!("get URL for donation {}", id))
    }
}
