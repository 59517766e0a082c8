use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Available,
    ByDonor { donor: String },
    Claim { id: String },
    Complete { id: String },
    Create,
    Pickup { id: String },
    Retrieve { id: String },
    Stats,
}

impl Context {
    pub fn available() -> Context {
        Context::Available
    }

    pub fn by_donor(donor: String) -> Context {
        Context::ByDonor { donor }
    }

    pub fn claim(id: String) -> Context {
        Context::Claim { id }
    }

    pub fn complete(id: String) -> Context {
        Context::Complete { id }
    }

    pub fn create() -> Context {
        Context::Create
    }

    pub fn pickup(id: String) -> Context {
        Context::Pickup { id }
    }

    pub fn retrieve(id: String) -> Context {
        Context::Retrieve { id }
    }

    pub fn stats() -> Context {
        Context::Stats
    }
}
