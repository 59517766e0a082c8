use serde::Serialize;

use crate::donation::Donation;
use crate::stats::DonationStats;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Donations {
        donations: Vec<Donation>,
    },
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Stats(DonationStats),
}
