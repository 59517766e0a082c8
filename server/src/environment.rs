use std::sync::Arc;

use log::Logger;

use crate::config::get_variable;
use crate::db::Db;
use crate::lifecycle::Lifecycle;
use crate::urls::Urls;

/// The shared state handed to every request handler.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,

    pub db: Arc<dyn Db + Send + Sync>,

    pub lifecycle: Lifecycle,

    pub urls: Arc<Urls>,

    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        lifecycle: Lifecycle,
        urls: Arc<Urls>,
        config: Config,
    ) -> Self {
        Environment {
            logger,
            db,
            lifecycle,
            urls,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How many months of history the stats endpoint reports.
    pub(crate) stats_months: u8,
}

impl Config {
    pub fn new() -> Self {
        let stats_months = get_variable("FOODSHARE_STATS_MONTHS")
            .parse()
            .expect("parse FOODSHARE_STATS_MONTHS as a number");

        Config { stats_months }
    }
}
