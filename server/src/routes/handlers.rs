use std::time::{Duration, Instant};

use time::OffsetDateTime;
use uuid::Uuid;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use log::debug;

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    query::{ActionRequest, CreateRequest, FilterQuery},
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::stats;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn available(environment: Environment, query: FilterQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::available(), e);

        let all = query.all;
        let filters = query.into_filters().map_err(error_handler)?;

        let donations = if all {
            environment.db.list_all().await
        } else {
            environment.db.list_available().await
        }
        .map_err(error_handler)?;

        let donations = filters.apply(donations, OffsetDateTime::now_utc());

        json(&SuccessResponse::Donations { donations })
    }
}

pub async fn by_donor(
    environment: Environment,
    donor: String,
    query: FilterQuery,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::by_donor(donor.clone()), e);

        let filters = query.into_filters().map_err(error_handler)?;
        debug!(environment.logger, "Listing donations by donor..."; "donor" => &donor);

        let donations = environment
            .db
            .list_by_donor(&donor)
            .await
            .map_err(error_handler)?;
        let donations = filters.apply(donations, OffsetDateTime::now_utc());

        json(&SuccessResponse::Donations { donations })
    }
}

pub async fn stats(environment: Environment) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::stats(), e);

        let donations = environment.db.list_all().await.map_err(error_handler)?;
        let stats = stats::compute(
            &donations,
            OffsetDateTime::now_utc(),
            environment.config.stats_months,
        );

        json(&SuccessResponse::Stats(stats))
    }
}

pub async fn retrieve(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::retrieve(id.clone()), e);

        let id = Uuid::parse_str(&id)
            .map_err(|_| BackendError::InvalidId(id.clone()))
            .map_err(error_handler)?;
        debug!(environment.logger, "Retrieving donation..."; "id" => format!("{}", &id));

        let option = environment.db.retrieve(&id).await.map_err(error_handler)?;

        match option {
            Some(donation) => with_status(json(&donation), StatusCode::OK),
            None => with_status(json(&()), StatusCode::NOT_FOUND),
        }
    }
}

pub async fn create(environment: Environment, request: CreateRequest) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create(), e);

        let CreateRequest { actor, donation } = request;
        debug!(environment.logger, "Accepting donation submission..."; "donor" => &actor.uid);

        let created = environment
            .lifecycle
            .create(&actor, donation)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&created), StatusCode::CREATED),
            "location",
            environment.urls.donation(created.id()).as_str(),
        )
    }
}

pub async fn claim(environment: Environment, id: Uuid, request: ActionRequest) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::claim(id.to_string()), e);

        debug!(environment.logger, "Claiming donation..."; "id" => format!("{}", &id));
        let donation = environment
            .lifecycle
            .claim(&request.actor, &id)
            .await
            .map_err(error_handler)?;

        json(&donation)
    }
}

pub async fn pickup(environment: Environment, id: Uuid, request: ActionRequest) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::pickup(id.to_string()), e);

        debug!(environment.logger, "Confirming pickup..."; "id" => format!("{}", &id));
        let donation = environment
            .lifecycle
            .mark_picked_up(&request.actor, &id)
            .await
            .map_err(error_handler)?;

        json(&donation)
    }
}

pub async fn complete(environment: Environment, id: Uuid, request: ActionRequest) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::complete(id.to_string()), e);

        debug!(environment.logger, "Completing donation..."; "id" => format!("{}", &id));
        let donation = environment
            .lifecycle
            .complete(&request.actor, &id)
            .await
            .map_err(error_handler)?;

        json(&donation)
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
