use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum request body size to accept. Donation submissions are small
/// JSON documents; anything near this limit is garbage.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        InvalidDonation { .. } | InvalidId(..) | InvalidFilter { .. } => StatusCode::BAD_REQUEST,
        NotPermitted { .. } => StatusCode::FORBIDDEN,
        NonExistentId(..) => StatusCode::NOT_FOUND,
        StatusConflict { .. } | IllegalTransition { .. } => StatusCode::CONFLICT,
        Expired(..) => StatusCode::GONE,
        Sqlx { .. } | UnrecognizedValue { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use uuid::Uuid;
    use warp::filters::body;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, path as p, path::param as par, post, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let r = environment.urls.donations_path.clone();

            let $route_variable = warp::any()
                .map(move || environment.clone())
                .and(p(r));

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_available_route => available, rt; query::<q::FilterQuery>(), end(), g());
    route!(make_by_donor_route => by_donor, rt; p("donor"), par::<String>(), query::<q::FilterQuery>(), end(), g());
    route!(make_stats_route => stats, rt; p("stats"), end(), g());
    route!(make_create_route => create, rt; end(), post(), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_claim_route => claim, rt; par::<Uuid>(), p("claim"), end(), post(), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_pickup_route => pickup, rt; par::<Uuid>(), p("pickup"), end(), post(), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_complete_route => complete, rt; par::<Uuid>(), p("complete"), end(), post(), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_retrieve_route => retrieve, rt; par::<String>(), end(), g());
}
