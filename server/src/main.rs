use std::error::Error;
use std::sync::Arc;

use warp::Filter;

use foodshare::config::get_variable;
use foodshare::db::PgDb;
use foodshare::environment::{Config, Environment};
use foodshare::lifecycle::Lifecycle;
use foodshare::notifications::{self, EmailService, Notifier};
use foodshare::routes;
use foodshare::urls::Urls;
use futures::future::FutureExt;
use log::{info, initialize_logger};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("FOODSHARE_PORT")
        .parse()
        .expect("parse FOODSHARE_PORT as u16");
    let admin_port: u16 = get_variable("FOODSHARE_ADMIN_PORT")
        .parse()
        .expect("parse FOODSHARE_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("FOODSHARE_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from FOODSHARE_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let mailer = Arc::new(EmailService::from_env());
    let (notifier, outbox) = Notifier::new(logger.clone());
    tokio::spawn(notifications::deliver_all(logger.clone(), mailer, outbox));

    let lifecycle = Lifecycle::new(db.clone(), notifier, logger.clone());

    let urls = Arc::new(Urls::new(
        get_variable("FOODSHARE_BASE_URL"),
        get_variable("FOODSHARE_DONATIONS_PATH"),
    ));

    let config = Config::new();
    let environment = Environment::new(logger.clone(), db, lifecycle, urls, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate =
        Arc::new(move || {
            let termination_sender = termination_sender.clone();

            async move {
            let termination_sender = termination_sender.clone();
                termination_sender.send(()).await.unwrap();
            }
            .boxed()
        });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate();
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let available_route = routes::make_available_route(environment.clone());
        let by_donor_route = routes::make_by_donor_route(environment.clone());
        let stats_route = routes::make_stats_route(environment.clone());
        let create_route = routes::make_create_route(environment.clone());
        let claim_route = routes::make_claim_route(environment.clone());
        let pickup_route = routes::make_pickup_route(environment.clone());
        let complete_route = routes::make_complete_route(environment.clone());
        let retrieve_route = routes::make_retrieve_route(environment.clone());

        // The catch-all retrieve route must come after every route with a
        // fixed path segment.
        let routes = by_donor_route
            .or(stats_route)
            .or(available_route)
            .or(create_route)
            .or(claim_route)
            .or(pickup_route)
            .or(complete_route)
            .or(retrieve_route)
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
