use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, Logger};
use time::OffsetDateTime;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Reply};
use warp::Filter;

use crate::config::{Config, CorsOrigin, Mode};
use crate::environment::Environment;
use crate::errors::BackendError;

mod handlers;
mod rejection;
mod response;

pub use internal::*;
use rejection::Rejection;
use response::{format_timestamp, ErrorResponse, ServerError};

/// Builds the whole API: every route, error formatting, CORS and
/// request logging.
pub fn make_api(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + Send + Sync + 'static
{
    let logger = environment.logger.clone();
    let mode = environment.config.mode;
    let cors = make_cors(&environment.config);

    let request_logger = logger.clone();
    let request_log = warp::log::custom(move |request: warp::log::Info| {
        info!(request_logger, "Handled request";
            "method" => %request.method(),
            "path" => request.path(),
            "status" => request.status().as_u16(),
            "elapsed_ms" => request.elapsed().as_secs_f64() * 1000.0);
    });

    // `/health` and `/reset` have to come before the catch-all count
    make_index_route(environment.clone())
        .or(make_health_route(environment.clone()))
        .or(make_reset_route(environment.clone()))
        .or(make_records_route(environment))
        .recover(move |r| format_rejection(logger.clone(), mode, r))
        .with(cors)
        .with(request_log)
}

fn make_cors(config: &Config) -> warp::cors::Cors {
    let builder = warp::cors()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_headers(vec!["Content-Type", "Authorization"])
        .expose_headers(vec!["Content-Length", "X-Request-Id"])
        .max_age(Duration::from_secs(config.cors_max_age))
        .allow_credentials(true);

    match &config.cors_origin {
        CorsOrigin::Any => builder.allow_any_origin(),
        CorsOrigin::Exact(origin) => builder.allow_origin(origin.as_str()),
    }
    .build()
}

pub async fn format_rejection(
    logger: Arc<Logger>,
    mode: Mode,
    rej: reject::Rejection,
) -> Result<Box<dyn Reply>, Infallible> {
    if let Some(r) = rej.find::<Rejection>() {
        let status = status_code_for(&r.error);

        if status.is_client_error() {
            debug!(logger, "Rejected request"; "context" => ?r.context, "message" => %r.error);

            return Ok(Box::new(with_status(
                json(&ErrorResponse::Client {
                    error: r.error.to_string(),
                }),
                status,
            )));
        }

        return Ok(server_error(
            &logger,
            mode,
            r.error.to_string(),
            format!("{:?} while handling {:?}", r.error, r.context),
        ));
    }

    if rej.is_not_found() || rej.find::<reject::MethodNotAllowed>().is_some() {
        return Ok(Box::new(with_status(
            json(&ErrorResponse::NotFound {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: "Not Found",
            }),
            StatusCode::NOT_FOUND,
        )));
    }

    Ok(server_error(
        &logger,
        mode,
        "Unhandled rejection".to_owned(),
        format!("{:?}", rej),
    ))
}

fn server_error(logger: &Logger, mode: Mode, message: String, details: String) -> Box<dyn Reply> {
    let id = Uuid::new_v4();
    let timestamp = format_timestamp(OffsetDateTime::now_utc()).unwrap_or_default();

    error!(logger, "Server error"; "id" => %id, "message" => &message, "details" => &details);

    let error = match mode {
        Mode::Production => ServerError {
            message: "Internal Server Error".to_owned(),
            id,
            timestamp,
            details: None,
        },
        Mode::Development => ServerError {
            message,
            id,
            timestamp,
            details: Some(details),
        },
    };

    Box::new(with_status(
        json(&ErrorResponse::Server { error }),
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        InvalidCount { .. } => StatusCode::BAD_REQUEST,
        SnapshotPoisoned | TimestampFormat { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par};

    use super::handlers;
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
            let $route_variable = warp::any().map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_index_route => index, rt; end(), g());
    route!(make_health_route => health, rt; p("health"), end(), g());
    route!(make_reset_route => reset, rt; p("reset"), end(), delete());
    route!(make_records_route => records, rt; par::<String>(), end(), g());
}
