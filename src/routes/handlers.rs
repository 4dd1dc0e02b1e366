use std::time::{Duration, Instant};

use log::{debug, info};
use serde_json::json;
use time::OffsetDateTime;
use warp::{
    reject,
    reply::{json, with_header, Reply},
};

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    rejection::{Context, Rejection},
    response::{format_timestamp, SuccessResponse},
};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn index(environment: Environment) -> RouteResult {
    timed! {
        let max = environment.config.max_records;

        json(&SuccessResponse::Index {
            message: info::SERVICE_NAME,
            version: info::VERSION,
            endpoints: json!({
                "GET /{N}": format!(
                    "Get N drum records (1 to {}) with random modifications",
                    max
                ),
                "GET /health": "Report service status and the number of stored records",
                "DELETE /reset": "Clear stored records so the next request starts fresh",
                "Examples": [
                    "GET /10 - Returns 10 drum records",
                    "GET /50 - Returns 50 drum records"
                ]
            }),
        })
    }
}

pub async fn health(environment: Environment) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::health(), e);

        let stored_records_count = environment.snapshots.len().map_err(error_handler)?;
        let timestamp = format_timestamp(OffsetDateTime::now_utc())
            .map_err(|e| error_handler(e.into()))?;

        json(&SuccessResponse::Health {
            status: "healthy",
            stored_records_count,
            timestamp,
        })
    }
}

pub async fn records(environment: Environment, count: String) -> RouteResult {
    timed! {
        let Environment {
            logger,
            snapshots,
            config,
        } = environment;

        let error_handler = |e: BackendError| Rejection::new(Context::records(count.clone()), e);

        let target = parse_count(&count, config.max_records).map_err(error_handler)?;
        let now = OffsetDateTime::now_utc();

        let advanced = snapshots
            .advance(&mut rand::thread_rng(), now, target)
            .map_err(error_handler)?;
        debug!(logger, "Generated records"; "requested" => target, "previous" => advanced.previous_len);

        let timestamp = format_timestamp(now).map_err(|e| error_handler(e.into()))?;

        json(&SuccessResponse::Records {
            count: advanced.records.len(),
            timestamp,
            data: advanced.records,
        })
    }
}

pub async fn reset(environment: Environment) -> RouteResult {
    timed! {
        environment.snapshots.reset();
        info!(environment.logger, "Cleared stored records");

        json(&SuccessResponse::Reset {
            message: "Stored records cleared",
        })
    }
}

/// Accepts whole numbers from 1 to `max`.
fn parse_count(count: &str, max: usize) -> Result<usize, BackendError> {
    count
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=max).contains(n))
        .ok_or_else(|| BackendError::InvalidCount {
            count: count.to_owned(),
            max,
        })
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
