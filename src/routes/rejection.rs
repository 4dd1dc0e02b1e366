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
}

impl reject::Reject for Rejection {}

/// Which request failed, for the logs.
#[derive(Clone, Debug)]
pub enum Context {
    Health,
    Records { count: String },
}

impl Context {
    pub fn health() -> Context {
        Context::Health
    }

    pub fn records(count: String) -> Context {
        Context::Records { count }
    }
}
