//! JSON reports on stdout. Logs go to stderr so stdout stays parseable.

use anyhow::Result;
use apigw_reconcile::{ErrorKind, ReconcileError, ReconciliationResult, RemoteResource};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Failure {
    pub failed: bool,
    pub msg: String,
    pub kind: ErrorKind,
}

impl Failure {
    /// Library errors keep their own message and kind. Anything else raised
    /// at the edge comes from reading the caller's input.
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ReconcileError>() {
            Some(e) => Failure {
                failed: true,
                msg: e.to_string(),
                kind: e.kind(),
            },
            None => Failure {
                failed: true,
                msg: format!("{:#}", err),
                kind: ErrorKind::Configuration,
            },
        }
    }
}

/// `{"changed": bool, "<result key>": resource-or-null}`.
pub fn report<R: RemoteResource>(result: &ReconciliationResult<R>) -> Result<Value> {
    Ok(result.report(R::RESULT_KEY)?)
}

pub fn print(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
