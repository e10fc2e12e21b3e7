//! Ordered, single-shot execution of spec targets.
//!
//! # Design
//! A `Runner` moves from `Fresh` to `Executed` the moment `run` is entered,
//! before any target is resolved or sent. Calling `run` again is a contract
//! violation and panics, whatever the outcome of the first call was.
//!
//! Error propagation is asymmetric on purpose:
//! - build or sign failures abort the batch and discard earlier results;
//! - transport failures are recorded in that target's `RequestResult` and
//!   the batch carries on.

use tracing::info;

use crate::builder::build_request;
use crate::client::{HttpClient, RequestResult};
use crate::error::Result;
use crate::http::{HeaderSet, HttpMethod};
use crate::signer::sign_request;
use crate::types::{RequestTarget, Spec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Fresh,
    Executed,
}

/// Executes the targets of one spec, at most once.
#[derive(Debug)]
pub struct Runner {
    spec: Spec,
    client: HttpClient,
    state: RunState,
}

impl Runner {
    pub fn new(spec: Spec, client: HttpClient) -> Self {
        Self {
            spec,
            client,
            state: RunState::Fresh,
        }
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Rewrite the base URL of every target. See `RequestTarget::set_base_url`.
    pub fn set_base_url(&mut self, base: &str) -> Result<()> {
        self.spec.set_base_url(base)
    }

    /// Run every target in declaration order.
    pub fn run_all(&mut self) -> Result<Vec<RequestResult>> {
        self.run(std::iter::empty::<&str>())
    }

    /// Run the targets named by `ids`, in the order given. With no ids, run
    /// the whole spec in declaration order.
    ///
    /// All ids are resolved before anything is sent; an unknown id fails
    /// with `UnknownTarget` and no request goes out.
    ///
    /// # Panics
    /// When called a second time on the same runner.
    pub fn run<I, S>(&mut self, ids: I) -> Result<Vec<RequestResult>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state == RunState::Executed {
            panic!("a runner may only run once");
        }
        self.state = RunState::Executed;

        let mut targets: Vec<&RequestTarget> = Vec::new();
        for id in ids {
            targets.push(self.spec.resolve(id.as_ref())?);
        }
        if targets.is_empty() {
            targets = self.spec.targets().iter().collect();
        }

        info!(targets = targets.len(), "starting run");
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(execute(target, &self.client)?);
        }
        info!(results = results.len(), "run finished");
        Ok(results)
    }
}

/// Build, optionally sign, and send one target.
fn execute(target: &RequestTarget, client: &HttpClient) -> Result<RequestResult> {
    let mut headers = HeaderSet::from_pairs(target.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let mut body = Vec::new();
    if target.method == HttpMethod::Post {
        body = serde_json::to_vec(&target.body)?;
        headers.remove("content-type");
        headers.add("Content-Type", "application/json");
    }

    let mut req = build_request(target.method, &target.url, Some(&body), Some(headers))?;
    if let Some(aws) = &target.aws {
        sign_request(&mut req, &body, &aws.region, &aws.profile)?;
    }

    Ok(client.send(&req))
}
