//! Optional observability for token acquisition.
//!
//! # Feature Flags
//!
//! - `tracing`: every flow runs inside an `oauth2_jwt_broker.flow` span (`flow`, `stage`); failed
//!   flows emit a warning, and cache lookups and settlements emit debug events.
//! - `metrics`: `oauth2_jwt_broker_flow_total{flow,outcome}`,
//!   `oauth2_jwt_broker_flow_duration_seconds{flow,outcome}`, and
//!   `oauth2_jwt_broker_cache_lookup_total{lookup}`.
//!
//! Without either feature every hook compiles down to nothing.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Runs one flow, recording its attempt, outcome, and duration and tracing failures.
pub async fn observe_flow<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	record_flow_outcome(kind, FlowOutcome::Attempt);

	let started = Instant::now();
	let result = in_flow_span(kind, stage, fut).await;
	let outcome = FlowOutcome::of(&result);

	record_flow_outcome(kind, outcome);
	record_flow_duration(kind, outcome, started.elapsed());

	if let Err(e) = &result {
		trace_flow_failure(kind, e);
	}

	result
}

/// Token acquisition steps observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Claim building, signing, and exchange for one account.
	Authenticate,
	/// HTTP round-trip to the token endpoint.
	Exchange,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authenticate => "authenticate",
			FlowKind::Exchange => "exchange",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto [`FlowOutcome::Success`] or [`FlowOutcome::Failure`].
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a cache lookup was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheLookup {
	/// A fresh cached token was returned without any exchange.
	Hit,
	/// The caller joined an exchange another caller already started.
	Joined,
	/// No usable token existed; the caller started the first exchange for the entry.
	Fetch,
	/// The cached token had expired; the caller started a replacement exchange.
	Refresh,
}
impl CacheLookup {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheLookup::Hit => "hit",
			CacheLookup::Joined => "joined",
			CacheLookup::Fetch => "fetch",
			CacheLookup::Refresh => "refresh",
		}
	}
}
impl Display for CacheLookup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
