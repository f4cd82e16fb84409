// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{CacheLookup, FlowKind, FlowOutcome};

const FLOW_TOTAL: &str = "oauth2_jwt_broker_flow_total";
const FLOW_DURATION: &str = "oauth2_jwt_broker_flow_duration_seconds";
const CACHE_LOOKUP_TOTAL: &str = "oauth2_jwt_broker_cache_lookup_total";

/// Increments the flow counter for `kind` and `outcome`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (FLOW_TOTAL, kind, outcome);
}

/// Records how long a finished flow took.
pub fn record_flow_duration(kind: FlowKind, outcome: FlowOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!(FLOW_DURATION, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.record(elapsed.as_secs_f64());
	#[cfg(not(feature = "metrics"))]
	let _ = (FLOW_DURATION, kind, outcome, elapsed);
}

/// Increments the cache lookup counter for `lookup`.
pub fn record_cache_lookup(lookup: CacheLookup) {
	#[cfg(feature = "metrics")]
	metrics::counter!(CACHE_LOOKUP_TOTAL, "lookup" => lookup.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (CACHE_LOOKUP_TOTAL, lookup);
}
