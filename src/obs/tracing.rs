// self
use crate::{
	_prelude::*,
	auth::CredentialKey,
	obs::{CacheLookup, FlowKind},
};

/// Future returned by [`in_flow_span`]: instrumented with tracing, the future itself without.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`in_flow_span`]: instrumented with tracing, the future itself without.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Attaches an `oauth2_jwt_broker.flow` span carrying `flow` and `stage` to `fut`.
///
/// The span is entered on every poll only, never across an `.await`.
pub fn in_flow_span<Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> InstrumentedFlow<Fut>
where
	Fut: Future,
{
	#[cfg(feature = "tracing")]
	{
		use tracing::Instrument;

		fut.instrument(tracing::info_span!("oauth2_jwt_broker.flow", flow = kind.as_str(), stage))
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, stage);

		fut
	}
}

/// Emits a warning for a failed flow.
pub fn trace_flow_failure(kind: FlowKind, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(flow = kind.as_str(), retryable = err.is_retryable(), error = %err, "flow failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, err);
	}
}

/// Emits a debug event describing how a cache lookup for `key` was served.
pub fn trace_lookup(key: &CredentialKey, lookup: CacheLookup) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(key = %key, lookup = lookup.as_str(), "token cache lookup");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, lookup);
	}
}

/// Emits a debug event once an exchange settles the entry for `key`.
pub fn trace_settled(key: &CredentialKey, succeeded: bool) {
	#[cfg(feature = "tracing")]
	{
		if succeeded {
			tracing::debug!(key = %key, "token request completed");
		} else {
			tracing::debug!(key = %key, "token request failed; entry expired for retry");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, succeeded);
	}
}
