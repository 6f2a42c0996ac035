// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_pager.operation", operation = operation.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `warn` event describing a failed operation.
pub fn log_failure(operation: Operation, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation = operation.as_str(), %error, "operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, error);
	}
}

/// Emits a `warn` event for a failed request attempt that will be retried.
pub fn log_retry(url: &str, attempt: u8, refresh_token: bool, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(url, attempt, refresh_token, %error, "request attempt failed; retrying");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, attempt, refresh_token, error);
	}
}

/// Emits an `info` event once a fresh bearer token is installed.
pub fn log_token_installed(generation: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(generation, "new bearer token installed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = generation;
	}
}

/// Emits an `info` event once the callback endpoint accepts connections.
pub fn log_listening(addr: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(%addr, "authorization callback endpoint listening");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = addr;
	}
}
