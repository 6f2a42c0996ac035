//! Authorization-code hand-off contract used by the callback receiver.

// crates.io
use tokio::sync::oneshot;
// self
use crate::_prelude::*;

/// Identifier of one pending interactive authorization attempt.
pub type AuthorizationProcessId = u64;

/// Completes a pending authorization attempt with the code delivered by the OAuth redirect.
pub trait AuthorizationResolver
where
	Self: Send + Sync,
{
	/// Resolves process `process_id` with `code`.
	fn resolve(&self, process_id: AuthorizationProcessId, code: String);
}

/// Resolver that forwards the first code it receives through a oneshot channel.
///
/// Later resolutions are ignored, which makes it suitable for one-shot callback endpoints.
#[derive(Debug)]
pub struct OneshotResolver(Mutex<Option<oneshot::Sender<(AuthorizationProcessId, String)>>>);
impl OneshotResolver {
	/// Creates the resolver together with the receiving half.
	pub fn channel() -> (Self, oneshot::Receiver<(AuthorizationProcessId, String)>) {
		let (tx, rx) = oneshot::channel();

		(Self(Mutex::new(Some(tx))), rx)
	}

	/// Returns `true` once a code has been forwarded.
	pub fn is_resolved(&self) -> bool {
		self.0.lock().is_none()
	}
}
impl AuthorizationResolver for OneshotResolver {
	fn resolve(&self, process_id: AuthorizationProcessId, code: String) {
		if let Some(tx) = self.0.lock().take() {
			let _ = tx.send((process_id, code));
		}
	}
}
