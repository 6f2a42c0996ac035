//! Lock-protected bearer token cell with generation tracking.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Point-in-time view of the held token.
#[derive(Clone, Debug)]
pub(crate) struct TokenSnapshot {
	pub(crate) token: Option<AccessToken>,
	pub(crate) generation: u64,
}

/// Holds at most one current token. Every replacement bumps the generation, which lets
/// concurrent refreshers detect that someone else already replaced the token they saw fail.
#[derive(Debug, Default)]
pub(crate) struct TokenCell {
	state: RwLock<TokenState>,
	refresh_guard: AsyncMutex<()>,
}
impl TokenCell {
	pub(crate) fn snapshot(&self) -> TokenSnapshot {
		let state = self.state.read();

		TokenSnapshot { token: state.token.clone(), generation: state.generation }
	}

	/// Swaps in `token` wholesale and returns the new generation.
	pub(crate) fn replace(&self, token: Option<AccessToken>) -> u64 {
		let mut state = self.state.write();

		state.token = token;
		state.generation += 1;

		state.generation
	}

	pub(crate) fn refresh_guard(&self) -> &AsyncMutex<()> {
		&self.refresh_guard
	}
}

#[derive(Debug, Default)]
struct TokenState {
	token: Option<AccessToken>,
	generation: u64,
}
