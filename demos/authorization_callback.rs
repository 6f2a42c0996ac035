//! Starts the one-shot authorization callback endpoint and delivers a code to it the way a browser
//! redirect would.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
// self
use oauth2_pager::{
	callback::{CallbackConfig, CallbackServer},
	ext::OneshotResolver,
	reqwest,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let (resolver, _rx) = OneshotResolver::channel();
	let handle = CallbackServer::new(CallbackConfig::new(0)).start(Arc::new(resolver), 1).await?;

	println!("Register {} as the redirect URI.", handle.callback_url());

	let response = reqwest::get(format!("{}?code=demo-code", handle.callback_url())).await?;

	println!("Browser saw HTTP {}: {}.", response.status(), response.text().await?);

	let (process_id, code) = handle.wait(Duration::from_secs(30)).await?;

	println!("Authorization process {process_id} received code {code}.");

	Ok(())
}
