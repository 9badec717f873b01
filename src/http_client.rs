use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::error::IngestError;

const USER_AGENT: &str = concat!("sokkai/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide blocking client. The timeout of the first call is the one
/// that sticks.
pub fn http_client(timeout: Duration) -> Result<&'static Client, IngestError> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(IngestError::download)
    })
}
