use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// The single header scheme used to authenticate against a printer host.
///
/// OctoPrint accepts both `X-Api-Key` and `Authorization: Bearer`; only
/// this one is ever sent so every call authenticates the same way.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Build the default header map carrying the API key.
///
/// The value is marked sensitive so it is redacted from `Debug` output.
pub fn api_key_headers(api_key: &SecretString) -> Result<HeaderMap, Error> {
    let mut value =
        HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::InvalidApiKey {
            reason: format!("not a valid header value: {e}"),
        })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, value);
    Ok(headers)
}
