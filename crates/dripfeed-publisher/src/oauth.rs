//! OAuth 1.0a request signing (HMAC-SHA1, user context).
//!
//! Only what posting needs: the signature base string over the oauth
//! parameters plus any form/query parameters, and the `Authorization`
//! header built from it. JSON bodies are not part of the signature.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// App and user tokens for one account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `Authorization` header value for a request with a fresh nonce and the
/// current timestamp.
pub fn authorization_header(
    creds: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    build_header(creds, method, url, params, &nonce, &timestamp)
}

fn build_header(
    creds: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth = oauth_params(creds, nonce, timestamp);

    let mut signed: Vec<(&str, &str)> = oauth.clone();
    signed.extend_from_slice(params);
    let signature = sign(creds, &base_string(method, url, &signed));

    let mut header = oauth;
    header.push(("oauth_signature", signature.as_str()));
    header.sort();

    let fields: Vec<String> = header
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    format!("OAuth {}", fields.join(", "))
}

fn oauth_params<'a>(creds: &'a Credentials, nonce: &'a str, timestamp: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("oauth_consumer_key", creds.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", creds.token.as_str()),
        ("oauth_version", "1.0"),
    ]
}

/// `METHOD&enc(url)&enc(k1=v1&k2=v2...)` with pairs encoded then sorted.
pub fn base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();
    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&joined)
    )
}

/// Base64 HMAC-SHA1 of `base` keyed with `enc(consumer_secret)&enc(token_secret)`.
pub fn sign(creds: &Credentials, base: &str) -> String {
    let key = format!(
        "{}&{}",
        encode(&creds.consumer_secret),
        encode(&creds.token_secret)
    );
    let mut mac = match HmacSha1::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
