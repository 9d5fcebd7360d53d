// Request signing for the Tuya OpenAPI (v2 sign algorithm)
//
// Every request carries an HMAC-SHA256 signature over:
//   client_id [+ access_token] + t + nonce + string_to_sign
// where string_to_sign is:
//   METHOD \n sha256(body) \n signed-headers (none) \n path[?query]
// The signature is rendered as uppercase hex.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Build the canonical string for a request. `path_and_query` is the URL
/// path plus any query string, e.g. `/v1.0/token?grant_type=1`.
pub fn string_to_sign(method: &str, body: &[u8], path_and_query: &str) -> String {
    let content_hash = hex::encode(Sha256::digest(body));
    format!("{}\n{}\n\n{}", method, content_hash, path_and_query)
}

/// Compute the request signature. `access_token` is empty for the token
/// grant request itself.
pub fn sign(
    secret: &str,
    access_key: &str,
    access_token: &str,
    t: &str,
    nonce: &str,
    string_to_sign: &str,
) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(access_key.as_bytes());
    mac.update(access_token.as_bytes());
    mac.update(t.as_bytes());
    mac.update(nonce.as_bytes());
    mac.update(string_to_sign.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}
