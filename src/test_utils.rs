use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

pub fn init() {
    dotenvy::from_filename(".dev.vars").ok();
    env_logger::try_init().ok();
}

/// Builds a JWT-shaped token with the given claims. The signature segment
/// is garbage, which is fine because the client never verifies it.
pub fn bearer_token(email: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({ "alg": "RS256", "typ": "JWT" })).unwrap(),
    );
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({ "email": email, "exp": exp })).unwrap());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}
