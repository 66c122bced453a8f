//! The signed-in user's bearer credential, decoded from a JWT handed over
//! by the external login flow. The token's signature is not checked here;
//! the notification backend verifies it on every call.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;

/// Persistence for the raw credential across runs, the equivalent of the
/// browser's single localStorage entry.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, credential: &str);
}

/// Stores the credential as the sole content of one file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> FileStore {
        FileStore { path: path.into() }
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn save(&self, credential: &str) {
        if let Err(e) = fs::write(&self.path, credential) {
            log::error!("Failed to persist credential to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    cell: Mutex<Option<String>>,
}

#[cfg(test)]
impl CredentialStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.cell.lock().unwrap().clone()
    }

    fn save(&self, credential: &str) {
        *self.cell.lock().unwrap() = Some(credential.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The raw credential, forwarded as a bearer token on outbound calls.
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Active(Session),
    /// No session obtainable locally; the caller must send the user to the
    /// external login flow. A control-flow outcome, not an error.
    RedirectRequired { login_url: String },
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    email: String,
    /// Expiry in Unix seconds.
    exp: i64,
}

fn decode_claims(token: &str) -> Option<JwtClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn is_expired(claims: &JwtClaims, now: i64) -> bool {
    claims.exp < now
}

/// Owns the active session for the process. Expiry is only detected when
/// `initialize` runs again; an established session is never refreshed
/// in place.
pub struct SessionManager {
    login_url: String,
    store: Box<dyn CredentialStore>,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(login_url: String, store: Box<dyn CredentialStore>) -> SessionManager {
        SessionManager {
            login_url,
            store,
            current: Mutex::new(None),
        }
    }

    /// Establishes a session from the credential handed over by the login
    /// redirect, falling back to the persisted one. A malformed credential
    /// behaves exactly like an absent one. On success the credential is
    /// persisted so later runs skip the login redirect until it expires;
    /// it is never echoed back to the caller.
    pub fn initialize(&self, query_credential: Option<&str>) -> SessionOutcome {
        let credential = query_credential
            .map(str::to_string)
            .or_else(|| self.store.load());

        let Some(credential) = credential else {
            return self.redirect();
        };

        let Some(claims) = decode_claims(&credential) else {
            log::warn!("Credential present but not decodable, treating as signed out");
            return self.redirect();
        };

        if is_expired(&claims, Utc::now().timestamp()) {
            log::info!("Credential for {} has expired", claims.email);
            return self.redirect();
        }

        let session = Session {
            token: credential,
            email: claims.email,
        };

        self.store.save(&session.token);
        *self.current.lock().unwrap() = Some(session.clone());

        SessionOutcome::Active(session)
    }

    /// The session established by the last successful `initialize`.
    pub fn current(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    fn redirect(&self) -> SessionOutcome {
        *self.current.lock().unwrap() = None;
        SessionOutcome::RedirectRequired {
            login_url: self.login_url.clone(),
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::test_utils::{bearer_token, init};

    const LOGIN_URL: &str = "https://auth.example.com";

    fn manager() -> SessionManager {
        init();
        SessionManager::new(LOGIN_URL.to_string(), Box::new(MemoryStore::default()))
    }

    fn assert_redirect(outcome: SessionOutcome) {
        assert_eq!(
            outcome,
            SessionOutcome::RedirectRequired {
                login_url: LOGIN_URL.to_string()
            }
        );
    }

    #[test]
    fn test_no_credential_anywhere_redirects() {
        let manager = manager();
        assert_redirect(manager.initialize(None));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_garbage_credential_behaves_like_none() {
        let manager = manager();
        assert_redirect(manager.initialize(Some("not-a-jwt")));
        assert_redirect(manager.initialize(Some("still..not-base64..")));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_valid_credential_establishes_session() {
        let manager = manager();
        let token = bearer_token("rider@example.com", Utc::now().timestamp() + 3600);

        let outcome = manager.initialize(Some(&token));

        let SessionOutcome::Active(session) = outcome else {
            panic!("Expected an active session, got {:?}", outcome);
        };
        assert_eq!(session.email, "rider@example.com");
        assert_eq!(session.token, token);
        assert_eq!(manager.current(), Some(session));
    }

    #[test]
    fn test_persisted_credential_survives_reinitialization() {
        let manager = manager();
        let token = bearer_token("rider@example.com", Utc::now().timestamp() + 3600);

        manager.initialize(Some(&token));

        // No query credential this time; the store supplies it
        let outcome = manager.initialize(None);
        assert!(matches!(outcome, SessionOutcome::Active(_)));
    }

    #[test]
    fn test_query_credential_wins_over_store() {
        let store = MemoryStore::default();
        store.save(&bearer_token("old@example.com", Utc::now().timestamp() + 3600));
        let manager = SessionManager::new(LOGIN_URL.to_string(), Box::new(store));

        let fresh = bearer_token("new@example.com", Utc::now().timestamp() + 3600);
        let SessionOutcome::Active(session) = manager.initialize(Some(&fresh)) else {
            panic!("Expected an active session");
        };
        assert_eq!(session.email, "new@example.com");
    }

    #[test]
    fn test_expired_credential_redirects() {
        let manager = manager();
        let token = bearer_token("rider@example.com", Utc::now().timestamp() - 3600);

        assert_redirect(manager.initialize(Some(&token)));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = 1_700_000_000;

        let just_expired = JwtClaims {
            email: "rider@example.com".to_string(),
            exp: now - 1,
        };
        assert!(is_expired(&just_expired, now));

        let still_valid = JwtClaims {
            email: "rider@example.com".to_string(),
            exp: now + 1,
        };
        assert!(!is_expired(&still_valid, now));

        // exp equal to now has not expired yet
        let on_the_dot = JwtClaims {
            email: "rider@example.com".to_string(),
            exp: now,
        };
        assert!(!is_expired(&on_the_dot, now));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential");

        let store = FileStore::new(&path);
        assert!(store.load().is_none());

        store.save("header.payload.signature");
        assert_eq!(store.load().as_deref(), Some("header.payload.signature"));
    }
}
