use parking_lot::RwLock;

/// Explicit client-side session context: the API base URL plus the optional
/// static token, with an init-on-load / clear-on-logout lifecycle.
pub struct ClientSession {
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ClientSession {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: RwLock::new(None),
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let session = Self::new(base_url);
        session.set_token(token);
        session
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Attaches the token header when a token is held.
    pub fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => builder.header("X-Token", token),
            None => builder,
        }
    }
}
