//! Credential storage slot.

use parking_lot::RwLock;

use crate::auth::jwt::Token;

/// Key-value slot holding the current bearer token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<Token>;
    fn set(&self, token: Token);
    fn remove(&self);
}

/// Process-local store; the token lives as long as the client does.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Token> {
        self.token.read().clone()
    }

    fn set(&self, token: Token) {
        *self.token.write() = Some(token);
    }

    fn remove(&self) {
        self.token.write().take();
    }
}
