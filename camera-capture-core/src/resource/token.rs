use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle for one outstanding "camera in use" request.
///
/// Returned by `start_running`; pass it back to `stop_running` to release the
/// camera. A token is live from the moment its start is processed until its
/// matching stop (or a session recreation) invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapturerToken {
    id: Uuid,
}

impl CapturerToken {
    pub fn mint() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for CapturerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapturerToken({})", self.id)
    }
}

/// Holds a token so that exactly one of several racing owners gets to stop it.
#[derive(Debug, Default)]
pub struct CapturerTokenProvider {
    token: Mutex<Option<CapturerToken>>,
}

impl CapturerTokenProvider {
    pub fn new(token: CapturerToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    /// Replace the held token, returning the previous one if it was never taken.
    pub fn set(&self, token: CapturerToken) -> Option<CapturerToken> {
        self.token.lock().replace(token)
    }

    /// Take the token. Only the first caller receives it.
    pub fn get_token_and_invalidate(&self) -> Option<CapturerToken> {
        self.token.lock().take()
    }

    pub fn has_token(&self) -> bool {
        self.token.lock().is_some()
    }
}

/// Tokens that have been started and not yet stopped.
#[derive(Debug, Default)]
pub(crate) struct LiveTokens {
    tokens: HashSet<CapturerToken>,
}

impl LiveTokens {
    pub(crate) fn register(&mut self, token: CapturerToken) -> bool {
        self.tokens.insert(token)
    }

    /// Returns whether the token was live. A second invalidation of the same
    /// token returns false.
    pub(crate) fn invalidate(&mut self, token: &CapturerToken) -> bool {
        self.tokens.remove(token)
    }

    pub(crate) fn contains(&self, token: &CapturerToken) -> bool {
        self.tokens.contains(token)
    }

    pub(crate) fn clear(&mut self) -> usize {
        let count = self.tokens.len();
        self.tokens.clear();
        count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &CapturerToken> {
        self.tokens.iter()
    }
}
