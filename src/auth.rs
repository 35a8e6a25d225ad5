//! Client-side storage of the portal auth token.

use std::path::PathBuf;
use std::sync::RwLock;

/// Source of the token sent on authenticated requests.
pub trait TokenStore: Send + Sync {
    /// The stored token, if the user is logged in.
    fn token(&self) -> Option<String>;
}

/// Token persisted in a file under the local data directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Store a token, replacing any previous one.
    pub fn save(&self, token: &str) -> Result<(), TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TokenError::Io(e.to_string()))?;
        }

        std::fs::write(&self.path, token).map_err(|e| TokenError::Io(e.to_string()))
    }

    /// Remove the stored token. Succeeds when none was stored.
    pub fn clear(&self) -> Result<(), TokenError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenError::Io(e.to_string())),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let token = content.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

/// Token held in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut current) => *current = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Token storage errors.
#[derive(Debug)]
pub enum TokenError {
    Empty,
    Io(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Empty => write!(f, "Token is empty"),
            TokenError::Io(e) => write!(f, "Token storage error: {e}"),
        }
    }
}

impl std::error::Error for TokenError {}
