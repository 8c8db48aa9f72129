// Credential store
// Two-line file holding the Last.fm username and session key

use crate::scrobbler::{LastFmError, WebAuth};
use crate::ui::prompt::UsernamePrompt;
use backoff::backoff::Constant;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Username and session key of the authorized Last.fm account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub session_key: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read session file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("session file {path:?} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: &'static str },

    #[error("failed to write session file {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum AuthorizeError {
    #[error(transparent)]
    LastFm(#[from] LastFmError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("authorization cancelled")]
    Cancelled,
}

/// Something that can show the authorization page to the user
pub trait BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// The desktop's default browser
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the username (line 1) and session key (line 2)
    pub fn load(&self) -> Result<Credential, CredentialError> {
        let read_err = |source| CredentialError::Read {
            path: self.path.clone(),
            source,
        };
        let malformed = |reason| CredentialError::Malformed {
            path: self.path.clone(),
            reason,
        };

        let file = fs::File::open(&self.path).map_err(read_err)?;
        let mut lines = BufReader::new(file).lines();

        let username = lines
            .next()
            .transpose()
            .map_err(read_err)?
            .ok_or_else(|| malformed("missing username"))?;
        let session_key = lines
            .next()
            .transpose()
            .map_err(read_err)?
            .ok_or_else(|| malformed("missing session key"))?;

        let username = username.trim_end();
        let session_key = session_key.trim();
        if username.is_empty() {
            return Err(malformed("empty username"));
        }
        if session_key.is_empty() {
            return Err(malformed("empty session key"));
        }

        Ok(Credential {
            username: username.to_string(),
            session_key: session_key.to_string(),
        })
    }

    /// Write both values as newline-terminated lines
    pub fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        let write_err = |source| CredentialError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = format!("{}\n{}\n", credential.username, credential.session_key);
        fs::write(&self.path, content).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        log::info!("Session saved to {:?}", self.path);
        Ok(())
    }

    /// First-run web authorization.
    ///
    /// Opens the authorization page once, then exchanges the token every
    /// `poll_interval` until the user approves it. Only the "not authorized
    /// yet" error is retried; anything else is returned. The username is
    /// asked for once the session exists and both values are persisted.
    pub fn authorize<A, B, P>(
        &self,
        auth: &A,
        browser: &B,
        prompt: &P,
        poll_interval: Duration,
    ) -> Result<Credential, AuthorizeError>
    where
        A: WebAuth,
        B: BrowserOpener,
        P: UsernamePrompt + ?Sized,
    {
        let request = auth.web_auth_request()?;

        println!(
            "Please authorize scrobble-presence to read your Last.fm account: {}\n",
            request.url
        );
        if let Err(e) = browser.open(&request.url) {
            log::warn!("Failed to open browser, visit the address above manually: {}", e);
        }

        let session = backoff::retry(Constant::new(poll_interval), || {
            auth.session_from_token(&request).map_err(|e| {
                if e.is_pending_authorization() {
                    log::debug!("Waiting for authorization");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(e) => e,
            backoff::Error::Transient { err, .. } => err,
        })?;

        log::info!("Last.fm session obtained for {}", session.name);

        let username = prompt
            .ask_username(Some(&session.name))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(AuthorizeError::Cancelled)?;

        let credential = Credential {
            username,
            session_key: session.key,
        };
        self.save(&credential)?;

        Ok(credential)
    }
}
