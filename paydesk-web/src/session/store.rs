//! In-process authority for "who is logged in".
//!
//! The store pairs an in-memory [`SessionState`] with its durable copy in
//! [`SessionStorage`]. Reads are synchronous. Remote validation only ever
//! updates state after the fact and never clears it on a network failure.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use shared::{
    auth::Credential,
    models::{LoginRequest, User},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    client::{SessionApi, SessionApiError},
    storage::{SessionStorage, StorageBackend, StorageError},
};
use crate::config::InvalidSessionPolicy;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session needs a non-empty credential")]
    EmptyCredential,
    #[error("a session needs a user with an id")]
    MissingUser,
    #[error("this account does not have admin access")]
    NotAdmin,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Remote(#[from] SessionApiError),
    #[error("use_session must be called inside a <SessionProvider>")]
    OutsideProvider,
}

/// Snapshot of the in-memory session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<Credential>,
    pub user: Option<User>,
    /// True until the first restore from storage has happened.
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            token: None,
            user: None,
            is_loading: true,
        }
    }
}

impl SessionState {
    /// A credential alone is never enough: the user must be present and admin.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.as_ref().is_some_and(User::is_admin)
    }
}

/// Result of the synchronous start-up read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A persisted credential was adopted; it should be revalidated.
    Restored,
    Anonymous,
}

/// What a [`SessionStore::refresh_session`] call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    NoSession,
    /// Valid, and the server sent no user.
    Confirmed,
    /// Valid, and the cached user was replaced.
    UserUpdated,
    /// The credential changed while validation was in flight.
    Stale,
    /// Invalid, kept under [`InvalidSessionPolicy::Retain`].
    InvalidRetained,
    /// Invalid, cleared under [`InvalidSessionPolicy::Logout`].
    InvalidCleared,
    /// Validation failed; the session was left as it was.
    Unreachable,
}

type Listener = Rc<dyn Fn(&SessionState)>;

#[derive(Default)]
struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Listener)>>,
}

/// Unregisters its listener when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .entries
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct SessionStore<B, A> {
    storage: SessionStorage<B>,
    api: A,
    invalid_policy: InvalidSessionPolicy,
    state: RefCell<SessionState>,
    listeners: Rc<Listeners>,
}

impl<B: StorageBackend, A: SessionApi> SessionStore<B, A> {
    pub fn new(storage: SessionStorage<B>, api: A, invalid_policy: InvalidSessionPolicy) -> Self {
        Self {
            storage,
            api,
            invalid_policy,
            state: RefCell::new(SessionState::default()),
            listeners: Rc::default(),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn storage(&self) -> &SessionStorage<B> {
        &self.storage
    }

    /// Calls `listener` with every new state until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) -> Subscription {
        let id = self.listeners.next_id.get();
        self.listeners.next_id.set(id + 1);
        self.listeners
            .entries
            .borrow_mut()
            .push((id, Rc::new(listener)));

        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Adopts whatever storage holds, without touching the network.
    pub fn restore(&self) -> SessionState {
        let persisted = self.storage.load();
        self.replace_state(SessionState {
            token: persisted.token,
            user: persisted.user,
            is_loading: false,
        })
    }

    /// First-mount read.
    pub fn initialize(&self) -> InitOutcome {
        let state = self.restore();
        if state.token.is_some() {
            debug!(authenticated = state.is_authenticated(), "restored persisted session");
            InitOutcome::Restored
        } else {
            debug!("no persisted session");
            InitOutcome::Anonymous
        }
    }

    /// Commits a new session to storage and memory together.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyCredential`] or
    /// [`SessionError::MissingUser`] for blank input, and
    /// [`SessionError::Storage`] when persisting fails. In every error case
    /// neither memory nor storage has changed.
    pub fn login(&self, credential: Credential, user: User) -> Result<(), SessionError> {
        if credential.as_str().trim().is_empty() {
            return Err(SessionError::EmptyCredential);
        }
        if user.id.trim().is_empty() {
            return Err(SessionError::MissingUser);
        }

        self.storage.save(&credential, &user)?;
        info!(user_id = %user.id, admin = user.is_admin(), "session created");
        self.replace_state(SessionState {
            token: Some(credential),
            user: Some(user),
            is_loading: false,
        });

        Ok(())
    }

    /// Exchanges credentials with the backend, then commits the session.
    /// Non-admin accounts are refused before anything is stored.
    ///
    /// # Errors
    /// [`SessionError::Remote`] when authentication fails,
    /// [`SessionError::NotAdmin`] for non-admin accounts, or any error from
    /// [`Self::login`].
    pub async fn sign_in(&self, request: &LoginRequest) -> Result<User, SessionError> {
        let response = self.api.authenticate(request).await?;
        if !response.user.is_admin() {
            warn!(user_id = %response.user.id, "refusing non-admin sign-in");
            return Err(SessionError::NotAdmin);
        }

        let user = response.user.clone();
        self.login(response.token, response.user)?;
        Ok(user)
    }

    /// Clears the local session, then invalidates it remotely. The local
    /// outcome does not depend on the remote call.
    pub async fn logout(&self) {
        let credential = self.clear_local();

        let Some(credential) = credential else {
            return;
        };
        match self.api.logout(&credential).await {
            Ok(()) => debug!("remote session invalidated"),
            Err(err) => warn!(error = %err, "remote logout failed; local session already cleared"),
        }
    }

    /// Re-reads storage as the optimistic state, then validates it remotely.
    pub async fn refresh_session(&self) -> RefreshOutcome {
        let state = self.restore();
        let Some(credential) = state.token else {
            return RefreshOutcome::NoSession;
        };

        let response = match self.api.validate(&credential).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "session validation failed; keeping current session");
                return RefreshOutcome::Unreachable;
            }
        };

        if !self.is_current(&credential) {
            debug!("credential changed during validation; discarding result");
            return RefreshOutcome::Stale;
        }

        if !response.valid {
            return match self.invalid_policy {
                InvalidSessionPolicy::Retain => {
                    warn!("server reports the session invalid; retaining it by policy");
                    RefreshOutcome::InvalidRetained
                }
                InvalidSessionPolicy::Logout => {
                    info!("server reports the session invalid; clearing it");
                    self.clear_local();
                    RefreshOutcome::InvalidCleared
                }
            };
        }

        let Some(user) = response.user else {
            return RefreshOutcome::Confirmed;
        };

        if let Err(err) = self.storage.save_user(&user) {
            warn!(error = %err, "failed to persist refreshed user");
        }
        let mut next = self.snapshot();
        next.user = Some(user);
        self.replace_state(next);

        RefreshOutcome::UserUpdated
    }

    /// Whether the current location should give way to the login surface.
    ///
    /// Falls back to storage when memory says no, so the window between boot
    /// and restore does not bounce an admin to the login page.
    pub fn should_redirect(&self) -> bool {
        let state = self.state.borrow();
        if state.is_loading || state.is_authenticated() {
            return false;
        }
        drop(state);

        !self.storage.load().is_authenticated()
    }

    /// Route-change check: navigate to the login surface? Never while the
    /// current location already is it.
    pub fn redirect_to_login(&self, on_login: bool) -> bool {
        !on_login && self.should_redirect()
    }

    fn is_current(&self, credential: &Credential) -> bool {
        self.state.borrow().token.as_ref() == Some(credential)
    }

    fn clear_local(&self) -> Option<Credential> {
        let previous = self.state.borrow().token.clone();
        self.storage.clear();
        self.replace_state(SessionState {
            token: None,
            user: None,
            is_loading: false,
        });
        previous
    }

    fn replace_state(&self, next: SessionState) -> SessionState {
        let changed = {
            let mut state = self.state.borrow_mut();
            let changed = *state != next;
            *state = next.clone();
            changed
        };

        if changed {
            self.notify(&next);
        }
        next
    }

    fn notify(&self, state: &SessionState) {
        let listeners: Vec<Listener> = self
            .listeners
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            listener(state);
        }
    }
}
