//! Client-side session gate.
//!
//! [`store::SessionStore`] owns the session and its persistence,
//! [`revalidate`] keeps it fresh in the background, and [`provider`] exposes
//! it to components through [`provider::use_session`].

pub mod client;
pub mod provider;
pub mod revalidate;
pub mod storage;
pub mod store;

pub use client::{HttpSessionApi, SessionApi, SessionApiError};
pub use provider::{SessionContext, SessionProvider, use_session_result, use_session};
pub use revalidate::{RevalidationHandle, revalidate_while, revalidation_task};
pub use storage::{
    LocalStorageBackend, MemoryBackend, SessionStorage, StorageBackend, StorageError,
};
pub use store::{
    InitOutcome, RefreshOutcome, SessionError, SessionState, SessionStore, Subscription,
};

/// Store wired to `localStorage` and the HTTP session endpoints.
pub type BrowserSessionStore = SessionStore<LocalStorageBackend, HttpSessionApi>;

#[cfg(test)]
pub(crate) mod test_support;
