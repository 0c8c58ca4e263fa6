//! Yew glue: the provider component and the `use_session` hook.

use std::rc::Rc;

use shared::models::{LoginRequest, User};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::prelude::*;

use super::{
    BrowserSessionStore, HttpSessionApi, LocalStorageBackend, SessionStorage,
    revalidate::revalidate_while,
    store::{InitOutcome, SessionError, SessionState, SessionStore},
};
use crate::{config::FrontendConfig, routes::Route};

/// What components see through [`use_session`].
#[derive(Clone)]
pub struct SessionContext {
    store: Rc<BrowserSessionStore>,
    state: SessionState,
}

impl PartialEq for SessionContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store) && self.state == other.state
    }
}

impl SessionContext {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// # Errors
    /// See [`SessionStore::sign_in`].
    pub async fn sign_in(&self, request: LoginRequest) -> Result<User, SessionError> {
        self.store.sign_in(&request).await
    }

    /// Clears the session locally at once; the remote call runs in the
    /// background.
    pub fn logout(&self) {
        let store = Rc::clone(&self.store);
        spawn_local(async move { store.logout().await });
    }
}

fn browser_store(config: &FrontendConfig) -> BrowserSessionStore {
    SessionStore::new(
        SessionStorage::new(LocalStorageBackend, &config.token_key, &config.user_key),
        HttpSessionApi::new(&config.api_base_url),
        config.invalid_session_policy,
    )
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    #[prop_or_default]
    pub children: Children,
}

/// Owns the session store for everything below it. Must sit inside a router.
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let config = use_memo((), |_| FrontendConfig::default());
    let store = {
        let config = Rc::clone(&config);
        use_memo((), move |_| browser_store(&config))
    };
    let state = use_state(|| store.snapshot());
    let navigator = use_navigator();
    let location = use_location();

    {
        let store = Rc::clone(&store);
        let state = state.clone();
        use_effect_with((), move |_| {
            let subscription = store.subscribe(move |next| state.set(next.clone()));
            if store.initialize() == InitOutcome::Restored {
                spawn_local(async move {
                    store.refresh_session().await;
                });
            }
            move || drop(subscription)
        });
    }

    {
        let store = Rc::clone(&store);
        let period = config.revalidate_every;
        let has_credential = state.token.is_some();
        use_effect_with(has_credential, move |has_credential| {
            let handle = revalidate_while(
                *has_credential,
                store,
                period,
                gloo_timers::future::sleep,
                spawn_local,
            );
            move || drop(handle)
        });
    }

    {
        let store = Rc::clone(&store);
        let config = Rc::clone(&config);
        let path = location.map(|location| location.path().to_string());
        use_effect_with(((*state).clone(), path), move |(_, path)| {
            let on_login = path
                .as_deref()
                .is_some_and(|path| config.is_login_path(path));
            if store.redirect_to_login(on_login) {
                if let Some(navigator) = navigator {
                    navigator.push(&Route::Login);
                }
            }
        });
    }

    let context = SessionContext {
        store,
        state: (*state).clone(),
    };

    html! {
        <ContextProvider<SessionContext> {context}>
            { props.children.clone() }
        </ContextProvider<SessionContext>>
    }
}

/// The session context, or [`SessionError::OutsideProvider`] when there is no
/// [`SessionProvider`] above the caller.
#[hook]
pub fn use_session_result() -> Result<SessionContext, SessionError> {
    use_context::<SessionContext>().ok_or(SessionError::OutsideProvider)
}

/// The session context.
///
/// # Panics
/// Panics when called outside a [`SessionProvider`]; that is a wiring bug.
#[hook]
pub fn use_session() -> SessionContext {
    use_session_result().unwrap_or_else(|err| panic!("{err}"))
}
