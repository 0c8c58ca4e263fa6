use shared::models::LoginRequest;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::hooks::use_navigator;

use crate::{
    routes::Route,
    session::{SessionApiError, SessionError, use_session},
};

/// What the form shows for a failed sign-in.
pub fn sign_in_error_message(err: &SessionError) -> String {
    match err {
        SessionError::Remote(SessionApiError::Status(401 | 403)) => {
            "Invalid credentials".to_string()
        }
        SessionError::Remote(SessionApiError::Status(status)) => {
            format!("Login failed: {status}")
        }
        SessionError::Remote(SessionApiError::Transport(_)) => {
            "Unable to connect to server".to_string()
        }
        SessionError::NotAdmin => "This account does not have admin access".to_string(),
        other => format!("Login failed: {other}"),
    }
}

fn bind_input(target: &UseStateHandle<String>) -> Callback<InputEvent> {
    let target = target.clone();
    Callback::from(move |event: InputEvent| {
        if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
            target.set(input.value());
        }
    })
}

#[derive(Properties, PartialEq)]
struct FieldProps {
    id: AttrValue,
    label: AttrValue,
    kind: AttrValue,
    value: String,
    oninput: Callback<InputEvent>,
}

#[function_component(Field)]
fn field(props: &FieldProps) -> Html {
    html! {
        <div class="form-control">
            <label class="label" for={props.id.clone()}>
                <span class="label-text">{ props.label.clone() }</span>
            </label>
            <input
                id={props.id.clone()}
                class="input input-bordered"
                type={props.kind.clone()}
                required=true
                value={props.value.clone()}
                oninput={props.oninput.clone()}
            />
        </div>
    }
}

#[function_component(LoginPage)]
pub fn login_page() -> Html {
    let session = use_session();
    let email = use_state(String::new);
    let password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);
    let navigator = use_navigator();

    let onsubmit = {
        let email_handle = email.clone();
        let password_handle = password.clone();
        let error_handle = error.clone();
        let loading_handle = loading.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let request = LoginRequest {
                email: (*email_handle).clone(),
                password: (*password_handle).clone(),
            };
            loading_handle.set(true);
            error_handle.set(None);

            let session = session.clone();
            let loading_ref = loading_handle.clone();
            let error_ref = error_handle.clone();
            let navigator_handle = navigator.clone();
            spawn_local(async move {
                match session.sign_in(request).await {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id, "signed in");
                        if let Some(ref nav) = navigator_handle {
                            nav.push(&Route::Dashboard);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "sign-in failed");
                        error_ref.set(Some(sign_in_error_message(&err)));
                    }
                }
                loading_ref.set(false);
            });
        })
    };

    let on_email = bind_input(&email);
    let on_password = bind_input(&password);

    let is_busy = *loading;
    let disable_submit = (*email).is_empty() || (*password).is_empty() || is_busy;

    html! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="card w-full max-w-md shadow-lg bg-base-100">
                <form class="card-body" onsubmit={onsubmit}>
                    <h2 class="card-title text-2xl">{"PayDesk admin"}</h2>
                    if let Some(message) = &*error {
                        <div class="alert alert-error">
                            <span>{message.clone()}</span>
                        </div>
                    }
                    <Field id="email" label="Email" kind="email"
                        value={(*email).clone()} oninput={on_email} />
                    <Field id="password" label="Password" kind="password"
                        value={(*password).clone()} oninput={on_password} />
                    <div class="form-control mt-6">
                        <button class="btn btn-primary" type="submit" disabled={disable_submit}>
                            {if is_busy { "Signing in..." } else { "Sign in" }}
                        </button>
                    </div>
                </form>
            </div>
        </div>
    }
}
