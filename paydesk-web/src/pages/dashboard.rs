use yew::prelude::*;

use crate::{routes::Route, session::use_session};

/// Placeholder dashboard shell shown to signed-in admins.
#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let session = use_session();

    let on_logout = {
        let session = session.clone();
        // The provider sends us to the login page once the state clears.
        Callback::from(move |_: MouseEvent| session.logout())
    };

    let greeting = session
        .user()
        .map(|user| format!("Signed in as {}", user.display_name()))
        .unwrap_or_default();

    html! {
        <div class="p-4 space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-2xl font-bold">{ Route::Dashboard.title() }</h1>
                <button class="btn btn-ghost" onclick={on_logout}>{ "Log out" }</button>
            </div>
            <p class="text-base-content/70">{ greeting }</p>
        </div>
    }
}
