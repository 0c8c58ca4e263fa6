use yew::prelude::*;
use yew_router::prelude::*;

use crate::routes::Route;

#[function_component(NotFoundPage)]
pub fn not_found_page() -> Html {
    html! {
        <div class="p-4 space-y-6">
            <h1 class="text-2xl font-bold">{ Route::NotFound.title() }</h1>
            <p>{ "There is nothing at this address." }</p>
            <Link<Route> to={Route::Dashboard} classes="btn btn-primary">
                { "Back to the dashboard" }
            </Link<Route>>
        </div>
    }
}
