use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    routes::{Route, switch},
    session::SessionProvider,
};

/// Root component: the router, then the session gate, then the routes.
#[function_component(App)]
pub fn app() -> Html {
    html! {
        <BrowserRouter>
            <SessionProvider>
                <Switch<Route> render={switch} />
            </SessionProvider>
        </BrowserRouter>
    }
}
