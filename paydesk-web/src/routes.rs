use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    pages::{DashboardPage, LoginPage, NotFoundPage},
    session::use_session,
};

/// The dashboard routes.
#[derive(Debug, Clone, PartialEq, Eq, Routable)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/login")]
    Login,
    #[at("/dashboard")]
    Dashboard,
    #[not_found]
    #[at("/404")]
    NotFound,
}

impl Route {
    /// Whether rendering this route needs an authenticated admin session.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home | Self::Dashboard => "Dashboard",
            Self::Login => "Sign in",
            Self::NotFound => "Not found",
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct RouteViewProps {
    pub route: Route,
}

#[function_component(RouteView)]
fn route_view(props: &RouteViewProps) -> Html {
    let session = use_session();

    if props.route.requires_session() && !session.is_authenticated() {
        // The provider navigates to the login surface once loading settles.
        return html! {};
    }

    match props.route {
        Route::Home => html! { <Redirect<Route> to={Route::Dashboard} /> },
        Route::Login if session.is_authenticated() => {
            html! { <Redirect<Route> to={Route::Dashboard} /> }
        }
        Route::Login => html! { <LoginPage /> },
        Route::Dashboard => html! { <DashboardPage /> },
        Route::NotFound => html! { <NotFoundPage /> },
    }
}

/// Switch function for the dashboard routes.
pub fn switch(route: Route) -> Html {
    tracing::debug!(?route, "switching route");
    html! { <RouteView {route} /> }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::auth::LOGIN_PATH;

    #[test]
    fn paths_resolve_to_routes() {
        assert_eq!(Route::recognize("/"), Some(Route::Home));
        assert_eq!(Route::recognize("/login"), Some(Route::Login));
        assert_eq!(Route::recognize("/dashboard"), Some(Route::Dashboard));
        assert_eq!(Route::recognize("/settings/billing"), Some(Route::NotFound));
    }

    #[test]
    fn login_route_matches_the_shared_login_path() {
        assert_eq!(Route::Login.to_path(), LOGIN_PATH);
    }

    #[test]
    fn only_the_login_route_is_public() {
        assert!(!Route::Login.requires_session());
        assert!(Route::Home.requires_session());
        assert!(Route::Dashboard.requires_session());
        assert!(Route::NotFound.requires_session());
    }

    #[test]
    fn titles() {
        assert_eq!(Route::Home.title(), "Dashboard");
        assert_eq!(Route::Login.title(), "Sign in");
    }
}
