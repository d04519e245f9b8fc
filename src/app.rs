/// Route composition for the admin dashboard.
/// Every page except login sits behind the session gate and inside the sidebar layout.
use leptos::*;
use leptos_meta::{provide_meta_context, Title};
use leptos_router::{use_navigate, NavigateOptions, Route, Router, Routes, A};

use crate::client::ApiClient;
use crate::components::nav::Nav;
use crate::pages::categories::CategoriesPage;
use crate::pages::dashboard::DashboardPage;
use crate::pages::gift_boxes::GiftBoxesPage;
use crate::pages::login::LoginPage;
use crate::pages::orders::OrdersPage;
use crate::pages::products::ProductsPage;
use crate::pages::reviews::ReviewsPage;
use crate::pages::settings::SettingsPage;
use crate::pages::transactions::TransactionsPage;
use crate::pages::users::UsersPage;
use crate::session::{RouteDecision, SessionHandle, HOME_PATH, LOGIN_PATH};

/// Renders `page` once the gate lets `path` through, redirects otherwise.
#[component]
fn Guarded(
    path: &'static str,
    client: ApiClient,
    session: SessionHandle,
    #[prop(into)] page: ViewFn,
    /// Skip the sidebar layout (login).
    #[prop(optional)]
    bare: bool,
) -> impl IntoView {
    let navigate = use_navigate();
    let decision = create_memo(move |_| session.guard(path));

    create_effect(move |_| {
        if let RouteDecision::Redirect(target) = decision.get() {
            navigate(
                target,
                NavigateOptions {
                    replace: true,
                    ..Default::default()
                },
            );
        }
    });

    move || match decision.get() {
        RouteDecision::Render if bare => page.run(),
        RouteDecision::Render => view! {
            <div class="layout">
                <Nav client=client.clone() session=session />
                <main class="content">{page.run()}</main>
            </div>
        }
        .into_view(),
        RouteDecision::Wait | RouteDecision::Redirect(_) => {
            view! { <div class="splash muted">"Loading..."</div> }.into_view()
        }
    }
}

/// Route view for one page of the dashboard.
fn guarded<F, V>(
    path: &'static str,
    client: &ApiClient,
    session: SessionHandle,
    page: F,
) -> impl Fn() -> View + 'static
where
    F: Fn(ApiClient, SessionHandle) -> V + Clone + 'static,
    V: IntoView + 'static,
{
    let client = client.clone();
    let bare = path == LOGIN_PATH;
    move || {
        let for_page = client.clone();
        let page = page.clone();
        let render = move || page(for_page.clone(), session);
        view! {
            <Guarded path=path client=client.clone() session=session page=render bare=bare />
        }
        .into_view()
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="splash">
            <h2>"Page not found"</h2>
            <A href=HOME_PATH>"Back to the dashboard"</A>
        </div>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    let client = ApiClient::browser();
    let session = SessionHandle::new();

    // Local storage is only readable in the browser, so the gate stays in
    // `Loading` during server rendering.
    create_effect(move |_| session.resolve());

    view! {
        <Title text="StoreDesk" />
        <Router>
            <Routes>
                <Route
                    path=LOGIN_PATH
                    view=guarded(LOGIN_PATH, &client, session, |client, session| {
                        view! { <LoginPage client=client session=session /> }
                    })
                />
                <Route
                    path=HOME_PATH
                    view=guarded(HOME_PATH, &client, session, |client, session| {
                        view! { <DashboardPage client=client session=session /> }
                    })
                />
                <Route
                    path="/orders"
                    view=guarded("/orders", &client, session, |client, session| {
                        view! { <OrdersPage client=client session=session /> }
                    })
                />
                <Route
                    path="/products"
                    view=guarded("/products", &client, session, |client, session| {
                        view! { <ProductsPage client=client session=session /> }
                    })
                />
                <Route
                    path="/categories"
                    view=guarded("/categories", &client, session, |client, session| {
                        view! { <CategoriesPage client=client session=session /> }
                    })
                />
                <Route
                    path="/gift-boxes"
                    view=guarded("/gift-boxes", &client, session, |client, session| {
                        view! { <GiftBoxesPage client=client session=session /> }
                    })
                />
                <Route
                    path="/reviews"
                    view=guarded("/reviews", &client, session, |client, session| {
                        view! { <ReviewsPage client=client session=session /> }
                    })
                />
                <Route
                    path="/users"
                    view=guarded("/users", &client, session, |client, session| {
                        view! { <UsersPage client=client session=session /> }
                    })
                />
                <Route
                    path="/saved"
                    view=guarded("/saved", &client, session, |client, session| {
                        view! { <TransactionsPage client=client session=session /> }
                    })
                />
                <Route
                    path="/settings"
                    view=guarded("/settings", &client, session, |client, session| {
                        view! { <SettingsPage client=client session=session /> }
                    })
                />
                <Route path="/*any" view=NotFound />
            </Routes>
        </Router>
    }
}
