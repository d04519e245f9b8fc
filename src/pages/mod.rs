//! One page per resource, plus login, dashboard and settings.
//!
//! Resource pages share one lifecycle: fetch the collection on mount, show it
//! through the data table, save through a modal form (POST for new, PUT for
//! existing) and delete after a confirmation prompt. Every successful write is
//! followed by exactly one re-fetch; nothing is updated optimistically.
pub mod categories;
pub mod dashboard;
pub mod gift_boxes;
pub mod login;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod transactions;
pub mod users;

use std::future::Future;

use leptos::logging::{error, log};
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use crate::client::ApiClient;
use crate::components::alert_banner::{confirm, Alert};
use crate::error::ClientError;
use crate::models::envelope::Deleted;
use crate::models::{check, Resource};
use crate::session::{SessionHandle, SessionStore};
use crate::utils::leptos_owner::set_if_alive;

/// Collection calls the page lifecycle needs.
#[allow(async_fn_in_trait)]
pub trait ResourceApi {
    /// `query` is appended to the collection URL, e.g. `product_id=p1`.
    async fn list<R: Resource>(&self, query: Option<&str>) -> Result<Vec<R>, ClientError>;
    async fn create<R: Resource>(&self, input: &R::Input) -> Result<R, ClientError>;
    async fn update<R: Resource>(&self, id: &str, input: &R::Input) -> Result<R, ClientError>;
    async fn remove<R: Resource>(&self, id: &str) -> Result<Deleted, ClientError>;
}

impl<S: SessionStore + Clone> ResourceApi for ApiClient<S> {
    async fn list<R: Resource>(&self, query: Option<&str>) -> Result<Vec<R>, ClientError> {
        match query {
            Some(query) => ApiClient::list_where::<R>(self, query).await,
            None => ApiClient::list::<R>(self).await,
        }
    }

    async fn create<R: Resource>(&self, input: &R::Input) -> Result<R, ClientError> {
        ApiClient::create::<R>(self, input).await
    }

    async fn update<R: Resource>(&self, id: &str, input: &R::Input) -> Result<R, ClientError> {
        ApiClient::update::<R>(self, id, input).await
    }

    async fn remove<R: Resource>(&self, id: &str) -> Result<Deleted, ClientError> {
        ApiClient::remove::<R>(self, id).await
    }
}

/// POST when `id` is None, PUT otherwise, then one fresh list.
pub async fn save_then_reload<R: Resource, A: ResourceApi>(
    api: &A,
    id: Option<&str>,
    input: &R::Input,
    query: Option<&str>,
) -> Result<Vec<R>, ClientError> {
    check(input).map_err(ClientError::Validation)?;
    match id {
        Some(id) => api.update::<R>(id, input).await?,
        None => api.create::<R>(input).await?,
    };
    api.list::<R>(query).await
}

/// DELETE, then one fresh list.
pub async fn delete_then_reload<R: Resource, A: ResourceApi>(
    api: &A,
    id: &str,
    query: Option<&str>,
) -> Result<Vec<R>, ClientError> {
    api.remove::<R>(id).await?;
    api.list::<R>(query).await
}

/// Which record the edit modal is working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editing {
    Closed,
    New,
    Existing(String),
}

impl Editing {
    pub fn id(&self) -> Option<String> {
        match self {
            Editing::Existing(id) => Some(id.clone()),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        *self != Editing::Closed
    }
}

/// Signals of one resource page.
pub struct PageState<R: 'static> {
    pub rows: RwSignal<Vec<R>>,
    pub loading: RwSignal<bool>,
    pub saving: RwSignal<bool>,
    pub editing: RwSignal<Editing>,
    pub alert: RwSignal<Option<Alert>>,
    /// Filter sent with every list request.
    pub query: RwSignal<Option<String>>,
    session: SessionHandle,
}

impl<R: 'static> Clone for PageState<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: 'static> Copy for PageState<R> {}

impl<R: Resource> PageState<R> {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            rows: create_rw_signal(Vec::new()),
            loading: create_rw_signal(false),
            saving: create_rw_signal(false),
            editing: create_rw_signal(Editing::Closed),
            alert: create_rw_signal(None),
            query: create_rw_signal(None),
            session,
        }
    }

    /// Fetches the collection once the page is mounted in the browser, and
    /// again whenever the query changes.
    pub fn load_on_mount(self, client: ApiClient) {
        create_effect(move |_| {
            self.query.track();
            self.reload(client.clone());
        });
    }

    pub fn reload(self, client: ApiClient) {
        self.loading.set(true);
        let query = self.query.get_untracked();
        spawn_local(async move {
            let result = ResourceApi::list::<R>(&client, query.as_deref()).await;
            set_if_alive(self.loading, false, R::ENDPOINT);
            match result {
                Ok(rows) => {
                    log!("[PAGE] Loaded {} {} rows", rows.len(), R::LABEL);
                    set_if_alive(self.rows, rows, R::ENDPOINT);
                }
                Err(err) => self.fail(err),
            }
        });
    }

    /// Reports a failed operation. A rejected token ends the session.
    pub fn fail(self, err: ClientError) {
        error!("[PAGE] {} operation failed: {}", R::LABEL, err);
        if err.is_unauthorized() {
            self.session.logout();
        }
        set_if_alive(self.alert, Some(Alert::from(&err)), R::ENDPOINT);
    }

    pub fn notify(self, message: impl Into<String>) {
        set_if_alive(self.alert, Some(Alert::success(message)), R::ENDPOINT);
    }

    pub fn open_new(self) {
        self.alert.set(None);
        self.editing.set(Editing::New);
    }

    pub fn open_existing(self, id: &str) {
        self.alert.set(None);
        self.editing.set(Editing::Existing(id.to_string()));
    }

    pub fn close(self) {
        self.editing.set(Editing::Closed);
    }

    /// Record being edited, if it is still in the loaded list.
    pub fn current(self) -> Option<R> {
        let id = self.editing.with(Editing::id)?;
        self.rows
            .with(|rows| rows.iter().find(|row| row.id() == id).cloned())
    }

    /// Runs `prepare` (e.g. image uploads), then saves and reloads.
    pub fn save<F>(self, client: ApiClient, prepare: F)
    where
        F: Future<Output = Result<R::Input, ClientError>> + 'static,
    {
        let id = self.editing.get_untracked().id();
        let query = self.query.get_untracked();
        self.saving.set(true);
        spawn_local(async move {
            let result = match prepare.await {
                Ok(input) => {
                    save_then_reload::<R, _>(&client, id.as_deref(), &input, query.as_deref()).await
                }
                Err(err) => Err(err),
            };
            set_if_alive(self.saving, false, R::ENDPOINT);
            match result {
                Ok(rows) => {
                    set_if_alive(self.rows, rows, R::ENDPOINT);
                    set_if_alive(self.editing, Editing::Closed, R::ENDPOINT);
                    let verb = if id.is_some() { "updated" } else { "created" };
                    self.notify(format!("{} {}", capitalize(R::LABEL), verb));
                }
                Err(err) => self.fail(err),
            }
        });
    }

    /// Asks for confirmation, deletes, then reloads once.
    pub fn delete(self, client: ApiClient, id: String) {
        if !confirm(&format!("Delete this {}?", R::LABEL)) {
            return;
        }
        let query = self.query.get_untracked();
        spawn_local(async move {
            match delete_then_reload::<R, _>(&client, &id, query.as_deref()).await {
                Ok(rows) => {
                    set_if_alive(self.rows, rows, R::ENDPOINT);
                    self.notify(format!("{} deleted", capitalize(R::LABEL)));
                }
                Err(err) => self.fail(err),
            }
        });
    }
}

pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Price with two decimals, as shown in every table.
pub fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// "New category" or "Edit category".
pub fn form_title<R: Resource>(editing: &Editing) -> String {
    match editing {
        Editing::Existing(_) => format!("Edit {}", R::LABEL),
        _ => format!("New {}", R::LABEL),
    }
}

/// Parse failures of form text fields, reported together.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    /// The parsed value, or a placeholder while the problem is recorded.
    pub fn take<T: Default>(&mut self, result: Result<T, String>) -> T {
        result.unwrap_or_else(|problem| {
            self.0.push(problem);
            T::default()
        })
    }

    pub fn finish(self) -> Result<(), ClientError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self.0))
        }
    }
}

/// Small preview cell for image columns.
pub fn thumbnail(src: Option<&str>) -> View {
    match src {
        Some(src) => view! { <img class="thumb-sm" src=src.to_string() alt="" /> }.into_view(),
        None => view! { <span class="muted">"-"</span> }.into_view(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::{Category, CategoryInput};
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    /// In-memory categories endpoint that counts list calls.
    #[derive(Default)]
    struct FakeApi {
        rows: RefCell<Vec<Category>>,
        lists: Cell<usize>,
        next_id: Cell<usize>,
    }

    fn convert<A: serde::Serialize, B: serde::de::DeserializeOwned>(value: &A) -> B {
        serde_json::from_value(serde_json::to_value(value).unwrap()).unwrap()
    }

    impl ResourceApi for FakeApi {
        async fn list<R: Resource>(&self, _query: Option<&str>) -> Result<Vec<R>, ClientError> {
            self.lists.set(self.lists.get() + 1);
            Ok(convert(&*self.rows.borrow()))
        }

        async fn create<R: Resource>(&self, input: &R::Input) -> Result<R, ClientError> {
            let input: CategoryInput = convert(input);
            self.next_id.set(self.next_id.get() + 1);
            let row = Category {
                id: format!("c{}", self.next_id.get()),
                name: input.name,
                image: input.image,
                active: input.active,
                product_count: 0,
            };
            self.rows.borrow_mut().push(row.clone());
            Ok(convert(&row))
        }

        async fn update<R: Resource>(&self, id: &str, input: &R::Input) -> Result<R, ClientError> {
            let input: CategoryInput = convert(input);
            let mut rows = self.rows.borrow_mut();
            let row = rows
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or_else(|| ClientError::Http {
                    status: 404,
                    message: "Category not found".into(),
                })?;
            row.name = input.name;
            Ok(convert(&*row))
        }

        async fn remove<R: Resource>(&self, id: &str) -> Result<Deleted, ClientError> {
            let mut rows = self.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|row| row.id != id);
            if rows.len() == before {
                return Err(ClientError::Http {
                    status: 404,
                    message: "Category not found".into(),
                });
            }
            Ok(Deleted { id: id.to_string() })
        }
    }

    fn input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn delete_refetches_once_and_list_lacks_the_row() {
        let api = FakeApi::default();
        block_on(save_then_reload::<Category, _>(&api, None, &input("Spices"), None)).unwrap();
        block_on(save_then_reload::<Category, _>(&api, None, &input("Teas"), None)).unwrap();
        api.lists.set(0);

        let rows = block_on(delete_then_reload::<Category, _>(&api, "c1", None)).unwrap();

        assert_eq!(api.lists.get(), 1);
        assert!(rows.iter().all(|row| row.id != "c1"));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn failed_delete_does_not_refetch() {
        let api = FakeApi::default();
        let err = block_on(delete_then_reload::<Category, _>(&api, "missing", None)).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(api.lists.get(), 0);
    }

    #[test]
    fn save_posts_new_and_puts_existing() {
        let api = FakeApi::default();
        let rows = block_on(save_then_reload::<Category, _>(&api, None, &input("Spices"), None)).unwrap();
        assert_eq!(rows[0].name, "Spices");

        let rows =
            block_on(save_then_reload::<Category, _>(&api, Some("c1"), &input("Whole spices"), None))
                .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Whole spices");
        assert_eq!(api.lists.get(), 2);
    }

    #[test]
    fn invalid_input_never_reaches_the_api() {
        let api = FakeApi::default();
        let err = block_on(save_then_reload::<Category, _>(&api, None, &input("  "), None)).unwrap_err();
        assert_eq!(err, ClientError::Validation(vec!["Name is required".into()]));
        assert_eq!(api.lists.get(), 0);
        assert!(api.rows.borrow().is_empty());
    }

    #[test]
    fn parse_errors_are_collected() {
        let mut errors = FieldErrors::default();
        assert_eq!(errors.take(Ok::<f64, String>(1.5)), 1.5);
        assert_eq!(errors.take(crate::models::parse_amount("Price", "abc")), 0.0);
        assert_eq!(errors.take(crate::models::parse_count("Stock", "x")), 0);
        let err = errors.finish().unwrap_err();
        assert_eq!(err.to_string(), "Price must be a number, Stock must be a whole number");
        assert!(FieldErrors::default().finish().is_ok());
        assert_eq!(form_title::<Category>(&Editing::New), "New category");
        assert_eq!(capitalize("gift box"), "Gift box");
        assert_eq!(money(3.0), "3.00");
    }
}
