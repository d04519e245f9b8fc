//! Auth gate: decides once on startup whether a stored session exists, then
//! tracks login and logout.
//!
//! The gate is an explicit value handed to the app, pages and API client;
//! nothing reads it from ambient context.
use std::cell::RefCell;
use std::rc::Rc;

use leptos::logging::{log, warn};
use leptos::{create_rw_signal, store_value, RwSignal, SignalGet, SignalSet, SignalWith, StoredValue};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, SessionError};
use crate::models::user::User;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// An authenticated administrator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// Startup, before the stored session has been looked at.
    #[default]
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// What the router should do with a navigation to `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session not decided yet; show a placeholder.
    Wait,
    Render,
    Redirect(&'static str),
}

/// Key-value persistence that survives a page reload.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;

    /// Bearer token attached to API requests.
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).ok().flatten().filter(|t| !t.is_empty())
    }
}

/// `window.localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage(&self) -> Result<web_sys::Storage, ClientError> {
        gloo_utils::window()
            .local_storage()
            .map_err(|_| ClientError::Storage("localStorage is not accessible".into()))?
            .ok_or_else(|| ClientError::Storage("localStorage is not available".into()))
    }
}

impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        self.storage()?
            .get_item(key)
            .map_err(|_| ClientError::Storage(format!("cannot read {key}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|_| ClientError::Storage(format!("cannot write {key}")))
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.storage()?
            .remove_item(key)
            .map_err(|_| ClientError::Storage(format!("cannot remove {key}")))
    }
}

/// In-memory store for tests and server-side rendering. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<Vec<(String, String)>>>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries.borrow_mut().retain(|(k, _)| k != key);
        Ok(())
    }
}

pub struct AuthGate<S: SessionStore> {
    store: S,
    state: AuthState,
}

impl<S: SessionStore> AuthGate<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: AuthState::Loading,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Leaves `Loading` by inspecting the persisted token and user.
    /// Only the first call has an effect.
    pub fn resolve(&mut self) -> &AuthState {
        if self.state != AuthState::Loading {
            return &self.state;
        }
        self.state = match self.load() {
            Ok(Some(session)) if session.user.is_admin() => {
                log!("[AUTH] Restored session for {}", session.user.email);
                AuthState::Authenticated(session)
            }
            Ok(Some(session)) => {
                warn!("[AUTH] Stored session for non-admin {} discarded", session.user.email);
                self.clear();
                AuthState::Unauthenticated
            }
            Ok(None) => AuthState::Unauthenticated,
            Err(err) => {
                warn!("[AUTH] {}", err);
                self.clear();
                AuthState::Unauthenticated
            }
        };
        &self.state
    }

    fn load(&self) -> Result<Option<Session>, ClientError> {
        let token = self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user = self.store.get(USER_KEY)?;
        match (token, user) {
            (Some(token), Some(user)) => {
                let user: User = serde_json::from_str(&user)
                    .map_err(|e| SessionError::Corrupt(e.to_string()))?;
                Ok(Some(Session { token, user }))
            }
            _ => Ok(None),
        }
    }

    /// Accepts a backend-issued token, but only for administrators.
    pub fn login(&mut self, user: User, token: String) -> Result<(), ClientError> {
        if !user.is_admin() {
            warn!("[AUTH] Rejected login for non-admin {}", user.email);
            return Err(SessionError::NotAdmin.into());
        }
        let serialized =
            serde_json::to_string(&user).map_err(|e| ClientError::Storage(e.to_string()))?;
        // The token goes last: a stored token alone would still be sent.
        let persisted = self
            .store
            .set(USER_KEY, &serialized)
            .and_then(|_| self.store.set(TOKEN_KEY, &token));
        if let Err(err) = persisted {
            warn!("[AUTH] Could not persist session: {}", err);
            self.clear();
            return Err(err);
        }
        log!("[AUTH] Logged in as {}", user.email);
        self.state = AuthState::Authenticated(Session { token, user });
        Ok(())
    }

    /// Refreshes the persisted profile, e.g. after a settings change.
    pub fn update_user(&mut self, user: User) -> Result<(), ClientError> {
        if let AuthState::Authenticated(session) = &mut self.state {
            let serialized =
                serde_json::to_string(&user).map_err(|e| ClientError::Storage(e.to_string()))?;
            self.store.set(USER_KEY, &serialized)?;
            session.user = user;
        }
        Ok(())
    }

    pub fn logout(&mut self) {
        self.clear();
        self.state = AuthState::Unauthenticated;
        log!("[AUTH] Logged out");
    }

    fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!("[AUTH] {}", err);
            }
        }
    }

    pub fn guard(&self, path: &str) -> RouteDecision {
        guard(&self.state, path)
    }
}

/// Reactive wrapper the browser app passes to every page.
///
/// `state` mirrors the gate so views re-render on login and logout.
#[derive(Clone, Copy)]
pub struct SessionHandle {
    gate: StoredValue<AuthGate<LocalStorageStore>>,
    state: RwSignal<AuthState>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            gate: store_value(AuthGate::new(LocalStorageStore)),
            state: create_rw_signal(AuthState::Loading),
        }
    }

    /// Tracked read of the current state.
    pub fn state(&self) -> AuthState {
        self.state.get()
    }

    pub fn user(&self) -> Option<User> {
        self.state.with(|state| state.session().map(|s| s.user.clone()))
    }

    pub fn resolve(&self) {
        let state = self
            .gate
            .try_update_value(|gate| gate.resolve().clone())
            .unwrap_or(AuthState::Unauthenticated);
        self.state.set(state);
    }

    pub fn login(&self, user: User, token: String) -> Result<(), ClientError> {
        let result = self
            .gate
            .try_update_value(|gate| gate.login(user, token).map(|_| gate.state().clone()))
            .unwrap_or_else(|| Err(ClientError::Storage("session was disposed".into())))?;
        self.state.set(result);
        Ok(())
    }

    pub fn update_user(&self, user: User) -> Result<(), ClientError> {
        let result = self
            .gate
            .try_update_value(|gate| gate.update_user(user).map(|_| gate.state().clone()))
            .unwrap_or_else(|| Err(ClientError::Storage("session was disposed".into())))?;
        self.state.set(result);
        Ok(())
    }

    pub fn logout(&self) {
        self.gate.update_value(|gate| gate.logout());
        self.state.set(AuthState::Unauthenticated);
    }

    pub fn guard(&self, path: &str) -> RouteDecision {
        self.state.with(|state| guard(state, path))
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps anonymous visitors on the login page and administrators off it.
pub fn guard(state: &AuthState, path: &str) -> RouteDecision {
    let wants_login = path == LOGIN_PATH;
    match state {
        AuthState::Loading => RouteDecision::Wait,
        AuthState::Authenticated(_) if wants_login => RouteDecision::Redirect(HOME_PATH),
        AuthState::Unauthenticated if !wants_login => RouteDecision::Redirect(LOGIN_PATH),
        _ => RouteDecision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: "u1".into(),
            name: "Nadia".into(),
            email: "nadia@shop.test".into(),
            role,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn starts_loading_and_resolves_once() {
        let store = MemoryStore::default();
        let mut gate = AuthGate::new(store.clone());
        assert_eq!(gate.state(), &AuthState::Loading);
        assert_eq!(gate.guard("/products"), RouteDecision::Wait);

        assert_eq!(gate.resolve(), &AuthState::Unauthenticated);

        // A token written after startup does not re-run the decision.
        store.set(TOKEN_KEY, "late").unwrap();
        assert_eq!(gate.resolve(), &AuthState::Unauthenticated);
    }

    #[test]
    fn non_admin_login_is_rejected_and_nothing_is_persisted() {
        let store = MemoryStore::default();
        let mut gate = AuthGate::new(store.clone());
        gate.resolve();

        let err = gate.login(user(Role::Customer), "tok".into()).unwrap_err();
        assert_eq!(err, ClientError::Session(SessionError::NotAdmin));
        assert_eq!(gate.state(), &AuthState::Unauthenticated);
        assert_eq!(store.token(), None);
    }

    /// Memory store that refuses to write one key.
    #[derive(Clone, Default)]
    struct RefusingStore {
        inner: MemoryStore,
        refused: &'static str,
    }

    impl SessionStore for RefusingStore {
        fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
            if key == self.refused {
                return Err(ClientError::Storage(format!("cannot write {key}")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), ClientError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_write_leaves_no_token_behind() {
        for refused in [TOKEN_KEY, USER_KEY] {
            let store = RefusingStore {
                refused,
                ..Default::default()
            };
            let mut gate = AuthGate::new(store.clone());
            gate.resolve();

            let err = gate.login(user(Role::Admin), "tok".into()).unwrap_err();
            assert!(matches!(err, ClientError::Storage(_)));
            assert_eq!(gate.state(), &AuthState::Unauthenticated);
            assert_eq!(store.token(), None);
            assert_eq!(store.get(USER_KEY).unwrap(), None);
        }
    }

    #[test]
    fn login_persists_and_survives_reload() {
        let store = MemoryStore::default();
        let mut gate = AuthGate::new(store.clone());
        gate.resolve();
        gate.login(user(Role::Admin), "tok-1".into()).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok-1"));

        let mut reloaded = AuthGate::new(store);
        let state = reloaded.resolve().clone();
        assert_eq!(state.session().map(|s| s.token.as_str()), Some("tok-1"));
    }

    #[test]
    fn logout_clears_storage_so_reload_is_unauthenticated() {
        let store = MemoryStore::default();
        let mut gate = AuthGate::new(store.clone());
        gate.resolve();
        gate.login(user(Role::Admin), "tok-2".into()).unwrap();
        gate.logout();
        assert_eq!(gate.state(), &AuthState::Unauthenticated);

        let mut reloaded = AuthGate::new(store.clone());
        assert_eq!(reloaded.resolve(), &AuthState::Unauthenticated);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_user_is_treated_as_no_session() {
        let store = MemoryStore::default();
        store.set(TOKEN_KEY, "tok").unwrap();
        store.set(USER_KEY, "{not json").unwrap();

        let mut gate = AuthGate::new(store.clone());
        assert_eq!(gate.resolve(), &AuthState::Unauthenticated);
        assert_eq!(store.token(), None);
    }

    #[test]
    fn guard_redirects_both_ways() {
        let anonymous = AuthState::Unauthenticated;
        assert_eq!(guard(&anonymous, "/orders"), RouteDecision::Redirect(LOGIN_PATH));
        assert_eq!(guard(&anonymous, LOGIN_PATH), RouteDecision::Render);

        let admin = AuthState::Authenticated(Session {
            token: "t".into(),
            user: user(Role::Admin),
        });
        assert_eq!(guard(&admin, LOGIN_PATH), RouteDecision::Redirect(HOME_PATH));
        assert_eq!(guard(&admin, "/orders"), RouteDecision::Render);
    }
}
