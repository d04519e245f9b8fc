pub mod app;
pub mod client;
pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pages;
pub mod session;
pub mod table;
pub mod upload;
pub mod utils;

#[cfg(feature = "ssr")]
pub mod api;
#[cfg(feature = "ssr")]
pub mod auth;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    utils::panic_hook::init();
    leptos::mount_to_body(app::App);
}
