pub mod alert_banner;
pub mod data_table;
pub mod form_fields;
pub mod image_picker;
pub mod modal;
pub mod nav;
pub mod status_badge;
