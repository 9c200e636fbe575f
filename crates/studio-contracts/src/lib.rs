//! Data model shared by the studio engine and front ends: image resources,
//! the product catalog, model registry, session history and the event log.

pub mod catalog;
pub mod events;
pub mod history;
pub mod images;
pub mod models;
pub mod session;
