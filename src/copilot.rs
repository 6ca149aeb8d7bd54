//! Copilot assistant: canned-response catalog and the visible panel window

pub mod catalog;
pub mod history;

pub use catalog::{AssistantProfile, Catalog, CatalogError, ResponseDefinition};
pub use history::{visible_window, PanelView};
