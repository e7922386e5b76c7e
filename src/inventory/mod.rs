pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use dto::{DeviceForm, FORM_FIELDS};
pub use filter::InventoryFilter;
pub use handlers::{detail_rows, DeviceEditor, FormMode, InventoryView};
pub use repo_types::Device;
pub use services::InventoryError;
