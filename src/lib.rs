// Library exports for reuse by the GUI and CLI binaries
pub mod backend;
pub mod cli;
pub mod config;
pub mod settings;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use backend::{Backend, BackendError, ImageRecord, MattingRequest, RemoveBgClient};
pub use config::AppConfig;
pub use settings::{KeyedSettings, LocalStorage, Settings, SettingsStore};
pub use view::{MattingView, ViewError, ViewState};
