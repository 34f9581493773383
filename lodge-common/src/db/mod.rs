//! Database access: pool and schema bootstrap, row models, settings

pub mod init;
pub mod models;
pub mod settings;

pub use init::*;
pub use models::*;
pub use settings::*;
