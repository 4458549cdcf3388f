//! CLI commands implementation

pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod init;
pub mod search;
pub mod users;
pub mod workspaces;

pub use auth::*;
pub use dashboard::*;
pub use documents::*;
pub use init::*;
pub use search::*;
pub use users::*;
pub use workspaces::*;
