//! 权限组用例

pub mod commands;
pub mod handlers;
pub mod query_handlers;

pub use commands::*;
pub use handlers::PermissionGroupCommandHandler;
pub use query_handlers::PermissionGroupQueryHandler;
