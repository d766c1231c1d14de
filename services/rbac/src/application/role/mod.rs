//! 角色用例

pub mod commands;
pub mod handlers;
pub mod query_handlers;

pub use commands::*;
pub use handlers::RoleCommandHandler;
pub use query_handlers::RoleQueryHandler;
