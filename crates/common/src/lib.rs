//! tessera-common - 分页与重试等通用工具

pub mod retry;
pub mod types;

pub use retry::*;
pub use types::*;
