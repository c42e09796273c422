//! Testbox 统一配置层
//!
//! 所有环境变量读取集中在此模块，业务代码通过结构化配置访问，避免直接 `std::env::var`。
//!
//! - `loader`：env_or、env_optional、env_bool 等辅助函数（进程环境与快照两套）
//! - `schema`：ObservabilityConfig、SandboxEnvConfig
//! - `snapshot`：EnvSnapshot，注入式环境快照
//! - `env_keys`：key 常量（含别名）

pub mod env_keys;
pub mod loader;
pub mod schema;
pub mod snapshot;

pub use loader::{env_bool, env_optional, env_or};
pub use schema::{ObservabilityConfig, SandboxEnvConfig};
pub use snapshot::EnvSnapshot;
