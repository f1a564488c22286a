//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理应用生命周期（初始化、运行、取消），按当前用户的角色调度各个流程，
//! 并输出全局统计信息。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App
//!     ↓
//! workflow (ExamWorkflow / PurchaseFlow)
//!     ↓
//! services (状态推导 / 校验 / 路由守卫 / 提示)
//!     ↓
//! datasource (LiveDataSource / MockDataSource)
//!     ↓
//! infrastructure (ApiClient / AuthSession)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源所有者**：只有编排层持有数据源和根取消令牌
//! 2. **向下依赖**：编排层 → workflow → services → datasource → infrastructure
//! 3. **无业务逻辑**：只做调度和统计

pub mod app;

pub use app::{App, RunStats};
