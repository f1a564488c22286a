//! # Edu Portal Client
//!
//! 多角色教学平台（考试报名、套餐购买）的 Rust 客户端
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端和登录会话，只暴露能力
//! - `ApiClient` - 附带 Bearer 令牌发送请求，统一解包响应信封
//! - `AuthSession` - 唯一的会话来源，显式注入到需要的地方
//!
//! ### ② 数据源层（DataSource）
//! - `datasource/` - 全部远程操作的 trait，启动时按配置选择一次
//! - `LiveDataSource` - 真实后端
//! - `MockDataSource` - 内存演示数据
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 纯函数推导与校验
//! - `schedule_state` - 场次状态与可执行操作
//! - `package_access` - 套餐状态、目录划分、购物车金额
//! - `validation` - 表单校验
//! - `route_guard` - 按角色的路由守卫
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 一个页面的完整流程
//! - `ExamWorkflow` - 加载 → 报名 / 取消 → 重新加载
//! - `PurchaseFlow` - 加载 → 下单 / 支付 → 重新加载
//! - `AdminConsole` - 校验 → 增删改（删除前确认）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 应用生命周期与按角色调度
//!
//! ## 模块结构

pub mod config;
pub mod datasource;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, DataSourceMode};
pub use datasource::{build_data_source, DataSource, LiveDataSource, MockDataSource};
pub use error::{AppError, AppResult};
pub use infrastructure::{ApiClient, AuthSession};
pub use orchestrator::{App, RunStats};
pub use workflow::{ActionOutcome, AdminConsole, ExamCtx, ExamWorkflow, PurchaseFlow};
