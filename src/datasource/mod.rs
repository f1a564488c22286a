//! 数据源层
//!
//! ## 职责
//!
//! 定义客户端用到的全部远程操作（[`DataSource`]），并提供两种实现：
//!
//! - [`LiveDataSource`] - 通过 REST API 访问真实后端
//! - [`MockDataSource`] - 内存中的演示数据，写操作直接修改内存数据
//!
//! 具体使用哪种由 `Config::data_source` 在启动时决定一次。
//! 真实后端不可用时直接报错，不会悄悄切换到演示数据。

pub mod live;
pub mod mock;

use crate::config::{Config, DataSourceMode};
use crate::error::AppResult;
use crate::infrastructure::{ApiClient, AuthSession};
use crate::models::{
    Course, CourseInput, Enrollment, Exam, ExamInput, ExamSchedule, MasterDataItem,
    MasterDataKind, NewOrder, Order, OrderStats, Package, PackageInput, PaymentUpdate,
    PaymentWebhook, PlatformConfig, ScheduleInput, Student, StudentInput,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub use live::LiveDataSource;
pub use mock::MockDataSource;

/// 客户端可用的全部远程操作
#[async_trait]
pub trait DataSource: Send + Sync {
    /// 当前实现对应的模式
    fn mode(&self) -> DataSourceMode;

    /// 结束会话，本地登录状态总会被清除
    async fn logout(&self) -> AppResult<()>;

    // ---------- 考试 ----------
    async fn list_exams(&self) -> AppResult<Vec<Exam>>;
    async fn get_exam(&self, exam_id: i64) -> AppResult<Exam>;
    async fn create_exam(&self, input: &ExamInput) -> AppResult<Exam>;
    async fn update_exam(&self, exam_id: i64, input: &ExamInput) -> AppResult<Exam>;
    /// 软删除
    async fn delete_exam(&self, exam_id: i64) -> AppResult<()>;

    // ---------- 场次与报名 ----------
    async fn list_schedules(&self, exam_id: i64) -> AppResult<Vec<ExamSchedule>>;
    async fn create_schedule(&self, exam_id: i64, input: &ScheduleInput)
        -> AppResult<ExamSchedule>;
    /// 任何 2xx 都算报名成功；响应体里没有报名记录时返回 `None`
    async fn enroll(&self, exam_id: i64, schedule_id: i64) -> AppResult<Option<Enrollment>>;
    async fn cancel_enrollment(&self, exam_id: i64, schedule_id: i64) -> AppResult<()>;
    /// 当前登录学生的全部报名
    async fn my_enrollments(&self) -> AppResult<Vec<Enrollment>>;
    async fn schedule_enrollments(
        &self,
        exam_id: i64,
        schedule_id: i64,
    ) -> AppResult<Vec<Enrollment>>;

    // ---------- 下拉主数据 ----------
    async fn list_master_data(&self, kind: MasterDataKind) -> AppResult<Vec<MasterDataItem>>;
    async fn create_master_data(&self, kind: MasterDataKind, name: &str)
        -> AppResult<MasterDataItem>;

    // ---------- 套餐 ----------
    async fn list_packages(&self) -> AppResult<Vec<Package>>;
    /// 当前学生已拥有的套餐
    async fn my_packages(&self) -> AppResult<Vec<Package>>;
    async fn create_package(&self, input: &PackageInput) -> AppResult<Package>;
    async fn update_package(&self, package_id: i64, input: &PackageInput) -> AppResult<Package>;
    async fn delete_package(&self, package_id: i64) -> AppResult<()>;

    // ---------- 订单 ----------
    async fn list_orders(&self) -> AppResult<Vec<Order>>;
    async fn create_order(&self, order: &NewOrder) -> AppResult<Order>;
    async fn update_payment(&self, order_id: i64, update: &PaymentUpdate) -> AppResult<Order>;
    async fn payment_webhook(&self, event: &PaymentWebhook) -> AppResult<()>;
    async fn order_stats(&self) -> AppResult<OrderStats>;

    // ---------- 学生 ----------
    async fn list_students(&self) -> AppResult<Vec<Student>>;
    async fn create_student(&self, input: &StudentInput) -> AppResult<Student>;
    async fn update_student(&self, student_id: i64, input: &StudentInput) -> AppResult<Student>;
    async fn delete_student(&self, student_id: i64) -> AppResult<()>;

    // ---------- 课程 ----------
    async fn list_courses(&self) -> AppResult<Vec<Course>>;
    async fn create_course(&self, input: &CourseInput) -> AppResult<Course>;
    async fn update_course(&self, course_id: i64, input: &CourseInput) -> AppResult<Course>;
    async fn delete_course(&self, course_id: i64) -> AppResult<()>;

    // ---------- 平台配置 ----------
    async fn get_config(&self) -> AppResult<PlatformConfig>;
    async fn update_config(&self, patch: &PlatformConfig) -> AppResult<PlatformConfig>;
}

/// 根据配置创建数据源
pub fn build_data_source(
    config: &Config,
    session: Arc<AuthSession>,
) -> AppResult<Arc<dyn DataSource>> {
    match config.data_source {
        DataSourceMode::Live => {
            info!("🌐 使用真实后端: {}", config.api_base_url);
            let client = ApiClient::new(config, session)?;
            Ok(Arc::new(LiveDataSource::new(client)))
        }
        DataSourceMode::Demo => {
            warn!("⚠️ 当前为离线演示模式，所有数据均为模拟数据，不会同步到服务器");
            Ok(Arc::new(MockDataSource::seeded(session)))
        }
    }
}
