//! 真实后端数据源

use crate::config::DataSourceMode;
use crate::datasource::DataSource;
use crate::error::AppResult;
use crate::infrastructure::ApiClient;
use crate::models::{
    Course, CourseInput, Enrollment, Exam, ExamInput, ExamSchedule, MasterDataItem,
    MasterDataKind, NewOrder, Order, OrderStats, Package, PackageInput, PaymentUpdate,
    PaymentWebhook, PlatformConfig, ScheduleInput, Student, StudentInput,
};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

/// 通过 REST API 访问后端
pub struct LiveDataSource {
    client: ApiClient,
}

impl LiveDataSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl DataSource for LiveDataSource {
    fn mode(&self) -> DataSourceMode {
        DataSourceMode::Live
    }

    async fn logout(&self) -> AppResult<()> {
        self.client.logout().await
    }

    async fn list_exams(&self) -> AppResult<Vec<Exam>> {
        self.client.get("/exams").await
    }

    async fn get_exam(&self, exam_id: i64) -> AppResult<Exam> {
        self.client.get(&format!("/exams/{}", exam_id)).await
    }

    async fn create_exam(&self, input: &ExamInput) -> AppResult<Exam> {
        self.client.post("/exams", input).await
    }

    async fn update_exam(&self, exam_id: i64, input: &ExamInput) -> AppResult<Exam> {
        self.client.put(&format!("/exams/{}", exam_id), input).await
    }

    async fn delete_exam(&self, exam_id: i64) -> AppResult<()> {
        self.client.delete(&format!("/exams/{}", exam_id)).await
    }

    async fn list_schedules(&self, exam_id: i64) -> AppResult<Vec<ExamSchedule>> {
        self.client
            .get(&format!("/exams/{}/schedules", exam_id))
            .await
    }

    async fn create_schedule(
        &self,
        exam_id: i64,
        input: &ScheduleInput,
    ) -> AppResult<ExamSchedule> {
        self.client
            .post(&format!("/exams/{}/schedules", exam_id), input)
            .await
    }

    async fn enroll(&self, exam_id: i64, schedule_id: i64) -> AppResult<Option<Enrollment>> {
        let body: JsonValue = self
            .client
            .post_empty(&format!(
                "/exams/{}/schedules/{}/enroll",
                exam_id, schedule_id
            ))
            .await?;
        // 后端可能只返回 {"message": ...} 或空响应，此时报名记录由调用方重新加载获得
        Ok(serde_json::from_value(body).ok())
    }

    async fn cancel_enrollment(&self, exam_id: i64, schedule_id: i64) -> AppResult<()> {
        self.client
            .delete(&format!(
                "/exams/{}/schedules/{}/enroll",
                exam_id, schedule_id
            ))
            .await
    }

    async fn my_enrollments(&self) -> AppResult<Vec<Enrollment>> {
        self.client.get("/exams/my/enrollments").await
    }

    async fn schedule_enrollments(
        &self,
        exam_id: i64,
        schedule_id: i64,
    ) -> AppResult<Vec<Enrollment>> {
        self.client
            .get(&format!(
                "/exams/{}/schedules/{}/enrollments",
                exam_id, schedule_id
            ))
            .await
    }

    async fn list_master_data(&self, kind: MasterDataKind) -> AppResult<Vec<MasterDataItem>> {
        self.client
            .get(&format!("/exams/dropdown/{}", kind.path_segment()))
            .await
    }

    async fn create_master_data(
        &self,
        kind: MasterDataKind,
        name: &str,
    ) -> AppResult<MasterDataItem> {
        self.client
            .post(
                &format!("/exams/dropdown/{}", kind.path_segment()),
                &json!({ "name": name }),
            )
            .await
    }

    async fn list_packages(&self) -> AppResult<Vec<Package>> {
        self.client.get("/packages").await
    }

    async fn my_packages(&self) -> AppResult<Vec<Package>> {
        self.client.get("/packages/my").await
    }

    async fn create_package(&self, input: &PackageInput) -> AppResult<Package> {
        self.client.post("/packages", input).await
    }

    async fn update_package(&self, package_id: i64, input: &PackageInput) -> AppResult<Package> {
        self.client
            .put(&format!("/packages/{}", package_id), input)
            .await
    }

    async fn delete_package(&self, package_id: i64) -> AppResult<()> {
        self.client
            .delete(&format!("/packages/{}", package_id))
            .await
    }

    async fn list_orders(&self) -> AppResult<Vec<Order>> {
        self.client.get("/orders").await
    }

    async fn create_order(&self, order: &NewOrder) -> AppResult<Order> {
        self.client.post("/orders", order).await
    }

    async fn update_payment(&self, order_id: i64, update: &PaymentUpdate) -> AppResult<Order> {
        self.client
            .put(&format!("/orders/{}/payment", order_id), update)
            .await
    }

    async fn payment_webhook(&self, event: &PaymentWebhook) -> AppResult<()> {
        let _: JsonValue = self
            .client
            .post("/orders/webhook/payment", event)
            .await?;
        Ok(())
    }

    async fn order_stats(&self) -> AppResult<OrderStats> {
        self.client.get("/orders/stats/admin").await
    }

    async fn list_students(&self) -> AppResult<Vec<Student>> {
        self.client.get("/students").await
    }

    async fn create_student(&self, input: &StudentInput) -> AppResult<Student> {
        self.client.post("/students", input).await
    }

    async fn update_student(&self, student_id: i64, input: &StudentInput) -> AppResult<Student> {
        self.client
            .put(&format!("/students/{}", student_id), input)
            .await
    }

    async fn delete_student(&self, student_id: i64) -> AppResult<()> {
        self.client
            .delete(&format!("/students/{}", student_id))
            .await
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        self.client.get("/courses").await
    }

    async fn create_course(&self, input: &CourseInput) -> AppResult<Course> {
        self.client.post("/courses", input).await
    }

    async fn update_course(&self, course_id: i64, input: &CourseInput) -> AppResult<Course> {
        self.client
            .put(&format!("/courses/{}", course_id), input)
            .await
    }

    async fn delete_course(&self, course_id: i64) -> AppResult<()> {
        self.client.delete(&format!("/courses/{}", course_id)).await
    }

    async fn get_config(&self) -> AppResult<PlatformConfig> {
        self.client.get("/config").await
    }

    async fn update_config(&self, patch: &PlatformConfig) -> AppResult<PlatformConfig> {
        self.client.put("/config", patch).await
    }
}
