//! 离线演示数据源
//!
//! 所有数据保存在内存中，写操作直接修改这份数据并返回结果，
//! 就像服务端已经处理过一样。服务端会拒绝的操作（名额已满、重复报名、
//! 场次已结束、非法状态流转）这里同样拒绝。

use crate::config::DataSourceMode;
use crate::datasource::DataSource;
use crate::error::{AppError, AppResult, BusinessError};
use crate::infrastructure::AuthSession;
use crate::models::{
    AuthUser, Course, CourseInput, DeliveryType, Enrollment, EnrollmentStatus, Exam, ExamInput,
    ExamSchedule, ExamType, MasterDataItem, MasterDataKind, NewOrder, Order, OrderItem,
    OrderStats, OrderStatus, Package, PackageInput, PackageType, PaymentUpdate, PaymentWebhook,
    PlatformConfig, Role, ScheduleInput, Student, StudentInput,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// 演示模式下默认登录的学生
pub fn demo_user() -> AuthUser {
    AuthUser {
        id: 1001,
        name: "Asha Verma".to_string(),
        email: Some("asha.verma@example.com".to_string()),
        role: Role::Student,
    }
}

/// 内存数据集
#[derive(Debug, Clone, Default)]
pub struct MockDataset {
    pub exams: Vec<Exam>,
    pub schedules: Vec<ExamSchedule>,
    pub enrollments: Vec<Enrollment>,
    pub master_data: HashMap<MasterDataKind, Vec<MasterDataItem>>,
    pub packages: Vec<Package>,
    /// 学生 id → 已拥有的套餐 id
    pub owned_packages: HashMap<i64, Vec<i64>>,
    pub orders: Vec<Order>,
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub config: PlatformConfig,
    next_id: i64,
}

impl MockDataset {
    /// 演示数据，场次时间相对 `now` 生成
    pub fn demo(now: DateTime<Utc>) -> Self {
        let mut data = Self {
            next_id: 10_000,
            ..Default::default()
        };

        data.exams = vec![
            Exam {
                id: 1,
                details: ExamInput {
                    title: "Class 10 Mathematics Mock Test".to_string(),
                    description: Some("Full syllabus mock paper".to_string()),
                    exam_type: ExamType::Mock,
                    delivery_type: DeliveryType::Online,
                    duration: 180,
                    total_marks: 80,
                    negative_marking: true,
                    negative_mark_value: Some(0.25),
                    class_id: Some(10),
                    board_id: Some(1),
                    series_id: None,
                    blueprint_id: Some(1),
                },
                deleted_at: None,
            },
            Exam {
                id: 2,
                details: ExamInput {
                    title: "Physics Diagnostic".to_string(),
                    description: None,
                    exam_type: ExamType::Diagnostic,
                    delivery_type: DeliveryType::Hybrid,
                    duration: 60,
                    total_marks: 40,
                    negative_marking: false,
                    negative_mark_value: None,
                    class_id: Some(10),
                    board_id: None,
                    series_id: None,
                    blueprint_id: None,
                },
                deleted_at: None,
            },
        ];

        let window = |id, exam_id, start: DateTime<Utc>, hours, capacity, enrolled_count| {
            ExamSchedule {
                id,
                exam_id,
                start_date_time: start,
                end_date_time: start + Duration::hours(hours),
                capacity,
                enrolled_count,
            }
        };
        data.schedules = vec![
            window(11, 1, now - Duration::days(3), 3, 50, 42),
            window(12, 1, now - Duration::hours(1), 3, 60, 30),
            window(13, 1, now + Duration::days(2), 3, 100, 57),
            window(14, 1, now + Duration::days(5), 3, 100, 100),
            window(21, 2, now + Duration::days(7), 1, 40, 3),
        ];

        data.enrollments = vec![Enrollment {
            id: 501,
            student_id: demo_user().id,
            exam_id: 1,
            schedule_id: 11,
            status: EnrollmentStatus::Completed,
            enrolled_at: Some(now - Duration::days(10)),
        }];

        let items = |names: &[(i64, &str)]| {
            names
                .iter()
                .map(|(id, name)| MasterDataItem {
                    id: *id,
                    name: name.to_string(),
                })
                .collect::<Vec<_>>()
        };
        data.master_data = HashMap::from([
            (MasterDataKind::Boards, items(&[(1, "CBSE"), (2, "ICSE")])),
            (MasterDataKind::Series, items(&[(1, "Foundation Series")])),
            (
                MasterDataKind::Classes,
                items(&[(9, "Class 9"), (10, "Class 10")]),
            ),
            (MasterDataKind::Blueprints, items(&[(1, "Board Pattern 2026")])),
            (
                MasterDataKind::AcademicBoards,
                items(&[(1, "Central Board"), (2, "State Board")]),
            ),
        ]);

        let package = |id, name: &str, package_type, price, months, assoc: [Option<i64>; 4]| {
            Package {
                id,
                details: PackageInput {
                    name: name.to_string(),
                    package_type,
                    class_id: assoc[0],
                    stream_id: assoc[1],
                    subject_id: assoc[2],
                    chapter_id: assoc[3],
                    price,
                    duration_months: months,
                    is_active: true,
                },
            }
        };
        data.packages = vec![
            package(
                1,
                "Class 10 Complete",
                PackageType::Class,
                2499.0,
                12,
                [Some(10), None, None, None],
            ),
            package(
                2,
                "Class 10 Mathematics",
                PackageType::Subject,
                1499.0,
                12,
                [Some(10), None, Some(3), None],
            ),
            package(
                3,
                "Science Stream",
                PackageType::Stream,
                3999.0,
                12,
                [None, Some(1), None, None],
            ),
            package(
                4,
                "Board Exam Test Series",
                PackageType::TestSeries,
                1999.0,
                6,
                [None, None, None, None],
            ),
            package(
                7,
                "Trigonometry",
                PackageType::Chapter,
                2999.0,
                3,
                [Some(10), None, Some(3), Some(7)],
            ),
        ];
        let mut retired = package(
            5,
            "Legacy Crash Course",
            PackageType::Class,
            999.0,
            1,
            [Some(9), None, None, None],
        );
        retired.details.is_active = false;
        data.packages.push(retired);

        data.owned_packages = HashMap::from([(demo_user().id, vec![2])]);

        let order = |id, status, package_id, price, days_ago| Order {
            id,
            student_id: demo_user().id,
            total_amount: price,
            status,
            items: vec![OrderItem { package_id, price }],
            created_at: Some(now - Duration::days(days_ago)),
        };
        data.orders = vec![
            order(123, OrderStatus::Paid, 2, 1499.0, 30),
            order(124, OrderStatus::Failed, 3, 3999.0, 10),
            order(125, OrderStatus::Pending, 3, 3999.0, 2),
        ];

        data.students = vec![
            Student {
                id: demo_user().id,
                details: StudentInput {
                    name: demo_user().name,
                    email: "asha.verma@example.com".to_string(),
                    class_id: Some(10),
                    is_active: true,
                },
            },
            Student {
                id: 1002,
                details: StudentInput {
                    name: "Rohan Das".to_string(),
                    email: "rohan.das@example.com".to_string(),
                    class_id: Some(9),
                    is_active: true,
                },
            },
        ];

        data.courses = vec![Course {
            id: 1,
            details: CourseInput {
                title: "Foundation Mathematics".to_string(),
                description: Some("Number systems to quadratic equations".to_string()),
                is_active: true,
            },
        }];

        data.config = PlatformConfig(
            json!({ "currency": "INR", "enrollment_open": true })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );

        data
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// 场次结束后把仍处于 ENROLLED 的报名标记为 COMPLETED（模拟服务端）
    fn complete_finished(&mut self, now: DateTime<Utc>) {
        let finished: Vec<i64> = self
            .schedules
            .iter()
            .filter(|s| s.end_date_time < now)
            .map(|s| s.id)
            .collect();

        for enrollment in self.enrollments.iter_mut() {
            if enrollment.is_active() && finished.contains(&enrollment.schedule_id) {
                enrollment.status = EnrollmentStatus::Completed;
            }
        }
    }

    fn apply_payment(&mut self, order_id: i64, status: OrderStatus) -> AppResult<Order> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| AppError::not_found("订单", order_id))?;

        if !order.status.can_transition_to(status) {
            return Err(AppError::illegal_transition("订单", order.status, status));
        }
        order.status = status;
        let order = order.clone();

        // 退款只撤销不再被其他已支付订单覆盖的套餐
        let still_paid: Vec<i64> = self
            .orders
            .iter()
            .filter(|o| {
                o.id != order.id
                    && o.student_id == order.student_id
                    && o.status == OrderStatus::Paid
            })
            .flat_map(|o| o.items.iter().map(|i| i.package_id))
            .collect();

        let owned = self.owned_packages.entry(order.student_id).or_default();
        for item in &order.items {
            match status {
                OrderStatus::Paid if !owned.contains(&item.package_id) => {
                    owned.push(item.package_id)
                }
                OrderStatus::Refunded if !still_paid.contains(&item.package_id) => {
                    owned.retain(|id| *id != item.package_id)
                }
                _ => {}
            }
        }

        Ok(order)
    }
}

/// 内存演示数据源
pub struct MockDataSource {
    data: RwLock<MockDataset>,
    session: Arc<AuthSession>,
}

impl MockDataSource {
    pub fn new(dataset: MockDataset, session: Arc<AuthSession>) -> Self {
        Self {
            data: RwLock::new(dataset),
            session,
        }
    }

    /// 使用演示数据创建
    pub fn seeded(session: Arc<AuthSession>) -> Self {
        Self::new(MockDataset::demo(Utc::now()), session)
    }

    /// 当前数据的快照
    pub async fn snapshot(&self) -> MockDataset {
        self.data.read().await.clone()
    }

    fn current_user(&self) -> AppResult<AuthUser> {
        self.session.require_user()
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    fn mode(&self) -> DataSourceMode {
        DataSourceMode::Demo
    }

    async fn logout(&self) -> AppResult<()> {
        debug!("[演示] 退出登录");
        self.session.clear()
    }

    async fn list_exams(&self) -> AppResult<Vec<Exam>> {
        let data = self.data.read().await;
        Ok(data.exams.iter().filter(|e| !e.is_deleted()).cloned().collect())
    }

    async fn get_exam(&self, exam_id: i64) -> AppResult<Exam> {
        let data = self.data.read().await;
        data.exams
            .iter()
            .find(|e| e.id == exam_id && !e.is_deleted())
            .cloned()
            .ok_or_else(|| AppError::not_found("考试", exam_id))
    }

    async fn create_exam(&self, input: &ExamInput) -> AppResult<Exam> {
        let mut data = self.data.write().await;
        let exam = Exam {
            id: data.next_id(),
            details: input.clone(),
            deleted_at: None,
        };
        data.exams.push(exam.clone());
        Ok(exam)
    }

    async fn update_exam(&self, exam_id: i64, input: &ExamInput) -> AppResult<Exam> {
        let mut data = self.data.write().await;
        let exam = data
            .exams
            .iter_mut()
            .find(|e| e.id == exam_id && !e.is_deleted())
            .ok_or_else(|| AppError::not_found("考试", exam_id))?;
        exam.details = input.clone();
        Ok(exam.clone())
    }

    async fn delete_exam(&self, exam_id: i64) -> AppResult<()> {
        let mut data = self.data.write().await;
        let exam = data
            .exams
            .iter_mut()
            .find(|e| e.id == exam_id && !e.is_deleted())
            .ok_or_else(|| AppError::not_found("考试", exam_id))?;
        exam.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn list_schedules(&self, exam_id: i64) -> AppResult<Vec<ExamSchedule>> {
        let data = self.data.read().await;
        if !data.exams.iter().any(|e| e.id == exam_id && !e.is_deleted()) {
            return Err(AppError::not_found("考试", exam_id));
        }
        Ok(data
            .schedules
            .iter()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn create_schedule(
        &self,
        exam_id: i64,
        input: &ScheduleInput,
    ) -> AppResult<ExamSchedule> {
        let mut data = self.data.write().await;
        if !data.exams.iter().any(|e| e.id == exam_id && !e.is_deleted()) {
            return Err(AppError::not_found("考试", exam_id));
        }
        let schedule = ExamSchedule {
            id: data.next_id(),
            exam_id,
            start_date_time: input.start_date_time,
            end_date_time: input.end_date_time,
            capacity: input.capacity,
            enrolled_count: 0,
        };
        data.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn enroll(&self, exam_id: i64, schedule_id: i64) -> AppResult<Option<Enrollment>> {
        let student_id = self.current_user()?.id;
        let now = Utc::now();
        let mut data = self.data.write().await;

        let schedule = data
            .schedules
            .iter()
            .find(|s| s.id == schedule_id && s.exam_id == exam_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("场次", schedule_id))?;

        if schedule.end_date_time < now {
            return Err(BusinessError::SchedulePast { schedule_id }.into());
        }
        let already = data
            .enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.schedule_id == schedule_id && e.is_active());
        if already {
            return Err(BusinessError::AlreadyEnrolled { schedule_id }.into());
        }
        if schedule.enrolled_count >= schedule.capacity {
            return Err(BusinessError::ScheduleFull { schedule_id }.into());
        }

        let enrollment = Enrollment {
            id: data.next_id(),
            student_id,
            exam_id,
            schedule_id,
            status: EnrollmentStatus::Enrolled,
            enrolled_at: Some(now),
        };
        data.enrollments.push(enrollment.clone());
        if let Some(s) = data.schedules.iter_mut().find(|s| s.id == schedule_id) {
            s.enrolled_count += 1;
        }

        debug!("[演示] 学生 #{} 报名场次 #{}", student_id, schedule_id);
        Ok(Some(enrollment))
    }

    async fn cancel_enrollment(&self, exam_id: i64, schedule_id: i64) -> AppResult<()> {
        let student_id = self.current_user()?.id;
        let now = Utc::now();
        let mut data = self.data.write().await;

        let schedule_ended = data
            .schedules
            .iter()
            .find(|s| s.id == schedule_id && s.exam_id == exam_id)
            .map(|s| s.end_date_time < now)
            .ok_or_else(|| AppError::not_found("场次", schedule_id))?;
        if schedule_ended {
            return Err(BusinessError::SchedulePast { schedule_id }.into());
        }

        let enrollment = data
            .enrollments
            .iter_mut()
            .find(|e| e.student_id == student_id && e.schedule_id == schedule_id && e.is_active())
            .ok_or(BusinessError::NotEnrolled { schedule_id })?;
        if !enrollment
            .status
            .can_transition_to(EnrollmentStatus::Cancelled)
        {
            return Err(AppError::illegal_transition(
                "报名",
                enrollment.status,
                EnrollmentStatus::Cancelled,
            ));
        }
        enrollment.status = EnrollmentStatus::Cancelled;

        if let Some(s) = data.schedules.iter_mut().find(|s| s.id == schedule_id) {
            s.enrolled_count = s.enrolled_count.saturating_sub(1);
        }

        debug!("[演示] 学生 #{} 取消场次 #{}", student_id, schedule_id);
        Ok(())
    }

    async fn my_enrollments(&self) -> AppResult<Vec<Enrollment>> {
        let student_id = self.current_user()?.id;
        let mut data = self.data.write().await;
        data.complete_finished(Utc::now());
        Ok(data
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn schedule_enrollments(
        &self,
        exam_id: i64,
        schedule_id: i64,
    ) -> AppResult<Vec<Enrollment>> {
        let mut data = self.data.write().await;
        data.complete_finished(Utc::now());
        Ok(data
            .enrollments
            .iter()
            .filter(|e| e.exam_id == exam_id && e.schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    async fn list_master_data(&self, kind: MasterDataKind) -> AppResult<Vec<MasterDataItem>> {
        let data = self.data.read().await;
        Ok(data.master_data.get(&kind).cloned().unwrap_or_default())
    }

    async fn create_master_data(
        &self,
        kind: MasterDataKind,
        name: &str,
    ) -> AppResult<MasterDataItem> {
        let mut data = self.data.write().await;
        let item = MasterDataItem {
            id: data.next_id(),
            name: name.to_string(),
        };
        data.master_data.entry(kind).or_default().push(item.clone());
        Ok(item)
    }

    async fn list_packages(&self) -> AppResult<Vec<Package>> {
        Ok(self.data.read().await.packages.clone())
    }

    async fn my_packages(&self) -> AppResult<Vec<Package>> {
        let student_id = self.current_user()?.id;
        let data = self.data.read().await;
        let owned = data
            .owned_packages
            .get(&student_id)
            .cloned()
            .unwrap_or_default();
        Ok(data
            .packages
            .iter()
            .filter(|p| owned.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_package(&self, input: &PackageInput) -> AppResult<Package> {
        let mut data = self.data.write().await;
        let package = Package {
            id: data.next_id(),
            details: input.clone(),
        };
        data.packages.push(package.clone());
        Ok(package)
    }

    async fn update_package(&self, package_id: i64, input: &PackageInput) -> AppResult<Package> {
        let mut data = self.data.write().await;
        let package = data
            .packages
            .iter_mut()
            .find(|p| p.id == package_id)
            .ok_or_else(|| AppError::not_found("套餐", package_id))?;
        package.details = input.clone();
        Ok(package.clone())
    }

    async fn delete_package(&self, package_id: i64) -> AppResult<()> {
        let mut data = self.data.write().await;
        let before = data.packages.len();
        data.packages.retain(|p| p.id != package_id);
        if data.packages.len() == before {
            return Err(AppError::not_found("套餐", package_id));
        }
        Ok(())
    }

    async fn list_orders(&self) -> AppResult<Vec<Order>> {
        let user = self.current_user()?;
        let data = self.data.read().await;
        Ok(data
            .orders
            .iter()
            .filter(|o| user.role != Role::Student || o.student_id == user.id)
            .cloned()
            .collect())
    }

    async fn create_order(&self, order: &NewOrder) -> AppResult<Order> {
        let student_id = self.current_user()?.id;
        let mut data = self.data.write().await;

        let mut items = Vec::with_capacity(order.package_ids.len());
        for package_id in &order.package_ids {
            let package = data
                .packages
                .iter()
                .find(|p| p.id == *package_id)
                .ok_or_else(|| AppError::not_found("套餐", *package_id))?;
            if !package.is_active() {
                return Err(BusinessError::PackageUnavailable {
                    package_id: *package_id,
                }
                .into());
            }
            items.push(OrderItem {
                package_id: package.id,
                price: package.price(),
            });
        }

        let created = Order {
            id: data.next_id(),
            student_id,
            total_amount: items.iter().map(|i| i.price).sum(),
            status: OrderStatus::Pending,
            items,
            created_at: Some(Utc::now()),
        };
        data.orders.push(created.clone());

        debug!("[演示] 创建订单 #{}，金额 {}", created.id, created.total_amount);
        Ok(created)
    }

    async fn update_payment(&self, order_id: i64, update: &PaymentUpdate) -> AppResult<Order> {
        let mut data = self.data.write().await;
        data.apply_payment(order_id, update.status)
    }

    async fn payment_webhook(&self, event: &PaymentWebhook) -> AppResult<()> {
        let mut data = self.data.write().await;
        data.apply_payment(event.order_id, event.status)?;
        Ok(())
    }

    async fn order_stats(&self) -> AppResult<OrderStats> {
        let data = self.data.read().await;
        Ok(OrderStats::from_orders(&data.orders))
    }

    async fn list_students(&self) -> AppResult<Vec<Student>> {
        Ok(self.data.read().await.students.clone())
    }

    async fn create_student(&self, input: &StudentInput) -> AppResult<Student> {
        let mut data = self.data.write().await;
        let student = Student {
            id: data.next_id(),
            details: input.clone(),
        };
        data.students.push(student.clone());
        Ok(student)
    }

    async fn update_student(&self, student_id: i64, input: &StudentInput) -> AppResult<Student> {
        let mut data = self.data.write().await;
        let student = data
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| AppError::not_found("学生", student_id))?;
        student.details = input.clone();
        Ok(student.clone())
    }

    async fn delete_student(&self, student_id: i64) -> AppResult<()> {
        let mut data = self.data.write().await;
        let before = data.students.len();
        data.students.retain(|s| s.id != student_id);
        if data.students.len() == before {
            return Err(AppError::not_found("学生", student_id));
        }
        Ok(())
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        Ok(self.data.read().await.courses.clone())
    }

    async fn create_course(&self, input: &CourseInput) -> AppResult<Course> {
        let mut data = self.data.write().await;
        let course = Course {
            id: data.next_id(),
            details: input.clone(),
        };
        data.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(&self, course_id: i64, input: &CourseInput) -> AppResult<Course> {
        let mut data = self.data.write().await;
        let course = data
            .courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| AppError::not_found("课程", course_id))?;
        course.details = input.clone();
        Ok(course.clone())
    }

    async fn delete_course(&self, course_id: i64) -> AppResult<()> {
        let mut data = self.data.write().await;
        let before = data.courses.len();
        data.courses.retain(|c| c.id != course_id);
        if data.courses.len() == before {
            return Err(AppError::not_found("课程", course_id));
        }
        Ok(())
    }

    async fn get_config(&self) -> AppResult<PlatformConfig> {
        Ok(self.data.read().await.config.clone())
    }

    async fn update_config(&self, patch: &PlatformConfig) -> AppResult<PlatformConfig> {
        let mut data = self.data.write().await;
        data.config.merge(patch);
        Ok(data.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MockDataSource {
        let session = Arc::new(AuthSession::in_memory());
        session.login(demo_user(), "demo-token").unwrap();
        MockDataSource::seeded(session)
    }

    #[tokio::test]
    async fn test_enroll_updates_count_and_rejects_duplicates() {
        let source = source();

        let enrollment = source.enroll(1, 13).await.unwrap().unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);

        let schedules = source.list_schedules(1).await.unwrap();
        let s13 = schedules.iter().find(|s| s.id == 13).unwrap();
        assert_eq!(s13.enrolled_count, 58);

        let err = source.enroll(1, 13).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Business(BusinessError::AlreadyEnrolled { schedule_id: 13 })
        ));
    }

    #[tokio::test]
    async fn test_enroll_rejects_full_and_past_schedules() {
        let source = source();

        assert!(matches!(
            source.enroll(1, 14).await.unwrap_err(),
            AppError::Business(BusinessError::ScheduleFull { .. })
        ));
        assert!(matches!(
            source.enroll(1, 11).await.unwrap_err(),
            AppError::Business(BusinessError::SchedulePast { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_enrollment_is_not_resurrected() {
        let source = source();

        source.enroll(1, 13).await.unwrap();
        source.cancel_enrollment(1, 13).await.unwrap();
        assert!(source.cancel_enrollment(1, 13).await.is_err());

        // 重新报名会生成新的记录，旧记录保持 CANCELLED
        let again = source.enroll(1, 13).await.unwrap().unwrap();
        let mine = source.my_enrollments().await.unwrap();
        let for_13: Vec<_> = mine.iter().filter(|e| e.schedule_id == 13).collect();
        assert_eq!(for_13.len(), 2);
        assert!(for_13
            .iter()
            .any(|e| e.status == EnrollmentStatus::Cancelled && e.id != again.id));
    }

    #[tokio::test]
    async fn test_create_order_uses_catalog_prices() {
        let source = source();

        let order = source
            .create_order(&NewOrder {
                package_ids: vec![4, 7],
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, 4998.0);
        assert_eq!(order.student_id, demo_user().id);
        assert!(source
            .snapshot()
            .await
            .orders
            .iter()
            .any(|o| o.id == order.id));
    }

    #[tokio::test]
    async fn test_payment_grants_and_refund_revokes_access() {
        let source = source();
        let order = source
            .create_order(&NewOrder {
                package_ids: vec![4],
            })
            .await
            .unwrap();

        source
            .update_payment(
                order.id,
                &PaymentUpdate {
                    status: OrderStatus::Paid,
                    payment_reference: Some("pay_001".to_string()),
                },
            )
            .await
            .unwrap();
        let owned: Vec<i64> = source.my_packages().await.unwrap().iter().map(|p| p.id).collect();
        assert!(owned.contains(&4));

        source
            .payment_webhook(&PaymentWebhook {
                order_id: order.id,
                status: OrderStatus::Refunded,
                payment_reference: None,
            })
            .await
            .unwrap();
        let owned: Vec<i64> = source.my_packages().await.unwrap().iter().map(|p| p.id).collect();
        assert!(!owned.contains(&4));
    }

    #[tokio::test]
    async fn test_refund_keeps_package_covered_by_another_paid_order() {
        let source = source();
        let bundle = source
            .create_order(&NewOrder {
                package_ids: vec![4, 7],
            })
            .await
            .unwrap();
        let single = source
            .create_order(&NewOrder {
                package_ids: vec![4],
            })
            .await
            .unwrap();
        for order_id in [bundle.id, single.id] {
            source
                .update_payment(
                    order_id,
                    &PaymentUpdate {
                        status: OrderStatus::Paid,
                        payment_reference: None,
                    },
                )
                .await
                .unwrap();
        }

        source
            .payment_webhook(&PaymentWebhook {
                order_id: bundle.id,
                status: OrderStatus::Refunded,
                payment_reference: None,
            })
            .await
            .unwrap();

        let owned: Vec<i64> = source.my_packages().await.unwrap().iter().map(|p| p.id).collect();
        assert!(owned.contains(&4));
        assert!(!owned.contains(&7));
    }

    #[tokio::test]
    async fn test_schedule_roster_completes_finished_enrollments() {
        let source = source();
        source.enroll(1, 13).await.unwrap();

        let past = source.schedule_enrollments(1, 11).await.unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].status, EnrollmentStatus::Completed);

        let upcoming = source.schedule_enrollments(1, 13).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert!(upcoming[0].is_active());
        assert!(source.schedule_enrollments(2, 13).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_illegal_payment_transition_is_rejected() {
        let source = source();

        let err = source
            .update_payment(
                124,
                &PaymentUpdate {
                    status: OrderStatus::Paid,
                    payment_reference: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Business(BusinessError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleted_exam_is_hidden() {
        let source = source();

        source.delete_exam(2).await.unwrap();

        let exams = source.list_exams().await.unwrap();
        assert!(exams.iter().all(|e| e.id != 2));
        assert!(source.get_exam(2).await.is_err());
        assert!(source.snapshot().await.exams.iter().any(|e| e.id == 2 && e.is_deleted()));
    }

    #[tokio::test]
    async fn test_requires_login_for_student_operations() {
        let source = MockDataSource::seeded(Arc::new(AuthSession::in_memory()));

        assert!(source.my_enrollments().await.is_err());
        assert!(source.list_packages().await.is_ok());
    }
}
