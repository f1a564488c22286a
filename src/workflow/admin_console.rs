//! 管理端维护流程 - 流程层
//!
//! 考试、场次、套餐、学生、课程、下拉主数据和平台配置的增删改，
//! 以及考试表单的下拉选项和场次报名名单。
//! 每次提交先做表单校验，校验不通过时不发请求；删除前需要确认。

use crate::datasource::DataSource;
use crate::error::{AppResult, ValidationError};
use crate::models::{
    Course, CourseInput, Enrollment, Exam, ExamInput, ExamSchedule, MasterDataItem,
    MasterDataKind, Package, PackageInput, PlatformConfig, ScheduleInput, Student, StudentInput,
};
use crate::services::validation;
use crate::services::{Confirmer, Notice, Notifier};
use crate::workflow::outcome::ActionOutcome;
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 考试表单的下拉选项
#[derive(Debug, Clone, Default)]
pub struct ExamFormOptions {
    pub options: HashMap<MasterDataKind, Vec<MasterDataItem>>,
    /// 加载失败的下拉类型及提示信息，对应下拉框为空
    pub failures: Vec<(MasterDataKind, String)>,
}

impl ExamFormOptions {
    pub fn items(&self, kind: MasterDataKind) -> &[MasterDataItem] {
        self.options.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

/// 管理端维护流程
pub struct AdminConsole {
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
}

impl AdminConsole {
    pub fn new(
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            source,
            notifier,
            confirmer,
        }
    }

    /// 创建（`exam_id` 为空）或编辑考试
    pub async fn save_exam(&self, exam_id: Option<i64>, input: &ExamInput) -> ActionOutcome<Exam> {
        let call = async {
            match exam_id {
                Some(id) => self.source.update_exam(id, input).await,
                None => self.source.create_exam(input).await,
            }
        };
        self.submit("保存考试", validation::validate_exam(input), call)
            .await
    }

    /// 软删除考试
    pub async fn delete_exam(&self, exam_id: i64) -> ActionOutcome {
        self.remove(
            format!("确定要删除考试 #{} 吗？", exam_id),
            "删除考试",
            self.source.delete_exam(exam_id),
        )
        .await
    }

    pub async fn create_schedule(
        &self,
        exam_id: i64,
        input: &ScheduleInput,
    ) -> ActionOutcome<ExamSchedule> {
        self.submit(
            "创建场次",
            validation::validate_schedule(input),
            self.source.create_schedule(exam_id, input),
        )
        .await
    }

    pub async fn save_package(
        &self,
        package_id: Option<i64>,
        input: &PackageInput,
    ) -> ActionOutcome<Package> {
        let call = async {
            match package_id {
                Some(id) => self.source.update_package(id, input).await,
                None => self.source.create_package(input).await,
            }
        };
        self.submit("保存套餐", validation::validate_package(input), call)
            .await
    }

    pub async fn delete_package(&self, package_id: i64) -> ActionOutcome {
        self.remove(
            format!("确定要删除套餐 #{} 吗？", package_id),
            "删除套餐",
            self.source.delete_package(package_id),
        )
        .await
    }

    pub async fn save_student(
        &self,
        student_id: Option<i64>,
        input: &StudentInput,
    ) -> ActionOutcome<Student> {
        let call = async {
            match student_id {
                Some(id) => self.source.update_student(id, input).await,
                None => self.source.create_student(input).await,
            }
        };
        self.submit("保存学生", validation::validate_student(input), call)
            .await
    }

    pub async fn delete_student(&self, student_id: i64) -> ActionOutcome {
        self.remove(
            format!("确定要删除学生 #{} 吗？", student_id),
            "删除学生",
            self.source.delete_student(student_id),
        )
        .await
    }

    pub async fn save_course(
        &self,
        course_id: Option<i64>,
        input: &CourseInput,
    ) -> ActionOutcome<Course> {
        let call = async {
            match course_id {
                Some(id) => self.source.update_course(id, input).await,
                None => self.source.create_course(input).await,
            }
        };
        self.submit("保存课程", validation::validate_course(input), call)
            .await
    }

    pub async fn delete_course(&self, course_id: i64) -> ActionOutcome {
        self.remove(
            format!("确定要删除课程 #{} 吗？", course_id),
            "删除课程",
            self.source.delete_course(course_id),
        )
        .await
    }

    /// 新增下拉选项
    pub async fn add_master_data(
        &self,
        kind: MasterDataKind,
        name: &str,
    ) -> ActionOutcome<MasterDataItem> {
        let mut errors = Vec::new();
        if name.trim().is_empty() {
            errors.push(ValidationError::MissingField("name"));
        }
        self.submit(
            "新增下拉选项",
            errors,
            self.source.create_master_data(kind, name.trim()),
        )
        .await
    }

    /// 并发加载考试表单的全部下拉选项
    ///
    /// 单个下拉加载失败不影响其他下拉，只提示一次。
    pub async fn load_exam_form_options(&self) -> ExamFormOptions {
        let results = join_all(MasterDataKind::ALL.into_iter().map(|kind| async move {
            (kind, self.source.list_master_data(kind).await)
        }))
        .await;

        let mut form = ExamFormOptions::default();
        for (kind, result) in results {
            match result {
                Ok(items) => {
                    form.options.insert(kind, items);
                }
                Err(e) => {
                    warn!("⚠️ 下拉选项 {} 加载失败: {}", kind, e);
                    form.failures.push((kind, e.user_message()));
                }
            }
        }

        if let Some((_, message)) = form.failures.first() {
            self.notifier
                .notify(Notice::warning(format!("部分下拉选项加载失败: {}", message)));
        }
        form
    }

    /// 场次报名名单
    pub async fn schedule_roster(
        &self,
        exam_id: i64,
        schedule_id: i64,
    ) -> ActionOutcome<Vec<Enrollment>> {
        match self.source.schedule_enrollments(exam_id, schedule_id).await {
            Ok(roster) => {
                info!("📋 场次 #{} 报名名单: {} 人", schedule_id, roster.len());
                ActionOutcome::Succeeded(roster)
            }
            Err(e) => {
                error!("❌ 场次 #{} 报名名单加载失败: {}", schedule_id, e);
                let message = e.user_message();
                self.notifier
                    .notify(Notice::error(format!("加载报名名单失败: {}", message)));
                ActionOutcome::Failed(message)
            }
        }
    }

    /// 合并更新平台配置
    pub async fn update_config(&self, patch: &PlatformConfig) -> ActionOutcome<PlatformConfig> {
        self.submit("更新配置", Vec::new(), self.source.update_config(patch))
            .await
    }

    // ========== 内部辅助方法 ==========

    /// 校验通过后才会等待 `call`，因此校验失败时不会发出请求
    async fn submit<T, F>(
        &self,
        action: &str,
        errors: Vec<ValidationError>,
        call: F,
    ) -> ActionOutcome<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if let Err(e) = validation::ensure_valid(errors) {
            warn!("⚠️ {}: {}", action, e);
            let message = e.user_message();
            self.notifier.notify(Notice::warning(message.clone()));
            return ActionOutcome::Failed(message);
        }

        match call.await {
            Ok(value) => {
                info!("✓ {}成功", action);
                self.notifier.notify(Notice::success(format!("{}成功", action)));
                ActionOutcome::Succeeded(value)
            }
            Err(e) => {
                error!("❌ {}失败: {}", action, e);
                let message = e.user_message();
                self.notifier
                    .notify(Notice::error(format!("{}失败: {}", action, message)));
                ActionOutcome::Failed(message)
            }
        }
    }

    async fn remove<F>(&self, prompt: String, action: &str, call: F) -> ActionOutcome
    where
        F: Future<Output = AppResult<()>>,
    {
        if !self.confirmer.confirm(&prompt).await {
            info!("用户放弃{}", action);
            return ActionOutcome::Declined;
        }
        self.submit(action, Vec::new(), call).await
    }
}
