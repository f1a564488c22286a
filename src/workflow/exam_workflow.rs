//! 考试报名流程 - 流程层
//!
//! 核心职责：一场考试的详情、场次、报名记录的加载，以及报名 / 取消报名。
//!
//! 一致性约定：
//! 1. 不做乐观更新，每次报名或取消之后无论成功失败都重新拉取场次和报名记录
//! 2. 失败只在这里记录日志并提示用户，不向外抛出
//! 3. 场次或报名记录加载失败时记为部分失败，页面其余部分照常展示
//! 4. 视图关闭（取消令牌被触发）后，进行中的请求结果直接丢弃

use crate::datasource::DataSource;
use crate::error::{AppResult, BusinessError};
use crate::models::{Enrollment, Exam, ExamSchedule};
use crate::services::schedule_state::{self, ScheduleActions, ScheduleState};
use crate::services::{Confirmer, Notice, Notifier};
use crate::workflow::exam_ctx::ExamCtx;
use crate::workflow::outcome::{ActionOutcome, LoadSection, LoadStatus, PartialFailure};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 已加载的数据
#[derive(Debug, Clone, Default)]
pub struct ExamState {
    pub exam: Option<Exam>,
    pub schedules: Vec<ExamSchedule>,
    pub enrollments: Vec<Enrollment>,
    pub partial_failures: Vec<PartialFailure>,
}

/// 场次列表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub schedule: ExamSchedule,
    pub state: ScheduleState,
    pub actions: ScheduleActions,
    pub is_enrolled: bool,
}

/// 渲染用的考试视图
#[derive(Debug, Clone)]
pub struct ExamView {
    pub exam: Option<Exam>,
    pub rows: Vec<ScheduleRow>,
    pub partial_failures: Vec<PartialFailure>,
}

impl ExamView {
    /// 考试标题，缺失时显示占位符
    pub fn title(&self) -> &str {
        self.exam.as_ref().map(|e| e.title()).unwrap_or("-")
    }

    pub fn row(&self, schedule_id: i64) -> Option<&ScheduleRow> {
        self.rows.iter().find(|r| r.schedule.id == schedule_id)
    }
}

/// 考试报名流程
pub struct ExamWorkflow {
    ctx: ExamCtx,
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    token: CancellationToken,
    state: ExamState,
}

impl ExamWorkflow {
    pub fn new(
        ctx: ExamCtx,
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            ctx,
            source,
            notifier,
            confirmer,
            token: CancellationToken::new(),
            state: ExamState::default(),
        }
    }

    /// 绑定到上级生命周期，上级取消时本流程一起取消
    pub fn with_parent_token(mut self, parent: &CancellationToken) -> Self {
        self.token = parent.child_token();
        self
    }

    /// 本流程的取消令牌（视图卸载时调用 `cancel()`）
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> &ExamState {
        &self.state
    }

    /// 加载考试详情、场次和我的报名
    ///
    /// 只有考试详情加载失败才返回错误。
    pub async fn load(&mut self) -> AppResult<LoadStatus> {
        info!("{} 📋 正在加载考试详情...", self.ctx);

        let source = Arc::clone(&self.source);
        let exam_id = self.ctx.exam_id;
        let fetched = self
            .guarded(async move {
                futures::join!(
                    source.get_exam(exam_id),
                    source.list_schedules(exam_id),
                    source.my_enrollments()
                )
            })
            .await;

        let Some((exam, schedules, enrollments)) = fetched else {
            warn!("{} 视图已关闭，丢弃加载结果", self.ctx);
            return Ok(LoadStatus::Aborted);
        };

        let exam = exam.map_err(|e| {
            error!("{} ❌ 考试详情加载失败: {}", self.ctx, e);
            e
        })?;

        self.state.exam = Some(exam);
        self.state.partial_failures.clear();
        self.absorb(schedules, enrollments);

        info!(
            "{} ✓ 加载完成: {} 个场次, {} 条报名记录",
            self.ctx,
            self.state.schedules.len(),
            self.state.enrollments.len()
        );
        Ok(LoadStatus::Loaded)
    }

    /// 重新拉取场次和报名记录
    pub async fn refresh(&mut self) -> LoadStatus {
        let source = Arc::clone(&self.source);
        let exam_id = self.ctx.exam_id;
        let fetched = self
            .guarded(async move {
                futures::join!(source.list_schedules(exam_id), source.my_enrollments())
            })
            .await;

        let Some((schedules, enrollments)) = fetched else {
            warn!("{} 视图已关闭，丢弃刷新结果", self.ctx);
            return LoadStatus::Aborted;
        };

        self.state.partial_failures.clear();
        self.absorb(schedules, enrollments);
        LoadStatus::Loaded
    }

    /// 报名
    ///
    /// 成功与否只看服务端是否返回 2xx。响应体没有报名记录时，
    /// 从重新加载后的报名列表中取该场次的有效报名。
    pub async fn enroll(&mut self, schedule_id: i64) -> ActionOutcome<Option<Enrollment>> {
        if self.token.is_cancelled() {
            return ActionOutcome::Aborted;
        }
        if let Err(message) = self.ensure_schedule(schedule_id) {
            return ActionOutcome::Failed(message);
        }

        info!("{} 📝 正在报名场次 #{}...", self.ctx, schedule_id);

        let source = Arc::clone(&self.source);
        let exam_id = self.ctx.exam_id;
        let result = self
            .guarded(async move { source.enroll(exam_id, schedule_id).await })
            .await;

        let outcome = match result {
            None => return ActionOutcome::Aborted,
            Some(Ok(enrollment)) => {
                info!("{} ✓ 报名成功: 场次 #{}", self.ctx, schedule_id);
                self.notifier.notify(Notice::success("报名成功"));
                ActionOutcome::Succeeded(enrollment)
            }
            Some(Err(e)) => {
                error!("{} ❌ 报名场次 #{} 失败: {}", self.ctx, schedule_id, e);
                let message = e.user_message();
                self.notifier
                    .notify(Notice::error(format!("报名失败: {}", message)));
                ActionOutcome::Failed(message)
            }
        };

        if self.refresh().await == LoadStatus::Aborted {
            return ActionOutcome::Aborted;
        }
        match outcome {
            ActionOutcome::Succeeded(None) => ActionOutcome::Succeeded(
                self.state
                    .enrollments
                    .iter()
                    .find(|e| e.schedule_id == schedule_id && e.is_active())
                    .cloned(),
            ),
            other => other,
        }
    }

    /// 取消报名（需要用户确认）
    pub async fn cancel(&mut self, schedule_id: i64) -> ActionOutcome {
        if self.token.is_cancelled() {
            return ActionOutcome::Aborted;
        }
        if let Err(message) = self.ensure_schedule(schedule_id) {
            return ActionOutcome::Failed(message);
        }

        let prompt = format!("确定要取消场次 #{} 的报名吗？", schedule_id);
        let confirmed = match self.guarded(self.confirmer.confirm(&prompt)).await {
            None => return ActionOutcome::Aborted,
            Some(answer) => answer,
        };
        if !confirmed {
            info!("{} 用户放弃取消场次 #{}", self.ctx, schedule_id);
            return ActionOutcome::Declined;
        }

        info!("{} 🗑️ 正在取消场次 #{} 的报名...", self.ctx, schedule_id);

        let source = Arc::clone(&self.source);
        let exam_id = self.ctx.exam_id;
        let result = self
            .guarded(async move { source.cancel_enrollment(exam_id, schedule_id).await })
            .await;

        let outcome = match result {
            None => return ActionOutcome::Aborted,
            Some(Ok(())) => {
                info!("{} ✓ 已取消场次 #{} 的报名", self.ctx, schedule_id);
                self.notifier.notify(Notice::success("已取消报名"));
                ActionOutcome::Succeeded(())
            }
            Some(Err(e)) => {
                error!("{} ❌ 取消场次 #{} 失败: {}", self.ctx, schedule_id, e);
                let message = e.user_message();
                self.notifier
                    .notify(Notice::error(format!("取消报名失败: {}", message)));
                ActionOutcome::Failed(message)
            }
        };

        if self.refresh().await == LoadStatus::Aborted {
            return ActionOutcome::Aborted;
        }
        outcome
    }

    /// 当前用户是否持有该场次的有效报名
    pub fn is_enrolled(&self, schedule_id: i64) -> bool {
        self.state
            .enrollments
            .iter()
            .any(|e| e.schedule_id == schedule_id && e.is_active())
    }

    /// 生成视图，`now` 由调用方在每次渲染时传入
    pub fn view(&self, now: DateTime<Utc>) -> ExamView {
        let rows = self
            .state
            .schedules
            .iter()
            .map(|schedule| {
                let is_enrolled = self.is_enrolled(schedule.id);
                ScheduleRow {
                    schedule: schedule.clone(),
                    state: schedule_state::derive_state(schedule, now),
                    actions: schedule_state::available_actions(schedule, now, is_enrolled),
                    is_enrolled,
                }
            })
            .collect();

        ExamView {
            exam: self.state.exam.clone(),
            rows,
            partial_failures: self.state.partial_failures.clone(),
        }
    }

    /// 本考试中尚未结束的有效报名
    pub fn upcoming_enrollments(&self, now: DateTime<Utc>) -> Vec<Enrollment> {
        self.state
            .enrollments
            .iter()
            .filter(|e| e.exam_id == self.ctx.exam_id && e.is_active())
            .filter(|e| {
                self.state
                    .schedules
                    .iter()
                    .find(|s| s.id == e.schedule_id)
                    .is_some_and(|s| !schedule_state::is_past(s, now))
            })
            .cloned()
            .collect()
    }

    /// 关闭流程，丢弃之后的所有请求结果
    pub fn close(&self) {
        self.token.cancel();
    }

    // ========== 内部辅助方法 ==========

    async fn guarded<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = fut => Some(output),
        }
    }

    /// 场次必须属于当前考试，不满足时直接提示，不发请求
    fn ensure_schedule(&self, schedule_id: i64) -> Result<(), String> {
        if self.state.schedules.iter().any(|s| s.id == schedule_id) {
            return Ok(());
        }
        let err = crate::error::AppError::from(BusinessError::ScheduleNotInExam {
            exam_id: self.ctx.exam_id,
            schedule_id,
        });
        warn!("{} ⚠️ {}", self.ctx, err);
        let message = err.user_message();
        self.notifier.notify(Notice::error(message.clone()));
        Err(message)
    }

    fn absorb(
        &mut self,
        schedules: AppResult<Vec<ExamSchedule>>,
        enrollments: AppResult<Vec<Enrollment>>,
    ) {
        match schedules {
            Ok(schedules) => self.state.schedules = schedules,
            Err(e) => self.record_failure(LoadSection::Schedules, e.user_message(), &e),
        }
        match enrollments {
            Ok(enrollments) => self.state.enrollments = enrollments,
            Err(e) => self.record_failure(LoadSection::Enrollments, e.user_message(), &e),
        }
    }

    fn record_failure(
        &mut self,
        section: LoadSection,
        message: String,
        err: &crate::error::AppError,
    ) {
        warn!("{} ⚠️ {}加载失败: {}", self.ctx, section, err);
        self.state
            .partial_failures
            .push(PartialFailure { section, message });
    }
}

impl Drop for ExamWorkflow {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
