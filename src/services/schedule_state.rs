//! 场次状态计算 - 业务能力层
//!
//! 纯函数：输入场次和当前时间，输出场次阶段、是否已满以及可用操作。
//! 不缓存结果，调用方每次渲染都应重新计算。

use crate::models::ExamSchedule;
use chrono::{DateTime, Utc};

/// 场次所处的时间阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulePhase {
    /// 已结束
    Past,
    /// 进行中
    Ongoing,
    /// 未开始
    Upcoming,
}

/// 场次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleState {
    pub phase: SchedulePhase,
    pub full: bool,
}

impl ScheduleState {
    pub fn is_past(&self) -> bool {
        self.phase == SchedulePhase::Past
    }

    /// 展示用标签，未结束的场次满员时显示 "Full"
    pub fn label(&self) -> &'static str {
        match self.phase {
            SchedulePhase::Past => "Completed",
            _ if self.full => "Full",
            SchedulePhase::Ongoing => "Ongoing",
            SchedulePhase::Upcoming => "Upcoming",
        }
    }
}

/// 当前用户在该场次上可执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScheduleActions {
    pub can_enroll: bool,
    pub can_cancel: bool,
}

pub fn is_past(schedule: &ExamSchedule, now: DateTime<Utc>) -> bool {
    schedule.end_date_time < now
}

pub fn is_ongoing(schedule: &ExamSchedule, now: DateTime<Utc>) -> bool {
    schedule.start_date_time <= now && now <= schedule.end_date_time
}

pub fn is_full(schedule: &ExamSchedule) -> bool {
    schedule.enrolled_count >= schedule.capacity
}

/// 计算场次状态
pub fn derive_state(schedule: &ExamSchedule, now: DateTime<Utc>) -> ScheduleState {
    let phase = if is_past(schedule, now) {
        SchedulePhase::Past
    } else if is_ongoing(schedule, now) {
        SchedulePhase::Ongoing
    } else {
        SchedulePhase::Upcoming
    };

    ScheduleState {
        phase,
        full: is_full(schedule),
    }
}

/// 计算可用操作
///
/// - 报名：未结束、未满、未报名
/// - 取消：已报名、未结束
pub fn available_actions(
    schedule: &ExamSchedule,
    now: DateTime<Utc>,
    is_enrolled: bool,
) -> ScheduleActions {
    let past = is_past(schedule, now);
    ScheduleActions {
        can_enroll: !past && !is_full(schedule) && !is_enrolled,
        can_cancel: is_enrolled && !past,
    }
}
