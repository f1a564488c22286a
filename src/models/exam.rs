use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 考试类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamType {
    Practice,
    Mock,
    FullTest,
    PartialTest,
    Diagnostic,
}

/// 考试形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Online,
    Offline,
    Hybrid,
}

/// 考试的可编辑字段（创建、编辑表单提交的内容）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub exam_type: ExamType,
    pub delivery_type: DeliveryType,
    /// 时长（分钟）
    pub duration: u32,
    pub total_marks: u32,
    #[serde(default)]
    pub negative_marking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_mark_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint_id: Option<i64>,
}

/// 考试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    #[serde(flatten)]
    pub details: ExamInput,
    /// 软删除时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Exam {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }
}

/// 场次表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub capacity: u32,
}

/// 考试场次
///
/// `enrolled_count` 以服务端为准，客户端只负责展示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSchedule {
    pub id: i64,
    pub exam_id: i64,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub capacity: u32,
    #[serde(default)]
    pub enrolled_count: u32,
}

impl ExamSchedule {
    /// 剩余名额
    pub fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled_count)
    }
}

/// 报名状态
///
/// 只能向前流转：ENROLLED → CANCELLED 或 ENROLLED → COMPLETED。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Enrolled,
    Cancelled,
    Completed,
}

impl EnrollmentStatus {
    pub fn can_transition_to(self, next: EnrollmentStatus) -> bool {
        matches!(
            (self, next),
            (EnrollmentStatus::Enrolled, EnrollmentStatus::Cancelled)
                | (EnrollmentStatus::Enrolled, EnrollmentStatus::Completed)
        )
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnrollmentStatus::Enrolled => "ENROLLED",
            EnrollmentStatus::Cancelled => "CANCELLED",
            EnrollmentStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", s)
    }
}

/// 报名记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub exam_id: i64,
    pub schedule_id: i64,
    pub status: EnrollmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Enrolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enrollment_status_only_moves_forward() {
        use EnrollmentStatus::*;
        assert!(Enrolled.can_transition_to(Cancelled));
        assert!(Enrolled.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Enrolled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Enrolled.can_transition_to(Enrolled));
    }

    #[test]
    fn test_exam_deserializes_backend_shape() {
        let exam: Exam = serde_json::from_value(json!({
            "id": 5,
            "title": "Unit Test 3",
            "type": "FULL_TEST",
            "deliveryType": "ONLINE",
            "duration": 90,
            "totalMarks": 100,
            "negativeMarking": true,
            "negativeMarkValue": 0.25,
            "classId": 10,
            "deletedAt": null
        }))
        .unwrap();

        assert_eq!(exam.details.exam_type, ExamType::FullTest);
        assert_eq!(exam.details.class_id, Some(10));
        assert!(!exam.is_deleted());
    }

    #[test]
    fn test_schedule_seats_left_saturates() {
        let schedule: ExamSchedule = serde_json::from_value(json!({
            "id": 1,
            "examId": 5,
            "startDateTime": "2026-11-01T09:00:00Z",
            "endDateTime": "2026-11-01T11:00:00Z",
            "capacity": 10,
            "enrolledCount": 12
        }))
        .unwrap();

        assert_eq!(schedule.seats_left(), 0);
    }
}
