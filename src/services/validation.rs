//! 表单校验 - 业务能力层
//!
//! 在发起任何网络请求之前检查必填字段和基本约束。
//! 每个 `validate_*` 返回全部错误，方便表单逐项展示；
//! [`ensure_valid`] 把第一个错误转换为 [`AppError`]。

use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{CourseInput, ExamInput, PackageInput, ScheduleInput, StudentInput};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("邮箱正则表达式无效")
    })
}

fn require_text(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::MissingField(field));
    }
}

/// 校验考试表单
pub fn validate_exam(input: &ExamInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "title", &input.title);

    if input.duration == 0 {
        errors.push(ValidationError::InvalidField {
            field: "duration",
            reason: "时长必须大于 0 分钟".to_string(),
        });
    }
    if input.total_marks == 0 {
        errors.push(ValidationError::InvalidField {
            field: "totalMarks",
            reason: "总分必须大于 0".to_string(),
        });
    }
    if input.negative_marking {
        match input.negative_mark_value {
            None => errors.push(ValidationError::MissingField("negativeMarkValue")),
            Some(value) if value <= 0.0 => errors.push(ValidationError::InvalidField {
                field: "negativeMarkValue",
                reason: "倒扣分值必须大于 0".to_string(),
            }),
            Some(_) => {}
        }
    }

    errors
}

/// 校验场次表单
pub fn validate_schedule(input: &ScheduleInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if input.end_date_time <= input.start_date_time {
        errors.push(ValidationError::InvalidTimeWindow);
    }
    if input.capacity == 0 {
        errors.push(ValidationError::InvalidField {
            field: "capacity",
            reason: "名额必须大于 0".to_string(),
        });
    }

    errors
}

/// 校验套餐表单，包括与类型相关的必填关联
pub fn validate_package(input: &PackageInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "name", &input.name);

    if !input.price.is_finite() || input.price < 0.0 {
        errors.push(ValidationError::InvalidField {
            field: "price",
            reason: "价格不能为负数".to_string(),
        });
    }
    if input.duration_months == 0 {
        errors.push(ValidationError::InvalidField {
            field: "duration_months",
            reason: "有效期必须大于 0 个月".to_string(),
        });
    }
    for &field in input.package_type.required_associations() {
        if input.association(field).is_none() {
            errors.push(ValidationError::MissingField(field));
        }
    }

    errors
}

/// 校验学生表单
pub fn validate_student(input: &StudentInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "name", &input.name);

    if input.email.trim().is_empty() {
        errors.push(ValidationError::MissingField("email"));
    } else if !email_pattern().is_match(input.email.trim()) {
        errors.push(ValidationError::InvalidField {
            field: "email",
            reason: format!("邮箱格式不正确: {}", input.email),
        });
    }

    errors
}

/// 校验课程表单
pub fn validate_course(input: &CourseInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "title", &input.title);
    errors
}

/// 校验下单的套餐列表
pub fn validate_order_packages(package_ids: &[i64]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if package_ids.is_empty() {
        errors.push(ValidationError::MissingField("package_ids"));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = package_ids.iter().find(|id| !seen.insert(**id)) {
        errors.push(ValidationError::InvalidField {
            field: "package_ids",
            reason: format!("套餐 {} 重复", dup),
        });
    }

    errors
}

/// 有错误时返回第一个
pub fn ensure_valid(errors: Vec<ValidationError>) -> AppResult<()> {
    match errors.into_iter().next() {
        Some(first) => Err(AppError::Validation(first)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryType, ExamType, PackageType};
    use chrono::{Duration, Utc};

    fn exam_input() -> ExamInput {
        ExamInput {
            title: "Weekly Practice".to_string(),
            description: None,
            exam_type: ExamType::Practice,
            delivery_type: DeliveryType::Online,
            duration: 45,
            total_marks: 50,
            negative_marking: false,
            negative_mark_value: None,
            class_id: None,
            board_id: None,
            series_id: None,
            blueprint_id: None,
        }
    }

    fn package_input(package_type: PackageType) -> PackageInput {
        PackageInput {
            name: "Algebra".to_string(),
            package_type,
            class_id: None,
            stream_id: None,
            subject_id: None,
            chapter_id: None,
            price: 499.0,
            duration_months: 3,
            is_active: true,
        }
    }

    #[test]
    fn test_valid_exam_passes() {
        assert!(validate_exam(&exam_input()).is_empty());
    }

    #[test]
    fn test_negative_marking_requires_value() {
        let mut input = exam_input();
        input.negative_marking = true;
        input.title = "  ".to_string();

        let errors = validate_exam(&input);
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingField("title"),
                ValidationError::MissingField("negativeMarkValue"),
            ]
        );
    }

    #[test]
    fn test_schedule_end_must_follow_start() {
        let start = Utc::now();
        let input = ScheduleInput {
            start_date_time: start,
            end_date_time: start,
            capacity: 20,
        };
        assert_eq!(
            validate_schedule(&input),
            vec![ValidationError::InvalidTimeWindow]
        );

        let ok = ScheduleInput {
            end_date_time: start + Duration::hours(2),
            ..input
        };
        assert!(validate_schedule(&ok).is_empty());
    }

    #[test]
    fn test_package_type_requires_associations() {
        let errors = validate_package(&package_input(PackageType::Chapter));
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingField("class_id"),
                ValidationError::MissingField("subject_id"),
                ValidationError::MissingField("chapter_id"),
            ]
        );

        assert!(validate_package(&package_input(PackageType::TestSeries)).is_empty());

        let mut stream = package_input(PackageType::Stream);
        stream.stream_id = Some(2);
        assert!(validate_package(&stream).is_empty());
    }

    #[test]
    fn test_student_email_format() {
        let input = StudentInput {
            name: "Meera".to_string(),
            email: "meera-at-example".to_string(),
            class_id: None,
            is_active: true,
        };
        assert!(matches!(
            validate_student(&input).as_slice(),
            [ValidationError::InvalidField { field: "email", .. }]
        ));
    }

    #[test]
    fn test_order_packages_rejects_empty_and_duplicates() {
        assert_eq!(
            validate_order_packages(&[]),
            vec![ValidationError::MissingField("package_ids")]
        );
        assert_eq!(validate_order_packages(&[4, 7, 4]).len(), 1);
        assert!(validate_order_packages(&[4, 7]).is_empty());
    }

    #[test]
    fn test_ensure_valid_reports_first_error() {
        let err = ensure_valid(vec![
            ValidationError::InvalidTimeWindow,
            ValidationError::MissingField("title"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::InvalidTimeWindow)
        ));
    }
}
