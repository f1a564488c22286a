//! 考试流程上下文
//!
//! 封装"谁在看哪场考试"这一信息，主要用于日志前缀

use std::fmt::Display;

/// 考试流程上下文
#[derive(Debug, Clone)]
pub struct ExamCtx {
    /// 考试ID
    pub exam_id: i64,

    /// 当前用户ID（未登录时为空，仅用于日志显示）
    pub user_id: Option<i64>,
}

impl ExamCtx {
    pub fn new(exam_id: i64, user_id: Option<i64>) -> Self {
        Self { exam_id, user_id }
    }
}

impl Display for ExamCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.user_id {
            Some(user_id) => write!(f, "[考试 #{} 用户 #{}]", self.exam_id, user_id),
            None => write!(f, "[考试 #{}]", self.exam_id),
        }
    }
}
