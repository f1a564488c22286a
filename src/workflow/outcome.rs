//! 流程层共用的结果类型

use std::fmt;

/// 一次用户操作的结果
///
/// 失败已经在流程内部记录日志并提示过用户，调用方只需要据此刷新界面。
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome<T = ()> {
    /// 操作成功
    Succeeded(T),
    /// 操作失败（附带已展示给用户的提示）
    Failed(String),
    /// 用户在确认步骤中取消
    Declined,
    /// 所属视图已关闭，结果被丢弃
    Aborted,
}

impl<T> ActionOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded(_))
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            ActionOutcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }
}

/// 加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    Aborted,
}

/// 页面中可以单独失败的数据块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSection {
    Schedules,
    Enrollments,
    Catalog,
    OwnedPackages,
    Orders,
}

impl fmt::Display for LoadSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadSection::Schedules => "场次列表",
            LoadSection::Enrollments => "报名记录",
            LoadSection::Catalog => "套餐目录",
            LoadSection::OwnedPackages => "已购套餐",
            LoadSection::Orders => "订单记录",
        };
        write!(f, "{}", s)
    }
}

/// 部分数据加载失败
///
/// 页面其余部分照常展示，这一块显示错误提示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFailure {
    pub section: LoadSection,
    pub message: String,
}
