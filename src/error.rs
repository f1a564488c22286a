use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误（网络失败、非 2xx、解析失败）
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 客户端表单校验错误，发生在任何网络请求之前
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 业务规则错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 登录会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 请求超时
    #[error("API请求超时: {endpoint}")]
    Timeout { endpoint: String },
    /// 服务端返回非 2xx 响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 服务端返回 `{ success: false }` 包装
    #[error("API拒绝了请求 ({endpoint}): {message:?}")]
    Rejected {
        endpoint: String,
        message: Option<String>,
    },
    /// 未登录，无法携带 token
    #[error("未登录，无法访问: {endpoint}")]
    Unauthorized { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// 表单校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必填字段为空
    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),
    /// 字段取值不合法
    #[error("字段 {field} 无效: {reason}")]
    InvalidField { field: &'static str, reason: String },
    /// 结束时间不晚于开始时间
    #[error("结束时间必须晚于开始时间")]
    InvalidTimeWindow,
}

/// 业务逻辑错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessError {
    /// 场次不属于当前考试
    #[error("场次 {schedule_id} 不属于考试 {exam_id}")]
    ScheduleNotInExam { exam_id: i64, schedule_id: i64 },
    /// 记录不存在
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// 场次已满
    #[error("场次 {schedule_id} 名额已满")]
    ScheduleFull { schedule_id: i64 },
    /// 场次已结束
    #[error("场次 {schedule_id} 已结束")]
    SchedulePast { schedule_id: i64 },
    /// 重复报名
    #[error("已报名场次 {schedule_id}")]
    AlreadyEnrolled { schedule_id: i64 },
    /// 未报名
    #[error("未报名场次 {schedule_id}")]
    NotEnrolled { schedule_id: i64 },
    /// 非法的状态流转
    #[error("{entity} 状态不能从 {from} 变为 {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    /// 套餐当前不可购买
    #[error("套餐 {package_id} 当前不可购买")]
    PackageUnavailable { package_id: i64 },
}

/// 会话存储错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 当前没有登录用户
    #[error("当前没有登录用户")]
    NotLoggedIn,
    /// 读取会话文件失败
    #[error("读取会话文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入会话文件失败
    #[error("写入会话文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 会话文件内容损坏
    #[error("会话文件内容损坏 ({path}): {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|url| url.path().to_string())
            .unwrap_or_default();
        if err.is_timeout() {
            AppError::Api(ApiError::Timeout { endpoint })
        } else {
            AppError::Api(ApiError::RequestFailed {
                endpoint,
                source: err,
            })
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建记录不存在错误
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        AppError::Business(BusinessError::NotFound { entity, id })
    }

    /// 创建非法状态流转错误
    pub fn illegal_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        AppError::Business(BusinessError::IllegalTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// 面向用户的提示文案
    ///
    /// 服务端给出了 message 时直接展示，否则使用通用失败文案。
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::BadResponse {
                message: Some(msg), ..
            })
            | AppError::Api(ApiError::Rejected {
                message: Some(msg), ..
            }) => msg.clone(),
            AppError::Api(ApiError::Timeout { .. }) => "请求超时，请稍后重试".to_string(),
            AppError::Api(ApiError::Unauthorized { .. })
            | AppError::Session(SessionError::NotLoggedIn) => "请先登录".to_string(),
            AppError::Api(_) => "操作失败，请稍后重试".to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::Business(e) => e.to_string(),
            AppError::Session(_) | AppError::Config(_) => "操作失败，请稍后重试".to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = AppError::Api(ApiError::BadResponse {
            endpoint: "/exams/1/schedules/2/enroll".to_string(),
            status: 409,
            message: Some("Schedule is full".to_string()),
        });
        assert_eq!(err.user_message(), "Schedule is full");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = AppError::Api(ApiError::BadResponse {
            endpoint: "/orders".to_string(),
            status: 500,
            message: None,
        });
        assert_eq!(err.user_message(), "操作失败，请稍后重试");
    }

    #[test]
    fn test_business_error_display() {
        let err = AppError::not_found("考试", 42);
        assert_eq!(err.to_string(), "业务错误: 考试 不存在: 42");
    }
}
