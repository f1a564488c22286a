//! REST API 客户端 - 基础设施层
//!
//! 唯一持有 HTTP 连接池的地方，只暴露"发请求"的能力：
//! - 自动携带 `Authorization: Bearer <token>`
//! - 统一超时
//! - 拆开 `{ message, data }` / `{ success, data }` 包装
//! - 把非 2xx 响应转换为 [`ApiError`]
//!
//! 不认识考试、订单等业务概念。

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::envelope::{extract_message, unwrap_envelope};
use crate::infrastructure::session::AuthSession;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// REST API 客户端
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<AuthSession>,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config, session: Arc<AuthSession>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let value = self.request(Method::GET, path, None).await?;
        decode(value)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.request(Method::POST, path, Some(body)).await?;
        decode(value)
    }

    /// 不带请求体的 POST（例如报名）
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let value = self.request(Method::POST, path, None).await?;
        decode(value)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.request(Method::PUT, path, Some(body)).await?;
        decode(value)
    }

    /// DELETE，忽略响应体
    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.request(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// 退出登录
    ///
    /// 通知后端是尽力而为的，失败只记日志；本地会话总会被清除。
    /// 由 `LiveDataSource::logout` 调用，何时结束会话见 `App::logout`。
    pub async fn logout(&self) -> AppResult<()> {
        if self.session.is_authenticated() {
            if let Err(e) = self.request(Method::POST, "/auth/logout", None).await {
                warn!("⚠️ 退出登录通知发送失败（已忽略）: {}", e);
            }
        }
        self.session.clear()
    }

    /// 发送请求并返回拆包后的 JSON
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
    ) -> AppResult<JsonValue> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("➡️ {} {}", method, path);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(path, e))?;

        debug!("⬅️ {} {} -> {}", method, path, status);

        let payload = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if status.is_success() => return Err(e.into()),
                Err(_) => JsonValue::String(text),
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized {
                endpoint: path.to_string(),
            }
            .into());
        }

        if !status.is_success() {
            let message = match &payload {
                JsonValue::String(raw) if !raw.is_empty() => Some(raw.clone()),
                other => extract_message(other),
            };
            return Err(ApiError::BadResponse {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        unwrap_envelope(payload).map_err(|rejection| {
            ApiError::Rejected {
                endpoint: path.to_string(),
                message: rejection.message,
            }
            .into()
        })
    }
}

fn decode<T: DeserializeOwned>(value: JsonValue) -> AppResult<T> {
    Ok(serde_json::from_value(value)?)
}

fn transport_error(path: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        ApiError::Timeout {
            endpoint: path.to_string(),
        }
        .into()
    } else {
        ApiError::RequestFailed {
            endpoint: path.to_string(),
            source: err,
        }
        .into()
    }
}
