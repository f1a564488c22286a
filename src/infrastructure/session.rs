//! 登录会话 - 基础设施层
//!
//! 当前登录用户和 token 只在这里读写，其它模块通过注入的 `AuthSession` 获取，
//! 不直接访问持久化存储。

use crate::error::{AppResult, SessionError};
use crate::models::AuthUser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// 持久化的会话内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: AuthUser,
    pub token: String,
}

/// 登录会话
///
/// 有 `path` 时登录/退出会同步写文件，没有时只保存在内存中。
#[derive(Debug, Default)]
pub struct AuthSession {
    path: Option<PathBuf>,
    current: RwLock<Option<StoredSession>>,
}

impl AuthSession {
    /// 仅内存中的会话
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 从会话文件恢复，文件不存在时视为未登录
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let current = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| SessionError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
            let stored: StoredSession =
                serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
                    path: path.display().to_string(),
                    source,
                })?;
            debug!("恢复登录会话: 用户 #{} ({})", stored.user.id, stored.user.role);
            Some(stored)
        } else {
            None
        };

        Ok(Self {
            path: Some(path),
            current: RwLock::new(current),
        })
    }

    /// 保存登录结果
    pub fn login(&self, user: AuthUser, token: impl Into<String>) -> AppResult<()> {
        let stored = StoredSession {
            user,
            token: token.into(),
        };

        if let Some(path) = &self.path {
            let content = serde_json::to_string_pretty(&stored)?;
            fs::write(path, content).map_err(|source| SessionError::WriteFailed {
                path: path.display().to_string(),
                source,
            })?;
        }

        info!("✓ 用户 #{} 已登录 ({})", stored.user.id, stored.user.role);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(stored);
        Ok(())
    }

    /// 清除会话（退出登录）
    pub fn clear(&self) -> AppResult<()> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;

        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path).map_err(|source| SessionError::WriteFailed {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// 获取当前用户，未登录时返回错误
    pub fn require_user(&self) -> AppResult<AuthUser> {
        self.current_user()
            .ok_or_else(|| SessionError::NotLoggedIn.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn student() -> AuthUser {
        AuthUser {
            id: 1001,
            name: "Asha".to_string(),
            email: Some("asha@example.com".to_string()),
            role: Role::Student,
        }
    }

    #[test]
    fn test_login_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = AuthSession::load(&path).unwrap();
        assert!(!session.is_authenticated());
        session.login(student(), "token-abc").unwrap();

        let restored = AuthSession::load(&path).unwrap();
        assert_eq!(restored.current_user(), Some(student()));
        assert_eq!(restored.token().as_deref(), Some("token-abc"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = AuthSession::load(&path).unwrap();
        session.login(student(), "token-abc").unwrap();
        session.clear().unwrap();

        assert!(!path.exists());
        assert!(matches!(
            session.require_user(),
            Err(crate::error::AppError::Session(SessionError::NotLoggedIn))
        ));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(AuthSession::load(&path).is_err());
    }
}
