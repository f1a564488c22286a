use serde::{Deserialize, Serialize};
use std::fmt;

/// 平台角色，每个角色对应一个门户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
    Parent,
    Guest,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Teacher,
        Role::Student,
        Role::Parent,
        Role::Guest,
    ];

    /// 门户路径前缀
    pub fn route_prefix(self) -> &'static str {
        match self {
            Role::SuperAdmin => "/super-admin",
            Role::Admin => "/admin",
            Role::Teacher => "/teacher",
            Role::Student => "/student",
            Role::Parent => "/parent",
            Role::Guest => "/guest",
        }
    }

    /// 登录后的默认落地页
    pub fn landing_route(self) -> String {
        format!("{}/dashboard", self.route_prefix())
    }

    /// 是否可以管理考试（创建、编辑、删除）
    pub fn can_manage_exams(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin | Role::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Guest => "guest",
        };
        write!(f, "{}", s)
    }
}

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}
