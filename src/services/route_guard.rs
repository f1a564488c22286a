//! 门户路由守卫
//!
//! 每个角色只能访问自己前缀下的路由：
//! - 未登录访问受保护路由 → 跳转 `/`
//! - 角色不匹配 → 跳转到自己的落地页

use crate::models::{AuthUser, Role};

/// 不需要登录的路由
const PUBLIC_ROUTES: [&str; 4] = ["/", "/login", "/register", "/forgot-password"];

/// 路由判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// 路由所属的角色，非门户路由返回 `None`
pub fn required_role(path: &str) -> Option<Role> {
    Role::ALL.into_iter().find(|role| {
        let prefix = role.route_prefix();
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// 判断当前用户能否访问 `path`
pub fn guard(path: &str, user: Option<&AuthUser>) -> RouteDecision {
    if PUBLIC_ROUTES.contains(&path) {
        return RouteDecision::Allow;
    }

    let Some(required) = required_role(path) else {
        return match user {
            Some(_) => RouteDecision::Allow,
            None => RouteDecision::Redirect("/".to_string()),
        };
    };

    match user {
        None => RouteDecision::Redirect("/".to_string()),
        Some(user) if user.role == required => RouteDecision::Allow,
        Some(user) => RouteDecision::Redirect(user.role.landing_route()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: 1,
            name: "Test".to_string(),
            email: None,
            role,
        }
    }

    #[test]
    fn test_unauthenticated_goes_home() {
        assert_eq!(
            guard("/student/exams", None),
            RouteDecision::Redirect("/".to_string())
        );
        assert_eq!(guard("/login", None), RouteDecision::Allow);
    }

    #[test]
    fn test_wrong_role_goes_to_own_landing() {
        let teacher = user(Role::Teacher);
        assert_eq!(
            guard("/admin/packages", Some(&teacher)),
            RouteDecision::Redirect("/teacher/dashboard".to_string())
        );
        assert_eq!(guard("/teacher/exams/5", Some(&teacher)), RouteDecision::Allow);
    }

    #[test]
    fn test_super_admin_prefix_is_not_admin() {
        assert_eq!(required_role("/super-admin/config"), Some(Role::SuperAdmin));
        assert_eq!(required_role("/admin/config"), Some(Role::Admin));
        assert_eq!(required_role("/administrator"), None);

        let admin = user(Role::Admin);
        assert_eq!(
            guard("/super-admin/config", Some(&admin)),
            RouteDecision::Redirect("/admin/dashboard".to_string())
        );
    }
}
