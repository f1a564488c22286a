//! 管理端维护的其它记录：学生、课程、下拉主数据、平台配置

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

fn default_active() -> bool {
    true
}

/// 学生表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInput {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// 学生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    #[serde(flatten)]
    pub details: StudentInput,
}

/// 课程表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// 课程
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    #[serde(flatten)]
    pub details: CourseInput,
}

/// 考试表单中的下拉主数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasterDataKind {
    Boards,
    Series,
    Classes,
    Blueprints,
    AcademicBoards,
}

impl MasterDataKind {
    pub const ALL: [MasterDataKind; 5] = [
        MasterDataKind::Boards,
        MasterDataKind::Series,
        MasterDataKind::Classes,
        MasterDataKind::Blueprints,
        MasterDataKind::AcademicBoards,
    ];

    /// `/exams/dropdown/{segment}` 中的路径段
    pub fn path_segment(self) -> &'static str {
        match self {
            MasterDataKind::Boards => "boards",
            MasterDataKind::Series => "series",
            MasterDataKind::Classes => "classes",
            MasterDataKind::Blueprints => "blueprints",
            MasterDataKind::AcademicBoards => "academic-boards",
        }
    }
}

impl fmt::Display for MasterDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// 下拉选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDataItem {
    pub id: i64,
    pub name: String,
}

/// 平台配置（后端自由键值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformConfig(pub Map<String, JsonValue>);

impl PlatformConfig {
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// 用 `patch` 中的键覆盖当前配置
    pub fn merge(&mut self, patch: &PlatformConfig) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }
}
