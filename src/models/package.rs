use serde::{Deserialize, Serialize};
use std::fmt;

/// 套餐类型，每个套餐只能属于一种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Class,
    Subject,
    Stream,
    TestSeries,
    Chapter,
}

impl PackageType {
    /// 该类型必须关联的字段
    pub fn required_associations(self) -> &'static [&'static str] {
        match self {
            PackageType::Class => &["class_id"],
            PackageType::Subject => &["class_id", "subject_id"],
            PackageType::Stream => &["stream_id"],
            PackageType::Chapter => &["class_id", "subject_id", "chapter_id"],
            PackageType::TestSeries => &[],
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageType::Class => "class",
            PackageType::Subject => "subject",
            PackageType::Stream => "stream",
            PackageType::TestSeries => "test_series",
            PackageType::Chapter => "chapter",
        };
        write!(f, "{}", s)
    }
}

fn default_active() -> bool {
    true
}

/// 套餐表单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInput {
    pub name: String,
    #[serde(rename = "type")]
    pub package_type: PackageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<i64>,
    pub price: f64,
    pub duration_months: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl PackageInput {
    /// 按字段名取关联 id
    pub fn association(&self, field: &str) -> Option<i64> {
        match field {
            "class_id" => self.class_id,
            "stream_id" => self.stream_id,
            "subject_id" => self.subject_id,
            "chapter_id" => self.chapter_id,
            _ => None,
        }
    }
}

/// 可购买的内容套餐
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    #[serde(flatten)]
    pub details: PackageInput,
}

impl Package {
    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn price(&self) -> f64 {
        self.details.price
    }

    pub fn is_active(&self) -> bool {
        self.details.is_active
    }
}
