//! 套餐访问状态 - 业务能力层
//!
//! 根据已拥有套餐、套餐目录和订单历史，计算每个套餐对当前学生的状态。
//! 计算结果不落库，每次加载后重新计算。

use crate::models::{Order, OrderStatus, Package};
use serde::Serialize;
use std::fmt;

/// 套餐对当前学生的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageAccess {
    /// 已拥有
    Active,
    /// 有订单引用，状态与该订单一致
    Order(OrderStatus),
    /// 从未购买
    NotPurchased,
}

impl PackageAccess {
    pub fn label(&self) -> &'static str {
        match self {
            PackageAccess::Active => "active",
            PackageAccess::Order(status) => status.as_str(),
            PackageAccess::NotPurchased => "not_purchased",
        }
    }

    /// 是否还能再次下单
    ///
    /// 待支付和已支付的订单会阻止重复购买，失败、已退款的可以重新购买。
    pub fn is_purchasable(&self) -> bool {
        matches!(
            self,
            PackageAccess::NotPurchased
                | PackageAccess::Order(OrderStatus::Failed)
                | PackageAccess::Order(OrderStatus::Refunded)
        )
    }
}

impl fmt::Display for PackageAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 找到决定套餐状态的订单
///
/// 多个订单引用同一套餐时取最新的（按 `created_at`）；
/// 没有时间的订单视为最旧，时间相同时取列表中靠后的。
pub fn latest_order_for(package_id: i64, orders: &[Order]) -> Option<&Order> {
    orders
        .iter()
        .filter(|order| order.references(package_id))
        .max_by_key(|order| order.created_at)
}

/// 计算单个套餐的状态
pub fn access_status(package_id: i64, owned: &[Package], orders: &[Order]) -> PackageAccess {
    if owned.iter().any(|p| p.id == package_id) {
        return PackageAccess::Active;
    }
    match latest_order_for(package_id, orders) {
        Some(order) => PackageAccess::Order(order.status),
        None => PackageAccess::NotPurchased,
    }
}

/// 带状态的套餐
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPackage {
    pub package: Package,
    pub access: PackageAccess,
}

/// 目录划分结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPartition {
    /// 可以购买的
    pub available: Vec<LabeledPackage>,
    /// 已拥有或已有进行中订单的
    pub owned: Vec<LabeledPackage>,
}

/// 把目录划分为"可购买"和"已拥有"两部分
///
/// 已下架的套餐不会出现在可购买列表中。
pub fn partition_catalog(
    catalog: &[Package],
    owned: &[Package],
    orders: &[Order],
) -> CatalogPartition {
    let mut partition = CatalogPartition::default();

    for package in catalog {
        let access = access_status(package.id, owned, orders);
        let labeled = LabeledPackage {
            package: package.clone(),
            access,
        };
        if access.is_purchasable() {
            if package.is_active() {
                partition.available.push(labeled);
            }
        } else {
            partition.owned.push(labeled);
        }
    }

    partition
}

/// 购物车金额（仅用于展示，最终金额以服务端为准）
#[derive(Debug, Clone, PartialEq)]
pub struct CartTotal {
    pub total: f64,
    /// 目录中找不到的套餐 id，不计入金额
    pub missing: Vec<i64>,
}

pub fn cart_total(catalog: &[Package], package_ids: &[i64]) -> CartTotal {
    let mut total = 0.0;
    let mut missing = Vec::new();

    for id in package_ids {
        match catalog.iter().find(|p| p.id == *id) {
            Some(package) => total += package.price(),
            None => missing.push(*id),
        }
    }

    CartTotal { total, missing }
}
