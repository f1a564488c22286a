use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 订单支付状态
///
/// pending → paid | failed，paid → refunded。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Failed)
                | (OrderStatus::Paid, OrderStatus::Refunded)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 订单明细：一个套餐及其下单时的价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub package_id: i64,
    #[serde(default)]
    pub price: f64,
}

/// 订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub student_id: i64,
    pub total_amount: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// 订单是否包含该套餐
    pub fn references(&self, package_id: i64) -> bool {
        self.items.iter().any(|item| item.package_id == package_id)
    }
}

/// 下单请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub package_ids: Vec<i64>,
}

/// 更新支付状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

/// 支付网关回调
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub order_id: i64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

/// 管理端订单统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub paid_orders: u64,
    pub failed_orders: u64,
    pub refunded_orders: u64,
    pub total_revenue: f64,
}

impl OrderStats {
    /// 根据订单列表汇总（离线模式使用）
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut stats, order| {
            stats.total_orders += 1;
            match order.status {
                OrderStatus::Pending => stats.pending_orders += 1,
                OrderStatus::Paid => {
                    stats.paid_orders += 1;
                    stats.total_revenue += order.total_amount;
                }
                OrderStatus::Failed => stats.failed_orders += 1,
                OrderStatus::Refunded => stats.refunded_orders += 1,
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Paid.can_transition_to(Refunded));
        assert!(!Failed.can_transition_to(Paid));
        assert!(!Refunded.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Refunded));
    }

    #[test]
    fn test_stats_only_count_paid_revenue() {
        let orders = vec![
            Order {
                id: 1,
                student_id: 9,
                total_amount: 1999.0,
                status: OrderStatus::Paid,
                items: vec![],
                created_at: None,
            },
            Order {
                id: 2,
                student_id: 9,
                total_amount: 2999.0,
                status: OrderStatus::Failed,
                items: vec![],
                created_at: None,
            },
        ];

        let stats = OrderStats::from_orders(&orders);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.paid_orders, 1);
        assert_eq!(stats.failed_orders, 1);
        assert_eq!(stats.total_revenue, 1999.0);
    }
}
