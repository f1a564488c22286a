//! 套餐购买流程 - 流程层
//!
//! 加载套餐目录、已拥有套餐和订单历史，推导每个套餐的状态，
//! 并处理单个购买、批量下单和支付确认。
//!
//! 和考试流程一样：下单或支付之后无条件重新加载，失败只提示不抛出。
//! 页面展示的金额只是参考，最终以服务端返回的订单金额为准。

use crate::datasource::DataSource;
use crate::error::{AppError, AppResult, BusinessError};
use crate::models::{NewOrder, Order, OrderStatus, Package, PaymentUpdate};
use crate::services::package_access::{self, CatalogPartition, PackageAccess};
use crate::services::validation;
use crate::services::{Confirmer, Notice, Notifier};
use crate::workflow::outcome::{ActionOutcome, LoadSection, LoadStatus, PartialFailure};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 金额比较的容差
const AMOUNT_EPSILON: f64 = 0.005;

/// 已加载的数据
#[derive(Debug, Clone, Default)]
pub struct PurchaseState {
    pub catalog: Vec<Package>,
    pub owned: Vec<Package>,
    pub orders: Vec<Order>,
    pub partial_failures: Vec<PartialFailure>,
}

/// 下单前的报价
#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuote {
    pub package_ids: Vec<i64>,
    /// 按目录价格计算的展示金额
    pub display_total: f64,
    /// 目录中找不到的套餐
    pub missing: Vec<i64>,
}

/// 下单结果
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    /// 服务端返回的订单（金额以此为准）
    pub order: Order,
    /// 下单前展示给用户的金额
    pub display_total: f64,
}

impl OrderReceipt {
    /// 服务端金额和展示金额是否不一致
    pub fn amount_mismatch(&self) -> bool {
        (self.order.total_amount - self.display_total).abs() > AMOUNT_EPSILON
    }
}

/// 套餐购买流程
pub struct PurchaseFlow {
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    token: CancellationToken,
    state: PurchaseState,
}

impl PurchaseFlow {
    pub fn new(
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            source,
            notifier,
            confirmer,
            token: CancellationToken::new(),
            state: PurchaseState::default(),
        }
    }

    pub fn with_parent_token(mut self, parent: &CancellationToken) -> Self {
        self.token = parent.child_token();
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> &PurchaseState {
        &self.state
    }

    /// 加载目录、已拥有套餐和订单
    ///
    /// 目录加载失败时整体失败；另外两项失败时记为部分失败。
    pub async fn load(&mut self) -> AppResult<LoadStatus> {
        info!("🛒 正在加载套餐目录...");

        let source = Arc::clone(&self.source);
        let fetched = self
            .guarded(async move {
                futures::join!(
                    source.list_packages(),
                    source.my_packages(),
                    source.list_orders()
                )
            })
            .await;

        let Some((catalog, owned, orders)) = fetched else {
            warn!("视图已关闭，丢弃套餐加载结果");
            return Ok(LoadStatus::Aborted);
        };

        let catalog = catalog.map_err(|e| {
            error!("❌ 套餐目录加载失败: {}", e);
            e
        })?;

        self.state.catalog = catalog;
        self.state.partial_failures.clear();
        self.absorb(owned, orders);

        info!(
            "✓ 套餐加载完成: 目录 {} 个, 已拥有 {} 个, 订单 {} 个",
            self.state.catalog.len(),
            self.state.owned.len(),
            self.state.orders.len()
        );
        Ok(LoadStatus::Loaded)
    }

    /// 重新拉取全部数据，目录失败时保留旧目录
    pub async fn refresh(&mut self) -> LoadStatus {
        let source = Arc::clone(&self.source);
        let fetched = self
            .guarded(async move {
                futures::join!(
                    source.list_packages(),
                    source.my_packages(),
                    source.list_orders()
                )
            })
            .await;

        let Some((catalog, owned, orders)) = fetched else {
            return LoadStatus::Aborted;
        };

        self.state.partial_failures.clear();
        match catalog {
            Ok(catalog) => self.state.catalog = catalog,
            Err(e) => self.record_failure(LoadSection::Catalog, &e),
        }
        self.absorb(owned, orders);
        LoadStatus::Loaded
    }

    /// 单个套餐的状态
    pub fn status_of(&self, package_id: i64) -> PackageAccess {
        package_access::access_status(package_id, &self.state.owned, &self.state.orders)
    }

    /// 可购买 / 已拥有划分
    pub fn partition(&self) -> CatalogPartition {
        package_access::partition_catalog(
            &self.state.catalog,
            &self.state.owned,
            &self.state.orders,
        )
    }

    /// 计算展示金额
    pub fn quote(&self, package_ids: &[i64]) -> AppResult<OrderQuote> {
        validation::ensure_valid(validation::validate_order_packages(package_ids))?;

        let total = package_access::cart_total(&self.state.catalog, package_ids);
        if !total.missing.is_empty() {
            warn!("⚠️ 目录中找不到套餐 {:?}，不计入展示金额", total.missing);
        }
        Ok(OrderQuote {
            package_ids: package_ids.to_vec(),
            display_total: total.total,
            missing: total.missing,
        })
    }

    /// 购买单个套餐
    pub async fn purchase(&mut self, package_id: i64) -> ActionOutcome<Order> {
        if self.token.is_cancelled() {
            return ActionOutcome::Aborted;
        }
        if let Err(e) = self.ensure_purchasable(package_id) {
            return self.reject(e);
        }

        info!("🛒 正在购买套餐 #{}...", package_id);
        let order = NewOrder {
            package_ids: vec![package_id],
        };
        let source = Arc::clone(&self.source);
        let result = self
            .guarded(async move { source.create_order(&order).await })
            .await;

        let outcome = match result {
            None => return ActionOutcome::Aborted,
            Some(Ok(order)) => {
                info!("✓ 订单 #{} 已创建，金额 {:.2}", order.id, order.total_amount);
                self.notifier.notify(Notice::success("订单已创建，请完成支付"));
                ActionOutcome::Succeeded(order)
            }
            Some(Err(e)) => self.fail("购买失败", e),
        };

        if self.refresh().await == LoadStatus::Aborted {
            return ActionOutcome::Aborted;
        }
        outcome
    }

    /// 批量下单
    ///
    /// 先计算展示金额并请求确认；服务端金额不一致时记录警告，以服务端为准。
    pub async fn create_order(&mut self, package_ids: &[i64]) -> ActionOutcome<OrderReceipt> {
        if self.token.is_cancelled() {
            return ActionOutcome::Aborted;
        }

        let quote = match self.quote(package_ids) {
            Ok(quote) => quote,
            Err(e) => return self.reject(e),
        };
        if let Some(e) = package_ids
            .iter()
            .find_map(|id| self.ensure_purchasable(*id).err())
        {
            return self.reject(e);
        }

        let prompt = format!(
            "确认购买 {} 个套餐，合计 {:.2}？",
            quote.package_ids.len(),
            quote.display_total
        );
        let confirmed = match self.guarded(self.confirmer.confirm(&prompt)).await {
            None => return ActionOutcome::Aborted,
            Some(answer) => answer,
        };
        if !confirmed {
            info!("用户放弃下单");
            return ActionOutcome::Declined;
        }

        info!("🛒 正在创建订单: {:?}", quote.package_ids);
        let order = NewOrder {
            package_ids: quote.package_ids.clone(),
        };
        let source = Arc::clone(&self.source);
        let result = self
            .guarded(async move { source.create_order(&order).await })
            .await;

        let outcome = match result {
            None => return ActionOutcome::Aborted,
            Some(Ok(order)) => {
                let receipt = OrderReceipt {
                    order,
                    display_total: quote.display_total,
                };
                if receipt.amount_mismatch() {
                    warn!(
                        "⚠️ 订单 #{} 服务端金额 {:.2} 与展示金额 {:.2} 不一致，以服务端为准",
                        receipt.order.id, receipt.order.total_amount, receipt.display_total
                    );
                }
                info!(
                    "✓ 订单 #{} 已创建，金额 {:.2}",
                    receipt.order.id, receipt.order.total_amount
                );
                self.notifier.notify(Notice::success("订单已创建，请完成支付"));
                ActionOutcome::Succeeded(receipt)
            }
            Some(Err(e)) => self.fail("下单失败", e),
        };

        if self.refresh().await == LoadStatus::Aborted {
            return ActionOutcome::Aborted;
        }
        outcome
    }

    /// 提交支付结果
    pub async fn pay(
        &mut self,
        order_id: i64,
        payment_reference: Option<String>,
    ) -> ActionOutcome<Order> {
        if self.token.is_cancelled() {
            return ActionOutcome::Aborted;
        }

        info!("💳 正在确认订单 #{} 的支付...", order_id);
        let update = PaymentUpdate {
            status: OrderStatus::Paid,
            payment_reference,
        };
        let source = Arc::clone(&self.source);
        let result = self
            .guarded(async move { source.update_payment(order_id, &update).await })
            .await;

        let outcome = match result {
            None => return ActionOutcome::Aborted,
            Some(Ok(order)) => {
                info!("✓ 订单 #{} 支付成功", order.id);
                self.notifier.notify(Notice::success("支付成功"));
                ActionOutcome::Succeeded(order)
            }
            Some(Err(e)) => self.fail("支付失败", e),
        };

        if self.refresh().await == LoadStatus::Aborted {
            return ActionOutcome::Aborted;
        }
        outcome
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    // ========== 内部辅助方法 ==========

    async fn guarded<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = fut => Some(output),
        }
    }

    fn ensure_purchasable(&self, package_id: i64) -> AppResult<()> {
        let package = self
            .state
            .catalog
            .iter()
            .find(|p| p.id == package_id)
            .ok_or_else(|| AppError::not_found("套餐", package_id))?;

        if !package.is_active() || !self.status_of(package_id).is_purchasable() {
            return Err(BusinessError::PackageUnavailable { package_id }.into());
        }
        Ok(())
    }

    /// 本地检查未通过，不发请求
    fn reject<T>(&self, err: AppError) -> ActionOutcome<T> {
        warn!("⚠️ {}", err);
        let message = err.user_message();
        self.notifier.notify(Notice::error(message.clone()));
        ActionOutcome::Failed(message)
    }

    fn fail<T>(&self, action: &str, err: AppError) -> ActionOutcome<T> {
        error!("❌ {}: {}", action, err);
        let message = err.user_message();
        self.notifier
            .notify(Notice::error(format!("{}: {}", action, message)));
        ActionOutcome::Failed(message)
    }

    fn absorb(&mut self, owned: AppResult<Vec<Package>>, orders: AppResult<Vec<Order>>) {
        match owned {
            Ok(owned) => self.state.owned = owned,
            Err(e) => self.record_failure(LoadSection::OwnedPackages, &e),
        }
        match orders {
            Ok(orders) => self.state.orders = orders,
            Err(e) => self.record_failure(LoadSection::Orders, &e),
        }
    }

    fn record_failure(&mut self, section: LoadSection, err: &AppError) {
        warn!("⚠️ {}加载失败: {}", section, err);
        self.state.partial_failures.push(PartialFailure {
            section,
            message: err.user_message(),
        });
    }
}

impl Drop for PurchaseFlow {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
