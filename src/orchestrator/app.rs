//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动日志、恢复登录会话、按配置选择数据源
//! 2. **按角色调度**：学生展示考试场次和套餐；可管理考试的角色展示表单下拉和报名名单，
//!    管理员另外展示订单统计
//! 3. **生命周期**：持有根取消令牌，Ctrl+C 时取消所有流程；按配置在结束时退出登录
//! 4. **全局统计**：汇总各部分的成功 / 失败数
//!
//! 本层不做业务判断，只负责把流程串起来并输出结果。

use crate::config::{Config, DataSourceMode};
use crate::datasource::{self, mock, DataSource};
use crate::infrastructure::AuthSession;
use crate::models::{AuthUser, MasterDataKind, Role};
use crate::services::route_guard::{self, RouteDecision};
use crate::services::{Confirmer, Notifier, StaticConfirmer, TracingNotifier};
use crate::utils::{logging, truncate_text};
use crate::workflow::{AdminConsole, ExamCtx, ExamView, ExamWorkflow, LoadStatus, PurchaseFlow};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 未配置考试时展示的考试
const DEFAULT_EXAM_ID: i64 = 1;

/// 平台配置中没有 `currency` 时使用的币种
const DEFAULT_CURRENCY: &str = "INR";

/// 应用主结构
pub struct App {
    config: Config,
    session: Arc<AuthSession>,
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
}

/// 运行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub succeeded: usize,
    pub failed: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init(config.verbose_logging);
        logging::log_startup(&config);

        let session = Arc::new(match config.data_source {
            DataSourceMode::Live => AuthSession::load(&config.session_file)?,
            // 演示模式不读写会话文件，直接以演示学生登录
            DataSourceMode::Demo => {
                let session = AuthSession::in_memory();
                session.login(mock::demo_user(), "demo-token")?;
                session
            }
        });

        let source = datasource::build_data_source(&config, Arc::clone(&session))?;

        Ok(Self::with_parts(
            config,
            session,
            source,
            Arc::new(TracingNotifier),
            Arc::new(StaticConfirmer::always_yes()),
        ))
    }

    /// 使用已有组件创建（测试中注入内存提示器等）
    pub fn with_parts(
        config: Config,
        session: Arc<AuthSession>,
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            config,
            session,
            source,
            notifier,
            confirmer,
        }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        let root = CancellationToken::new();

        let interrupt = root.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⚠️ 收到中断信号，正在取消进行中的请求...");
                interrupt.cancel();
            }
        });

        let stats = self.run_with(&root).await;
        watcher.abort();

        if self.config.logout_on_exit {
            if let Err(e) = self.logout().await {
                warn!("⚠️ 退出登录失败: {}", e);
            }
        }

        logging::print_final_stats(stats.succeeded, stats.failed);
        Ok(stats)
    }

    /// 退出登录
    ///
    /// 会话默认跨次运行保留，何时结束由调用方决定；
    /// 配置了 `logout_on_exit` 时 [`App::run`] 会在结束前调用。
    pub async fn logout(&self) -> Result<()> {
        if let Some(user) = self.session.current_user() {
            info!("👋 {} #{} 退出登录", user.name, user.id);
        }
        self.source.logout().await?;
        Ok(())
    }

    /// 在给定的根令牌下运行各部分
    pub async fn run_with(&self, root: &CancellationToken) -> RunStats {
        let mut stats = RunStats::default();

        let Some(user) = self.session.current_user() else {
            warn!("⚠️ 当前未登录，请先登录后再运行");
            return stats;
        };

        let landing = user.role.landing_route();
        if let RouteDecision::Redirect(to) = route_guard::guard(&landing, Some(&user)) {
            warn!("⚠️ 落地页 {} 被重定向到 {}", landing, to);
        }
        info!("👤 当前用户: {} #{} ({}) → {}", user.name, user.id, user.role, landing);

        match user.role {
            Role::Student => {
                tally(&mut stats, self.show_exam(&user, root).await);
                tally(&mut stats, self.show_packages(root).await);
            }
            role if role.can_manage_exams() => {
                tally(&mut stats, self.show_exam_rosters().await);
                if role != Role::Teacher {
                    tally(&mut stats, self.show_order_stats().await);
                }
            }
            _ => info!("💡 {} 门户没有可展示的内容", user.role),
        }

        stats
    }

    /// 展示考试场次
    async fn show_exam(&self, user: &AuthUser, root: &CancellationToken) -> bool {
        let exam_id = self.config.exam_id.unwrap_or(DEFAULT_EXAM_ID);
        logging::log_section(&format!("📋 考试 #{} 场次", exam_id));

        let mut workflow = ExamWorkflow::new(
            ExamCtx::new(exam_id, Some(user.id)),
            Arc::clone(&self.source),
            Arc::clone(&self.notifier),
            Arc::clone(&self.confirmer),
        )
        .with_parent_token(root);

        match workflow.load().await {
            Ok(LoadStatus::Loaded) => {
                let now = Utc::now();
                print_exam_view(&workflow.view(now));
                let upcoming = workflow.upcoming_enrollments(now);
                info!("🗓️ 即将参加的场次: {} 个", upcoming.len());
                true
            }
            Ok(LoadStatus::Aborted) => false,
            Err(e) => {
                error!("❌ 考试 #{} 加载失败: {}", exam_id, e);
                false
            }
        }
    }

    /// 展示套餐目录
    async fn show_packages(&self, root: &CancellationToken) -> bool {
        logging::log_section("🛒 套餐");

        let mut flow = PurchaseFlow::new(
            Arc::clone(&self.source),
            Arc::clone(&self.notifier),
            Arc::clone(&self.confirmer),
        )
        .with_parent_token(root);

        match flow.load().await {
            Ok(LoadStatus::Loaded) => {
                let partition = flow.partition();
                info!("可购买 {} 个:", partition.available.len());
                for item in &partition.available {
                    info!(
                        "  #{} {} ¥{:.2} [{}]",
                        item.package.id,
                        item.package.name(),
                        item.package.price(),
                        item.access
                    );
                }
                info!("已拥有 / 处理中 {} 个:", partition.owned.len());
                for item in &partition.owned {
                    info!("  #{} {} [{}]", item.package.id, item.package.name(), item.access);
                }
                for failure in &flow.state().partial_failures {
                    warn!("⚠️ {}: {}", failure.section, failure.message);
                }
                true
            }
            Ok(LoadStatus::Aborted) => false,
            Err(e) => {
                error!("❌ 套餐目录加载失败: {}", e);
                false
            }
        }
    }

    /// 展示考试表单下拉和各场次报名名单
    async fn show_exam_rosters(&self) -> bool {
        let exam_id = self.config.exam_id.unwrap_or(DEFAULT_EXAM_ID);
        logging::log_section(&format!("🧑‍🏫 考试 #{} 管理", exam_id));

        let console = AdminConsole::new(
            Arc::clone(&self.source),
            Arc::clone(&self.notifier),
            Arc::clone(&self.confirmer),
        );

        let form = console.load_exam_form_options().await;
        for kind in MasterDataKind::ALL {
            info!("  下拉 {}: {} 项", kind, form.items(kind).len());
        }

        let schedules = match self.source.list_schedules(exam_id).await {
            Ok(schedules) => schedules,
            Err(e) => {
                error!("❌ 考试 #{} 场次加载失败: {}", exam_id, e);
                return false;
            }
        };

        let mut all_loaded = form.failures.is_empty();
        for schedule in &schedules {
            match console.schedule_roster(exam_id, schedule.id).await.into_success() {
                Some(roster) => info!(
                    "  场次 #{} 名单 {} 人 / 容量 {}",
                    schedule.id,
                    roster.len(),
                    schedule.capacity
                ),
                None => all_loaded = false,
            }
        }
        all_loaded
    }

    /// 展示订单统计
    async fn show_order_stats(&self) -> bool {
        logging::log_section("📊 订单统计");

        let currency = match self.source.get_config().await {
            Ok(config) => config
                .get("currency")
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_string(),
            Err(e) => {
                warn!("⚠️ 平台配置加载失败，按 {} 显示: {}", DEFAULT_CURRENCY, e);
                DEFAULT_CURRENCY.to_string()
            }
        };

        match self.source.order_stats().await {
            Ok(stats) => {
                info!("订单总数: {}", stats.total_orders);
                info!(
                    "待支付 {} / 已支付 {} / 失败 {} / 已退款 {}",
                    stats.pending_orders,
                    stats.paid_orders,
                    stats.failed_orders,
                    stats.refunded_orders
                );
                info!("总收入: {:.2} {}", stats.total_revenue, currency);
                true
            }
            Err(e) => {
                error!("❌ 订单统计加载失败: {}", e);
                false
            }
        }
    }
}

fn tally(stats: &mut RunStats, ok: bool) {
    if ok {
        stats.succeeded += 1;
    } else {
        stats.failed += 1;
    }
}

// ========== 日志辅助函数 ==========

fn print_exam_view(view: &ExamView) {
    info!("📝 {}", truncate_text(view.title(), 40));
    for row in &view.rows {
        let s = &row.schedule;
        info!(
            "  场次 #{} {} ~ {} [{}] {}/{}{}{}{}",
            s.id,
            s.start_date_time.format("%Y-%m-%d %H:%M"),
            s.end_date_time.format("%H:%M"),
            row.state.label(),
            s.enrolled_count,
            s.capacity,
            if row.is_enrolled { " ✓已报名" } else { "" },
            if row.actions.can_enroll { " [可报名]" } else { "" },
            if row.actions.can_cancel { " [可取消]" } else { "" },
        );
    }
    for failure in &view.partial_failures {
        warn!("⚠️ {}: {}", failure.section, failure.message);
    }
}
