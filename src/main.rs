use anyhow::Result;
use edu_portal_client::{App, Config};
use std::path::Path;

/// 默认配置文件（存在时读取）
const CONFIG_FILE: &str = "portal.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：文件 + 环境变量覆盖
    let config_path = Path::new(CONFIG_FILE);
    let config = Config::load(config_path.exists().then_some(config_path))?;

    // 初始化并运行应用
    let stats = App::initialize(config).await?.run().await?;

    if stats.failed > 0 {
        anyhow::bail!("{} 个部分加载失败", stats.failed);
    }
    Ok(())
}
