use std::path::PathBuf;

/// 服务器配置 - 门店节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | COMANDA_WORK_DIR | ./comanda-data | 工作目录 |
/// | COMANDA_HTTP_PORT | 8100 | HTTP 服务端口 |
/// | COMANDA_BUS_PORT | 8101 | 厨房推送 TCP 端口 |
/// | COMANDA_LOG_DIR | <work_dir>/logs | 日志目录 |
/// | COMANDA_LOG_LEVEL | info | 默认日志级别 |
/// | COMANDA_OPEN_ACCESS | true | 无认证模式标记 |
///
/// # 示例
///
/// ```ignore
/// COMANDA_WORK_DIR=/data/comanda COMANDA_HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 厨房推送通道 TCP 端口 (显示屏直连)
    pub bus_port: u16,
    /// 日志文件目录
    pub log_dir: String,
    /// 默认日志级别 (RUST_LOG 优先)
    pub log_level: String,
    /// 无认证模式
    ///
    /// 本服务自身不做认证，生产部署在边界上由反向代理补认证层。
    /// 该标记让部署方显式承认这一点。
    pub open_access: bool,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir =
            std::env::var("COMANDA_WORK_DIR").unwrap_or_else(|_| "./comanda-data".into());
        let log_dir =
            std::env::var("COMANDA_LOG_DIR").unwrap_or_else(|_| format!("{work_dir}/logs"));

        Self {
            http_port: std::env::var("COMANDA_HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8100),
            bus_port: std::env::var("COMANDA_BUS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8101),
            log_level: std::env::var("COMANDA_LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            open_access: std::env::var("COMANDA_OPEN_ACCESS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            work_dir,
            log_dir,
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16, bus_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.log_dir = format!("{}/logs", config.work_dir);
        config.http_port = http_port;
        config.bus_port = bus_port;
        config
    }

    /// 数据库文件目录 (<work_dir>/data)
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("data")
    }

    /// 数据库文件路径
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("comanda.redb")
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.log_dir)
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 厨房推送通道监听地址
    pub fn bus_listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.bus_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_rebase_paths() {
        let config = Config::with_overrides("/tmp/comanda-test", 9100, 9101);
        assert_eq!(config.http_port, 9100);
        assert_eq!(config.bus_port, 9101);
        assert_eq!(
            config.store_path(),
            PathBuf::from("/tmp/comanda-test/data/comanda.redb")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/comanda-test/logs"));
        assert_eq!(config.bus_listen_addr(), "0.0.0.0:9101");
    }
}
