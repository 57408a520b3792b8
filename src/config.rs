use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，默认 "0.0.0.0"
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 访问令牌，为空时启动会重新生成
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// 对外展示的地址，留空则自动探测局域网 IP
    #[serde(default)]
    pub public_host: String,
    /// 启动时在终端打印二维码
    #[serde(default = "default_show_qr")]
    pub show_qr: bool,
    /// 有多个网卡时在终端提示选择地址，未设置 `public_host` 时才生效
    #[serde(default)]
    pub interactive_select: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_show_qr() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token: String::new(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            public_host: String::new(),
            show_qr: default_show_qr(),
            interactive_select: false,
        }
    }
}

impl AppConfig {
    /// 监听地址，如 "0.0.0.0:5000"
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 获取配置文件路径
pub fn config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airhid");
    config_dir.join("config.toml")
}

/// 加载配置，文件不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    load_config_from(&config_path())
}

/// 从指定路径加载配置；缺少令牌时生成新令牌并写回
pub fn load_config_from(path: &Path) -> Result<AppConfig, String> {
    let exists = path.exists();
    let mut config: AppConfig = if exists {
        let content = fs::read_to_string(path).map_err(|e| format!("读取配置失败: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("解析配置失败: {e}"))?
    } else {
        AppConfig::default()
    };

    let mut dirty = !exists;
    if config.server.token.trim().is_empty() {
        config.server.token = generate_token();
        log::info!("已生成新的访问令牌");
        dirty = true;
    }
    if dirty {
        save_config_to(&config, path)?;
    }
    Ok(config)
}

/// 保存配置到文件
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("创建配置目录失败: {e}"))?;
    }
    let content = toml::to_string_pretty(config).map_err(|e| format!("序列化配置失败: {e}"))?;
    fs::write(path, content).map_err(|e| format!("写入配置失败: {e}"))?;
    Ok(())
}

/// 128 位随机令牌，十六进制表示
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
