pub mod chord;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod input_sim;
pub mod server;
pub mod tokenizer;
pub mod vocabulary;

pub use chord::{parse_command, ParseResult};
pub use controller::{InputBackend, InputController, MouseAction, MouseButton, TypeMode};
pub use dispatch::{dispatch, DispatchPlan, KeyPresser, KEY_INTERVAL};
pub use error::InputError;
pub use vocabulary::{KeyId, Modifier, ModifierSet, Vocabulary};

use config::{config_path, load_config};
use input_sim::EnigoBackend;
use server::ServerState;
use std::sync::Arc;

/// 启动服务，阻塞直到 Ctrl-C
pub fn run() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!("配置文件: {}", config_path().display());

    let controller = InputController::new(Vocabulary::new(), EnigoBackend::new());
    let state = Arc::new(ServerState::new(config.server.token.clone(), controller));

    let http = server::bind(&config.bind_addr())?;
    display::print_banner(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("创建运行时失败: {e}"))?;
    runtime.block_on(server::serve(http, state))
}
