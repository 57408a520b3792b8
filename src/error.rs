use thiserror::Error;

/// 输入模拟失败原因，均不影响服务继续运行
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("命令不能为空")]
    EmptyCommand,
    #[error("未能识别出有效按键: {0}")]
    NoRecognizedKeys(String),
    #[error("按键注入失败: {0}")]
    InjectionFailure(String),
    #[error("未知按键: {0}")]
    UnknownKey(String),
    #[error("No text provided")]
    NoText,
    #[error("剪贴板错误: {0}")]
    Clipboard(String),
}
