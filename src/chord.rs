use crate::error::InputError;
use crate::tokenizer::{Scan, TokenKind, Tokenizer};
use crate::vocabulary::{KeyId, ModifierSet, Vocabulary};

/// 组合键连接符：紧跟在按键之后（中间可以有空白）时视为分隔符，否则是加号键
const CHORD_JOINER: &str = "+";

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    pub modifiers: ModifierSet,
    /// 按识别顺序排列，允许重复
    pub main_keys: Vec<KeyId>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.main_keys.is_empty()
    }
}

/// 把自由文本命令解析为修饰键和主键序列
///
/// 每个由分隔符隔开的段只记录第一个识别出的按键，`"aaa"` 只得到一个 `A`。
pub fn parse_command(vocab: &Vocabulary, raw: &str) -> Result<ParseResult, InputError> {
    let cmd = raw.trim().to_lowercase();
    if cmd.is_empty() {
        return Err(InputError::EmptyCommand);
    }

    let mut result = ParseResult::default();
    let mut in_segment = false;
    // 上一个非空白位置是否为按键
    let mut after_key = false;

    for scan in Tokenizer::new(vocab, &cmd) {
        match scan {
            Scan::Matched(token) if after_key && token.canonical == CHORD_JOINER => {
                in_segment = false;
                after_key = false;
            }
            Scan::Matched(token) => {
                if !in_segment {
                    match token.kind {
                        TokenKind::Modifier(m) => result.modifiers.insert(m),
                        TokenKind::MainKey(key) => result.main_keys.push(key),
                    }
                    in_segment = true;
                }
                after_key = true;
            }
            Scan::Separator(c) => {
                in_segment = false;
                if !c.is_whitespace() {
                    after_key = false;
                }
            }
        }
    }

    if result.is_empty() {
        return Err(InputError::NoRecognizedKeys(cmd));
    }
    Ok(result)
}
