use crate::vocabulary::{KeyId, Modifier, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Modifier(Modifier),
    MainKey(KeyId),
}

/// 一次成功匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 词表中的原始写法
    pub canonical: String,
    /// 消耗的字符数（按 Unicode 字符计，不是字节）
    pub len: usize,
}

/// 扫描一步的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    Matched(Token),
    /// 当前字符不属于任何词表，只前进一个字符
    Separator(char),
}

/// 从左到右扫描按键命令
///
/// 输入应当已经转为小写并去除首尾空白。
pub struct Tokenizer<'a> {
    vocab: &'a Vocabulary,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(vocab: &'a Vocabulary, input: &str) -> Self {
        Self {
            vocab,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn match_at(&self, pos: usize) -> Option<Token> {
        let rest = &self.chars[pos..];

        // 修饰键：第一个声明的前缀匹配胜出
        for &(name, modifier) in self.vocab.modifiers() {
            if let Some(len) = prefix_len(rest, name) {
                return Some(Token {
                    kind: TokenKind::Modifier(modifier),
                    canonical: name.to_string(),
                    len,
                });
            }
        }

        // 命名键：最长匹配
        let named = self
            .vocab
            .named_keys()
            .filter_map(|(name, key)| prefix_len(rest, name).map(|len| (name, key, len)))
            .max_by_key(|(_, _, len)| *len);
        if let Some((name, key, len)) = named {
            return Some(Token {
                kind: TokenKind::MainKey(key),
                canonical: name.to_string(),
                len,
            });
        }

        let c = rest[0];
        if c.is_ascii() && c != ' ' {
            if let Some(key) = self.vocab.printable(c) {
                return Some(Token {
                    kind: TokenKind::MainKey(key),
                    canonical: c.to_string(),
                    len: 1,
                });
            }
        }

        None
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Scan;

    fn next(&mut self) -> Option<Scan> {
        if self.pos >= self.chars.len() {
            return None;
        }
        match self.match_at(self.pos) {
            Some(token) => {
                self.pos += token.len;
                Some(Scan::Matched(token))
            }
            None => {
                let c = self.chars[self.pos];
                self.pos += 1;
                Some(Scan::Separator(c))
            }
        }
    }
}

/// `name` 是 `rest` 的前缀时返回其字符长度
fn prefix_len(rest: &[char], name: &str) -> Option<usize> {
    let mut len = 0;
    for expected in name.chars() {
        if rest.get(len) != Some(&expected) {
            return None;
        }
        len += 1;
    }
    Some(len)
}
