use std::collections::HashMap;

/// 修饰键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    /// Win / Command / Meta
    Super,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [
        Modifier::Ctrl,
        Modifier::Shift,
        Modifier::Alt,
        Modifier::Super,
    ];

    fn bit(self) -> u8 {
        match self {
            Modifier::Ctrl => 1,
            Modifier::Shift => 1 << 1,
            Modifier::Alt => 1 << 2,
            Modifier::Super => 1 << 3,
        }
    }
}

/// 修饰键集合，重复加入同一修饰键无额外效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierSet {
    bits: u8,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.bits |= modifier.bit();
    }

    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.bits & modifier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// 按 Ctrl、Shift、Alt、Super 的固定顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = Modifier> {
        let set = *self;
        Modifier::ALL.into_iter().filter(move |m| set.contains(*m))
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = ModifierSet::new();
        for m in iter {
            set.insert(m);
        }
        set
    }
}

/// 物理按键标识，与具体操作系统的键码无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    Enter,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
    Insert,
    PrintScreen,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    /// 字母 a-z 或数字 0-9（小写）
    Char(char),
    /// `=` / `+` 所在的键
    Plus,
    Minus,
    Comma,
    Period,
    Slash,
    Semicolon,
    Quote,
    LeftBracket,
    RightBracket,
    Backslash,
    Backquote,
}

/// 修饰键名称，按声明顺序匹配（长别名在其前缀之前）
const MODIFIER_NAMES: [(&str, Modifier); 10] = [
    ("control", Modifier::Ctrl),
    ("ctrl", Modifier::Ctrl),
    ("shift", Modifier::Shift),
    ("alt", Modifier::Alt),
    ("windows", Modifier::Super),
    ("win", Modifier::Super),
    ("command", Modifier::Super),
    ("cmd", Modifier::Super),
    ("meta", Modifier::Super),
    ("super", Modifier::Super),
];

const NAMED_KEYS: &[(&str, KeyId)] = &[
    ("enter", KeyId::Enter),
    ("回车", KeyId::Enter),
    ("确认", KeyId::Enter),
    ("esc", KeyId::Escape),
    ("escape", KeyId::Escape),
    ("退出", KeyId::Escape),
    ("tab", KeyId::Tab),
    ("制表", KeyId::Tab),
    ("space", KeyId::Space),
    ("空格", KeyId::Space),
    ("backspace", KeyId::Backspace),
    ("退格", KeyId::Backspace),
    ("del", KeyId::Delete),
    ("delete", KeyId::Delete),
    ("删除", KeyId::Delete),
    ("ins", KeyId::Insert),
    ("insert", KeyId::Insert),
    ("插入", KeyId::Insert),
    ("prtsc", KeyId::PrintScreen),
    ("printscreen", KeyId::PrintScreen),
    ("截屏", KeyId::PrintScreen),
    ("up", KeyId::Up),
    ("down", KeyId::Down),
    ("left", KeyId::Left),
    ("right", KeyId::Right),
    ("上", KeyId::Up),
    ("下", KeyId::Down),
    ("左", KeyId::Left),
    ("右", KeyId::Right),
    ("home", KeyId::Home),
    ("end", KeyId::End),
    ("pgup", KeyId::PageUp),
    ("pgdn", KeyId::PageDown),
    ("pageup", KeyId::PageUp),
    ("pagedown", KeyId::PageDown),
    ("向上翻页", KeyId::PageUp),
    ("向下翻页", KeyId::PageDown),
    ("f1", KeyId::F1),
    ("f2", KeyId::F2),
    ("f3", KeyId::F3),
    ("f4", KeyId::F4),
    ("f5", KeyId::F5),
    ("f6", KeyId::F6),
    ("f7", KeyId::F7),
    ("f8", KeyId::F8),
    ("f9", KeyId::F9),
    ("f10", KeyId::F10),
    ("f11", KeyId::F11),
    ("f12", KeyId::F12),
    ("+", KeyId::Plus),
    ("加号", KeyId::Plus),
    ("-", KeyId::Minus),
    ("减号", KeyId::Minus),
    ("=", KeyId::Plus),
    ("等于", KeyId::Plus),
    (",", KeyId::Comma),
    ("逗号", KeyId::Comma),
    (".", KeyId::Period),
    ("句号", KeyId::Period),
    ("/", KeyId::Slash),
    ("斜杠", KeyId::Slash),
    (";", KeyId::Semicolon),
    ("分号", KeyId::Semicolon),
    ("'", KeyId::Quote),
    ("引号", KeyId::Quote),
    ("[", KeyId::LeftBracket),
    ("左括号", KeyId::LeftBracket),
    ("]", KeyId::RightBracket),
    ("右括号", KeyId::RightBracket),
    ("\\", KeyId::Backslash),
    ("反斜杠", KeyId::Backslash),
    ("`", KeyId::Backquote),
    ("波浪号", KeyId::Backquote),
];

const PUNCTUATION_KEYS: &[(char, KeyId)] = &[
    ('+', KeyId::Plus),
    ('-', KeyId::Minus),
    ('=', KeyId::Plus),
    (',', KeyId::Comma),
    ('.', KeyId::Period),
    ('/', KeyId::Slash),
    (';', KeyId::Semicolon),
    ('\'', KeyId::Quote),
    ('[', KeyId::LeftBracket),
    (']', KeyId::RightBracket),
    ('\\', KeyId::Backslash),
    ('`', KeyId::Backquote),
];

/// 按键词表：修饰键、命名键、单个可打印字符
///
/// 启动时构建一次，之后只读。
#[derive(Debug, Clone)]
pub struct Vocabulary {
    modifiers: Vec<(&'static str, Modifier)>,
    named: HashMap<&'static str, KeyId>,
    printable: HashMap<char, KeyId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        let printable = ('a'..='z')
            .chain('0'..='9')
            .map(|c| (c, KeyId::Char(c)))
            .chain(PUNCTUATION_KEYS.iter().copied())
            .collect();

        Self {
            modifiers: MODIFIER_NAMES.to_vec(),
            named: NAMED_KEYS.iter().copied().collect(),
            printable,
        }
    }

    /// 修饰键名称，保持声明顺序
    pub fn modifiers(&self) -> &[(&'static str, Modifier)] {
        &self.modifiers
    }

    pub fn named_keys(&self) -> impl Iterator<Item = (&'static str, KeyId)> + '_ {
        self.named.iter().map(|(name, key)| (*name, *key))
    }

    pub fn modifier(&self, name: &str) -> Option<Modifier> {
        self.modifiers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, m)| *m)
    }

    pub fn named_key(&self, name: &str) -> Option<KeyId> {
        self.named.get(name).copied()
    }

    /// 单字符按键；空格不在表中，它是分隔符
    pub fn printable(&self, c: char) -> Option<KeyId> {
        self.printable.get(&c).copied()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}
