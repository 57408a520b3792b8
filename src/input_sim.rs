use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::controller::{InputBackend, MouseButton};
use crate::dispatch::KeyPresser;
use crate::vocabulary::{KeyId, Modifier, ModifierSet};

/// 基于 enigo（键盘鼠标）和 arboard（剪贴板）的系统输入后端
#[derive(Debug, Default)]
pub struct EnigoBackend;

impl EnigoBackend {
    pub fn new() -> Self {
        Self
    }
}

fn enigo() -> Result<Enigo, String> {
    Enigo::new(&Settings::default()).map_err(|e| format!("初始化 enigo 失败: {e}"))
}

impl KeyPresser for EnigoBackend {
    /// 按序按下修饰键和主键，再逆序释放
    fn press_chord(&mut self, modifiers: ModifierSet, keys: &[KeyId]) -> Result<(), String> {
        let mut sequence: Vec<Key> = modifiers.iter().map(modifier_key).collect();
        for key in keys {
            sequence.push(enigo_key(*key)?);
        }

        let mut enigo = enigo()?;
        press_then_release(&sequence, |key, direction| {
            enigo.key(key, direction).map_err(|e| e.to_string())
        })
    }

    fn press_single_key(&mut self, key: KeyId) -> Result<(), String> {
        let key = enigo_key(key)?;
        enigo()?
            .key(key, Direction::Click)
            .map_err(|e| format!("按键 {key:?} 失败: {e}"))
    }
}

impl InputBackend for EnigoBackend {
    fn set_clipboard(&mut self, text: &str) -> Result<(), String> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| format!("打开剪贴板失败: {e}"))?;
        clipboard
            .set_text(text)
            .map_err(|e| format!("写入剪贴板失败: {e}"))
    }

    fn mouse_move(&mut self, dx: i32, dy: i32) -> Result<(), String> {
        enigo()?
            .move_mouse(dx, dy, Coordinate::Rel)
            .map_err(|e| format!("移动鼠标失败: {e}"))
    }

    fn mouse_button(&mut self, button: MouseButton, down: bool) -> Result<(), String> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        };
        let direction = if down { Direction::Press } else { Direction::Release };
        enigo()?
            .button(button, direction)
            .map_err(|e| format!("鼠标按键失败: {e}"))
    }

    fn scroll(&mut self, notches: i32) -> Result<(), String> {
        enigo()?
            .scroll(notches, Axis::Vertical)
            .map_err(|e| format!("滚动失败: {e}"))
    }
}

/// 按序按下，再逆序释放
///
/// 任何一步失败都会释放已经按下的键，并返回第一个错误。
fn press_then_release<F>(sequence: &[Key], mut send: F) -> Result<(), String>
where
    F: FnMut(Key, Direction) -> Result<(), String>,
{
    let mut pressed = 0;
    let mut first_err = None;
    for key in sequence {
        match send(*key, Direction::Press) {
            Ok(()) => pressed += 1,
            Err(e) => {
                first_err = Some(format!("按下 {key:?} 失败: {e}"));
                break;
            }
        }
    }
    for key in sequence[..pressed].iter().rev() {
        if let Err(e) = send(*key, Direction::Release) {
            log::warn!("释放 {key:?} 失败: {e}");
            first_err.get_or_insert_with(|| format!("释放 {key:?} 失败: {e}"));
        }
    }
    first_err.map_or(Ok(()), Err)
}

fn modifier_key(modifier: Modifier) -> Key {
    match modifier {
        Modifier::Ctrl => Key::Control,
        Modifier::Shift => Key::Shift,
        Modifier::Alt => Key::Alt,
        Modifier::Super => Key::Meta,
    }
}

/// 映射为 enigo 按键；标点按物理键位输入其未加 Shift 的字符
fn enigo_key(key: KeyId) -> Result<Key, String> {
    let key = match key {
        KeyId::Enter => Key::Return,
        KeyId::Escape => Key::Escape,
        KeyId::Tab => Key::Tab,
        KeyId::Space => Key::Space,
        KeyId::Backspace => Key::Backspace,
        KeyId::Delete => Key::Delete,
        KeyId::Insert => return raw_key(INSERT_CODE, "Insert"),
        KeyId::PrintScreen => return raw_key(PRINT_SCREEN_CODE, "PrintScreen"),
        KeyId::Up => Key::UpArrow,
        KeyId::Down => Key::DownArrow,
        KeyId::Left => Key::LeftArrow,
        KeyId::Right => Key::RightArrow,
        KeyId::Home => Key::Home,
        KeyId::End => Key::End,
        KeyId::PageUp => Key::PageUp,
        KeyId::PageDown => Key::PageDown,
        KeyId::F1 => Key::F1,
        KeyId::F2 => Key::F2,
        KeyId::F3 => Key::F3,
        KeyId::F4 => Key::F4,
        KeyId::F5 => Key::F5,
        KeyId::F6 => Key::F6,
        KeyId::F7 => Key::F7,
        KeyId::F8 => Key::F8,
        KeyId::F9 => Key::F9,
        KeyId::F10 => Key::F10,
        KeyId::F11 => Key::F11,
        KeyId::F12 => Key::F12,
        KeyId::Char(c) => Key::Unicode(c),
        KeyId::Plus => Key::Unicode('='),
        KeyId::Minus => Key::Unicode('-'),
        KeyId::Comma => Key::Unicode(','),
        KeyId::Period => Key::Unicode('.'),
        KeyId::Slash => Key::Unicode('/'),
        KeyId::Semicolon => Key::Unicode(';'),
        KeyId::Quote => Key::Unicode('\''),
        KeyId::LeftBracket => Key::Unicode('['),
        KeyId::RightBracket => Key::Unicode(']'),
        KeyId::Backslash => Key::Unicode('\\'),
        KeyId::Backquote => Key::Unicode('`'),
    };
    Ok(key)
}

// 平台原生键码：Windows 为虚拟键码，Linux 为 X keysym
#[cfg(target_os = "windows")]
const INSERT_CODE: Option<u32> = Some(0x2D);
#[cfg(target_os = "windows")]
const PRINT_SCREEN_CODE: Option<u32> = Some(0x2C);
#[cfg(all(unix, not(target_os = "macos")))]
const INSERT_CODE: Option<u32> = Some(0xff63);
#[cfg(all(unix, not(target_os = "macos")))]
const PRINT_SCREEN_CODE: Option<u32> = Some(0xff61);
#[cfg(not(any(target_os = "windows", all(unix, not(target_os = "macos")))))]
const INSERT_CODE: Option<u32> = None;
#[cfg(not(any(target_os = "windows", all(unix, not(target_os = "macos")))))]
const PRINT_SCREEN_CODE: Option<u32> = None;

fn raw_key(code: Option<u32>, name: &str) -> Result<Key, String> {
    code.map(Key::Other)
        .ok_or_else(|| format!("当前平台不支持按键: {name}"))
}
