use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::chord::{parse_command, ParseResult};
use crate::dispatch::{dispatch, KeyPresser, KEY_INTERVAL};
use crate::error::InputError;
use crate::vocabulary::{KeyId, Modifier, ModifierSet, Vocabulary};

/// 写入剪贴板后到粘贴之前的等待
const PASTE_DELAY: Duration = Duration::from_millis(100);
/// 鼠标按下与抬起之间的间隔
const CLICK_HOLD: Duration = Duration::from_millis(10);
/// Windows 滚轮一格的单位
const WHEEL_DELTA: f64 = 120.0;

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Modifier = Modifier::Super;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Modifier = Modifier::Ctrl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// 鼠标动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseAction {
    /// 相对移动
    Move { dx: f64, dy: f64 },
    Click,
    RightClick,
    /// Windows 滚轮单位，正数向上
    Scroll { amount: f64 },
}

impl MouseAction {
    /// 解析前端发来的动作名，未知动作返回 `None`
    pub fn from_request(action: &str, x: f64, y: f64) -> Option<Self> {
        match action {
            "move" => Some(MouseAction::Move { dx: x, dy: y }),
            "click" => Some(MouseAction::Click),
            "right_click" => Some(MouseAction::RightClick),
            "scroll" => Some(MouseAction::Scroll { amount: y }),
            _ => None,
        }
    }
}

/// 文本输入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMode {
    /// 写入剪贴板后粘贴
    Type,
    /// 只写入剪贴板
    Clipboard,
    /// 其他取值：什么也不做
    Ignore,
}

impl TypeMode {
    pub fn from_request(mode: &str) -> Self {
        match mode {
            "type" => TypeMode::Type,
            "clipboard" => TypeMode::Clipboard,
            _ => TypeMode::Ignore,
        }
    }
}

/// 操作系统输入后端
pub trait InputBackend: KeyPresser {
    fn set_clipboard(&mut self, text: &str) -> Result<(), String>;

    fn mouse_move(&mut self, dx: i32, dy: i32) -> Result<(), String>;

    fn mouse_button(&mut self, button: MouseButton, down: bool) -> Result<(), String>;

    /// 正数向下滚动
    fn scroll(&mut self, notches: i32) -> Result<(), String>;
}

/// 输入控制器
///
/// 所有注入操作都经过同一把锁，同一时刻最多只有一个请求在操作键盘鼠标，
/// 其余调用方阻塞等待。
pub struct InputController<B> {
    vocab: Vocabulary,
    backend: Mutex<B>,
}

impl<B: InputBackend> InputController<B> {
    pub fn new(vocab: Vocabulary, backend: B) -> Self {
        Self {
            vocab,
            backend: Mutex::new(backend),
        }
    }

    fn lock(&self) -> MutexGuard<'_, B> {
        // 某次注入中途 panic 不应让后续请求全部失败
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 持锁访问后端
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.lock())
    }

    /// 解析并执行按键命令
    pub fn parse_and_dispatch(&self, command: &str) -> Result<ParseResult, InputError> {
        let mut backend = self.lock();

        let parsed = parse_command(&self.vocab, command)?;
        log::info!(
            "解析结果 -> 修饰键: {:?}, 按键序列: {:?}",
            parsed.modifiers.iter().collect::<Vec<_>>(),
            parsed.main_keys
        );
        dispatch(&mut *backend, &parsed, KEY_INTERVAL)?;
        Ok(parsed)
    }

    /// 通过剪贴板输入文本
    pub fn type_text(&self, text: &str, mode: TypeMode) -> Result<(), InputError> {
        match mode {
            TypeMode::Type => {
                if text.is_empty() {
                    return Err(InputError::NoText);
                }
                let mut backend = self.lock();
                log::info!("通过剪贴板注入文本: {}", preview(text));
                backend.set_clipboard(text).map_err(InputError::Clipboard)?;

                std::thread::sleep(PASTE_DELAY);
                backend
                    .press_chord(ModifierSet::new().with(PASTE_MODIFIER), &[KeyId::Char('v')])
                    .map_err(InputError::InjectionFailure)?;
                log::info!("注入成功");
                Ok(())
            }
            TypeMode::Clipboard => {
                let mut backend = self.lock();
                backend.set_clipboard(text).map_err(InputError::Clipboard)
            }
            TypeMode::Ignore => Ok(()),
        }
    }

    /// 按下前端快捷按钮对应的键
    pub fn press_named_key(&self, name: &str) -> Result<(), InputError> {
        let (modifiers, key) =
            quick_key(name).ok_or_else(|| InputError::UnknownKey(name.to_string()))?;

        let mut backend = self.lock();
        log::info!("模拟按键: {name}");
        backend
            .press_chord(modifiers, &[key])
            .map_err(InputError::InjectionFailure)
    }

    pub fn mouse(&self, action: MouseAction) -> Result<(), InputError> {
        let mut backend = self.lock();
        let result = match action {
            MouseAction::Move { dx, dy } => backend.mouse_move(dx as i32, dy as i32),
            MouseAction::Click => click(&mut *backend, MouseButton::Left),
            MouseAction::RightClick => click(&mut *backend, MouseButton::Right),
            MouseAction::Scroll { amount } => match wheel_notches(amount) {
                0 => Ok(()),
                notches => backend.scroll(-notches),
            },
        };
        result.map_err(InputError::InjectionFailure)
    }
}

fn click<B: InputBackend + ?Sized>(backend: &mut B, button: MouseButton) -> Result<(), String> {
    backend.mouse_button(button, true)?;
    std::thread::sleep(CLICK_HOLD);
    backend.mouse_button(button, false)
}

/// 滚轮单位换算为格数，非零输入至少滚动一格
fn wheel_notches(amount: f64) -> i32 {
    if amount == 0.0 || !amount.is_finite() {
        return 0;
    }
    let notches = (amount / WHEEL_DELTA).round() as i32;
    if notches == 0 {
        amount.signum() as i32
    } else {
        notches
    }
}

fn quick_key(name: &str) -> Option<(ModifierSet, KeyId)> {
    let bare = |key| Some((ModifierSet::new(), key));
    match name {
        "ctrl_enter" => Some((ModifierSet::new().with(Modifier::Ctrl), KeyId::Enter)),
        "enter" => bare(KeyId::Enter),
        "tab" => bare(KeyId::Tab),
        "backspace" => bare(KeyId::Backspace),
        "esc" => bare(KeyId::Escape),
        "space" => bare(KeyId::Space),
        "up" => bare(KeyId::Up),
        "down" => bare(KeyId::Down),
        "left" => bare(KeyId::Left),
        "right" => bare(KeyId::Right),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    let mut head: String = text.chars().take(50).collect();
    if head.len() < text.len() {
        head.push_str("...");
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Chord(ModifierSet, Vec<KeyId>),
        Clipboard(String),
        Move(i32, i32),
        Button(MouseButton, bool),
        Scroll(i32),
    }

    #[derive(Default)]
    struct FakeBackend {
        events: Vec<Event>,
        clipboard_error: Option<String>,
        panic_on: Option<KeyId>,
    }

    impl KeyPresser for FakeBackend {
        fn press_chord(&mut self, modifiers: ModifierSet, keys: &[KeyId]) -> Result<(), String> {
            if self.panic_on.is_some_and(|key| keys.contains(&key)) {
                panic!("backend crashed on {keys:?}");
            }
            self.events.push(Event::Chord(modifiers, keys.to_vec()));
            Ok(())
        }
    }

    impl InputBackend for FakeBackend {
        fn set_clipboard(&mut self, text: &str) -> Result<(), String> {
            if let Some(e) = &self.clipboard_error {
                return Err(e.clone());
            }
            self.events.push(Event::Clipboard(text.to_string()));
            Ok(())
        }

        fn mouse_move(&mut self, dx: i32, dy: i32) -> Result<(), String> {
            self.events.push(Event::Move(dx, dy));
            Ok(())
        }

        fn mouse_button(&mut self, button: MouseButton, down: bool) -> Result<(), String> {
            self.events.push(Event::Button(button, down));
            Ok(())
        }

        fn scroll(&mut self, notches: i32) -> Result<(), String> {
            self.events.push(Event::Scroll(notches));
            Ok(())
        }
    }

    fn controller() -> InputController<FakeBackend> {
        InputController::new(Vocabulary::new(), FakeBackend::default())
    }

    fn events(c: &InputController<FakeBackend>) -> Vec<Event> {
        c.with_backend(|b| b.events.clone())
    }

    #[test]
    fn type_mode_pastes_after_writing_clipboard() {
        let c = controller();
        c.type_text("病理诊断", TypeMode::Type).unwrap();
        assert_eq!(
            events(&c),
            vec![
                Event::Clipboard("病理诊断".to_string()),
                Event::Chord(ModifierSet::new().with(PASTE_MODIFIER), vec![KeyId::Char('v')]),
            ]
        );
    }

    #[test]
    fn type_mode_requires_text() {
        let c = controller();
        assert_eq!(c.type_text("", TypeMode::Type), Err(InputError::NoText));
        assert!(events(&c).is_empty());
    }

    #[test]
    fn clipboard_mode_does_not_paste() {
        let c = controller();
        c.type_text("", TypeMode::Clipboard).unwrap();
        c.type_text("hi", TypeMode::Ignore).unwrap();
        assert_eq!(events(&c), vec![Event::Clipboard(String::new())]);
    }

    #[test]
    fn clipboard_failure_skips_paste() {
        let c = InputController::new(
            Vocabulary::new(),
            FakeBackend {
                clipboard_error: Some("busy".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            c.type_text("x", TypeMode::Type),
            Err(InputError::Clipboard("busy".to_string()))
        );
        assert!(events(&c).is_empty());
    }

    #[test]
    fn quick_keys() {
        let c = controller();
        c.press_named_key("ctrl_enter").unwrap();
        c.press_named_key("esc").unwrap();
        assert_eq!(
            c.press_named_key("f13"),
            Err(InputError::UnknownKey("f13".to_string()))
        );
        assert_eq!(
            events(&c),
            vec![
                Event::Chord(ModifierSet::new().with(Modifier::Ctrl), vec![KeyId::Enter]),
                Event::Chord(ModifierSet::new(), vec![KeyId::Escape]),
            ]
        );
    }

    #[test]
    fn mouse_actions() {
        let c = controller();
        c.mouse(MouseAction::Move { dx: 3.7, dy: -2.2 }).unwrap();
        c.mouse(MouseAction::RightClick).unwrap();
        c.mouse(MouseAction::Scroll { amount: 240.0 }).unwrap();
        c.mouse(MouseAction::Scroll { amount: -15.0 }).unwrap();
        c.mouse(MouseAction::Scroll { amount: 0.0 }).unwrap();
        assert_eq!(
            events(&c),
            vec![
                Event::Move(3, -2),
                Event::Button(MouseButton::Right, true),
                Event::Button(MouseButton::Right, false),
                Event::Scroll(-2),
                Event::Scroll(1),
            ]
        );
    }

    #[test]
    fn mouse_action_names() {
        assert_eq!(
            MouseAction::from_request("scroll", 1.0, -120.0),
            Some(MouseAction::Scroll { amount: -120.0 })
        );
        assert_eq!(MouseAction::from_request("click", 5.0, 5.0), Some(MouseAction::Click));
        assert_eq!(MouseAction::from_request("drag", 0.0, 0.0), None);
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("short"), "short");
        let long = "字".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "字".repeat(50)));
    }

    #[test]
    fn panic_inside_backend_does_not_wedge_the_controller() {
        let c = Arc::new(InputController::new(
            Vocabulary::new(),
            FakeBackend {
                panic_on: Some(KeyId::F5),
                ..Default::default()
            },
        ));

        let worker = c.clone();
        let crashed = std::thread::spawn(move || worker.parse_and_dispatch("f5")).join();
        assert!(crashed.is_err());
        assert!(c.backend.is_poisoned());

        let parsed = c.parse_and_dispatch("ctrl a").unwrap();
        assert_eq!(parsed.main_keys, vec![KeyId::Char('a')]);
        c.press_named_key("enter").unwrap();
        assert_eq!(
            events(&c),
            vec![
                Event::Chord(ModifierSet::new().with(Modifier::Ctrl), vec![KeyId::Char('a')]),
                Event::Chord(ModifierSet::new(), vec![KeyId::Enter]),
            ]
        );
    }

    /// 多个控制器实例共享的按键记录
    struct SharedLog(Arc<Mutex<Vec<KeyId>>>);

    impl KeyPresser for SharedLog {
        fn press_chord(&mut self, _: ModifierSet, keys: &[KeyId]) -> Result<(), String> {
            self.0.lock().unwrap().extend_from_slice(keys);
            Ok(())
        }
    }

    impl InputBackend for SharedLog {
        fn set_clipboard(&mut self, _: &str) -> Result<(), String> {
            Ok(())
        }
        fn mouse_move(&mut self, _: i32, _: i32) -> Result<(), String> {
            Ok(())
        }
        fn mouse_button(&mut self, _: MouseButton, _: bool) -> Result<(), String> {
            Ok(())
        }
        fn scroll(&mut self, _: i32) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_sequences_never_interleave() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let c = Arc::new(InputController::new(Vocabulary::new(), SharedLog(log.clone())));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..4 {
                        c.parse_and_dispatch("up down").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let presses = log.lock().unwrap();
        assert_eq!(presses.len(), 48);
        for pair in presses.chunks(2) {
            assert_eq!(pair, [KeyId::Up, KeyId::Down]);
        }
    }
}
