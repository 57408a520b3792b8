use std::time::Duration;

use crate::chord::ParseResult;
use crate::error::InputError;
use crate::vocabulary::{KeyId, ModifierSet};

/// 顺序按键之间的间隔
pub const KEY_INTERVAL: Duration = Duration::from_millis(10);

/// 底层按键原语
pub trait KeyPresser {
    /// 按住 `modifiers` 的同时按下 `keys` 中的所有键
    fn press_chord(&mut self, modifiers: ModifierSet, keys: &[KeyId]) -> Result<(), String>;

    /// 不带修饰键单独按下一个键
    fn press_single_key(&mut self, key: KeyId) -> Result<(), String> {
        self.press_chord(ModifierSet::new(), &[key])
    }
}

/// 派发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPlan {
    /// 所有键同时按下
    Chord,
    /// 依次单独按下
    Sequence,
}

impl ParseResult {
    /// 有修饰键或至多一个主键时作为组合键，否则逐个按下
    pub fn plan(&self) -> DispatchPlan {
        if !self.modifiers.is_empty() || self.main_keys.len() <= 1 {
            DispatchPlan::Chord
        } else {
            DispatchPlan::Sequence
        }
    }
}

/// 按解析结果调用按键原语，第一次失败即中止
pub fn dispatch<P: KeyPresser + ?Sized>(
    presser: &mut P,
    parsed: &ParseResult,
    interval: Duration,
) -> Result<(), InputError> {
    match parsed.plan() {
        DispatchPlan::Chord => presser
            .press_chord(parsed.modifiers, &parsed.main_keys)
            .map_err(InputError::InjectionFailure),
        DispatchPlan::Sequence => {
            for (i, key) in parsed.main_keys.iter().enumerate() {
                if i > 0 {
                    std::thread::sleep(interval);
                }
                presser
                    .press_single_key(*key)
                    .map_err(InputError::InjectionFailure)?;
            }
            Ok(())
        }
    }
}
