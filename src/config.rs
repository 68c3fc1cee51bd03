use crate::input::Keymap;
use std::path::PathBuf;
use std::time::Duration;

/// the machine's traditional tick rate
pub const DEFAULT_CYCLE_HZ: u32 = 60;

/// which host keys stand in for the hex keypad
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeymapKind {
    /// 1234/qwer/asdf/zxcv laid out like the COSMAC keypad
    #[default]
    Conventional,
    /// 0-9 and a-f
    Literal,
}

impl KeymapKind {
    pub fn keymap(self) -> Keymap {
        match self {
            KeymapKind::Conventional => Keymap::conventional(),
            KeymapKind::Literal => Keymap::literal(),
        }
    }
}

/// Everything needed to set up and drive one emulation session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub program: PathBuf,
    pub cycle_hz: u32,
    pub keymap: KeymapKind,
    pub mute: bool,
    pub seed: Option<u64>,
    /// stop after this many cycles; None runs until cancelled
    pub max_cycles: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            program: PathBuf::new(),
            cycle_hz: DEFAULT_CYCLE_HZ,
            keymap: KeymapKind::default(),
            mute: false,
            seed: None,
            max_cycles: None,
        }
    }
}

impl Settings {
    /// time between cycles; a zero rate means don't wait at all
    pub fn cycle_period(&self) -> Duration {
        match self.cycle_hz {
            0 => Duration::ZERO,
            hz => Duration::from_secs(1) / hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period() {
        let s = Settings::default();
        assert_eq!(s.cycle_period(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_unthrottled() {
        let s = Settings {
            cycle_hz: 0,
            ..Settings::default()
        };
        assert_eq!(s.cycle_period(), Duration::ZERO);
    }

    #[test]
    fn test_keymap_kinds() {
        assert_eq!(KeymapKind::default().keymap(), Keymap::conventional());
        assert_eq!(KeymapKind::Literal.keymap().get('a'), Some(0x0a));
        assert_eq!(KeymapKind::Conventional.keymap().get('a'), Some(0x07));
    }
}
