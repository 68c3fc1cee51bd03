use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// how many keypresses are remembered before the oldest are dropped
pub const KEY_BUFFER_CAPACITY: usize = 8;

/// map of chars read from the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// which host key means which COSMAC key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keymap(HashMap<char, u8>);

impl Keymap {
    pub fn conventional() -> Self {
        Keymap(HashMap::from(CHIP8_CONVENTIONAL_KEYMAP))
    }

    pub fn literal() -> Self {
        Keymap(HashMap::from(CHIP8_LITERAL_KEYMAP))
    }

    pub fn get(&self, symbol: char) -> Option<u8> {
        self.0.get(&symbol).copied()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::conventional()
    }
}

/// Bounded queue of raw keypresses, read by the CPU.
///
/// Raw symbols go in unmapped; mapping happens on the way out so unmapped
/// symbols are silently consumed by [`KeyInput::read_key`]. The queue sits
/// behind a mutex so a [`KeySender`] on another thread can push while the
/// CPU is mid-cycle.
pub struct KeyInput {
    buffer: Arc<Mutex<VecDeque<char>>>,
    keymap: Keymap,
    capacity: usize,
}

/// a cloneable handle that can only push keys
#[derive(Clone)]
pub struct KeySender {
    buffer: Arc<Mutex<VecDeque<char>>>,
    capacity: usize,
}

fn push_bounded(
    mut buffer: MutexGuard<'_, VecDeque<char>>,
    capacity: usize,
    symbols: impl IntoIterator<Item = char>,
) {
    buffer.extend(symbols);
    let excess = buffer.len().saturating_sub(capacity);
    if excess > 0 {
        log::debug!("key buffer full, dropping {} oldest", excess);
        buffer.drain(..excess);
    }
}

fn lock(buffer: &Mutex<VecDeque<char>>) -> MutexGuard<'_, VecDeque<char>> {
    // a panic elsewhere can't leave a VecDeque half-updated
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl KeyInput {
    pub fn new(keymap: Keymap) -> Self {
        Self::with_capacity(keymap, KEY_BUFFER_CAPACITY)
    }

    pub fn with_capacity(keymap: Keymap, capacity: usize) -> Self {
        KeyInput {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity + 1))),
            keymap,
            capacity,
        }
    }

    /// hand out a pusher for the input-polling side
    pub fn sender(&self) -> KeySender {
        KeySender {
            buffer: Arc::clone(&self.buffer),
            capacity: self.capacity,
        }
    }

    /// queue raw symbols, keeping only the newest `capacity`
    pub fn push(&self, symbols: impl IntoIterator<Item = char>) {
        push_bounded(lock(&self.buffer), self.capacity, symbols)
    }

    /// pop the oldest mapped key, throwing away any unmapped symbols ahead
    /// of it. never blocks.
    pub fn read_key(&self) -> Option<u8> {
        let mut buffer = lock(&self.buffer);
        while let Some(symbol) = buffer.pop_front() {
            match self.keymap.get(symbol) {
                Some(key) => return Some(key),
                None => log::debug!("can't map {:?} to a COSMAC key", symbol),
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        lock(&self.buffer).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeySender {
    pub fn push(&self, symbols: impl IntoIterator<Item = char>) {
        push_bounded(lock(&self.buffer), self.capacity, symbols)
    }
}

/// what the host wants after polling for input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Reads keypresses from the host and forwards them to the machine.
pub trait Input {
    /// deliver any pending keypresses, without blocking
    fn poll_keys(&mut self, keys: &KeySender) -> Result<Control, io::Error>;
}

/// Keep delivering keys until `cancel` is set or the input asks to quit,
/// which also sets `cancel`. Meant to run on its own thread.
pub fn forward_keys(
    mut input: impl Input,
    keys: KeySender,
    cancel: &AtomicBool,
) -> Result<(), io::Error> {
    while !cancel.load(Ordering::Relaxed) {
        match input.poll_keys(&keys) {
            Ok(Control::Continue) => {}
            Ok(Control::Quit) => cancel.store(true, Ordering::Relaxed),
            Err(e) => {
                cancel.store(true, Ordering::Relaxed);
                return Err(e);
            }
        }
    }
    Ok(())
}

/// keyboard input from the terminal, read via crossterm in raw mode
pub struct StdinInput {
    timeout: Duration,
}

impl StdinInput {
    /// `timeout` is how long each poll waits for the first event
    pub fn new(timeout: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput { timeout })
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("couldn't restore terminal: {}", e);
        }
    }
}

impl Input for StdinInput {
    fn poll_keys(&mut self, keys: &KeySender) -> Result<Control, io::Error> {
        let mut timeout = self.timeout;
        while poll(timeout)? {
            timeout = Duration::ZERO;
            match read()? {
                Event::Key(evt) => match evt.code {
                    // raw mode swallows SIGINT
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(Control::Quit)
                    }
                    KeyCode::Char(key) => keys.push([key.to_ascii_lowercase()]),
                    KeyCode::Esc => return Ok(Control::Quit),
                    _ => log::debug!("ignoring key event {:?}", evt.code),
                },
                other => log::trace!("ignoring event {:?}", other),
            }
        }
        Ok(Control::Continue)
    }
}

/// Input implementation for testing and headless runs: hands over a fixed
/// script of keypresses one per poll, then optionally quits.
pub struct DummyInput {
    script: VecDeque<char>,
    quit_when_done: bool,
}

impl DummyInput {
    pub fn new(keys: &str) -> Self {
        DummyInput {
            script: keys.chars().collect(),
            quit_when_done: false,
        }
    }

    pub fn quit_when_done(mut self) -> Self {
        self.quit_when_done = true;
        self
    }
}

impl Input for DummyInput {
    fn poll_keys(&mut self, keys: &KeySender) -> Result<Control, io::Error> {
        match self.script.pop_front() {
            Some(key) => keys.push([key]),
            None if self.quit_when_done => return Ok(Control::Quit),
            None => {}
        }
        Ok(Control::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_read_empty() {
        let k = KeyInput::new(Keymap::default());
        assert_eq!(k.read_key(), None);
    }

    #[test]
    fn test_read_once() {
        let k = KeyInput::new(Keymap::default());
        k.push(['q']);
        assert_eq!(k.read_key(), Some(0x4));
        assert_eq!(k.read_key(), None);
        assert!(k.is_empty());
    }

    #[test]
    fn test_conventional_keymap() {
        let k = KeyInput::new(Keymap::conventional());
        k.push("1234".chars());
        assert_eq!(k.read_key(), Some(0x1));
        assert_eq!(k.read_key(), Some(0x2));
        assert_eq!(k.read_key(), Some(0x3));
        assert_eq!(k.read_key(), Some(0xc));
        for (symbol, code) in CHIP8_CONVENTIONAL_KEYMAP {
            k.push([symbol]);
            assert_eq!(k.read_key(), Some(code));
        }
    }

    #[test]
    fn test_literal_keymap() {
        let k = KeyInput::new(Keymap::literal());
        k.push("0af".chars());
        assert_eq!(k.read_key(), Some(0x0));
        assert_eq!(k.read_key(), Some(0xa));
        assert_eq!(k.read_key(), Some(0xf));
        k.push(['x']);
        assert_eq!(k.read_key(), None);
    }

    #[test]
    fn test_unmapped_skipped_and_consumed() {
        let k = KeyInput::new(Keymap::default());
        k.push("p1".chars());
        assert_eq!(k.read_key(), Some(0x1));

        k.push("pp".chars());
        assert_eq!(k.read_key(), None);
        assert!(k.is_empty());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let k = KeyInput::with_capacity(Keymap::literal(), 3);
        k.push("12345".chars());
        assert_eq!(k.len(), 3);
        assert_eq!(k.read_key(), Some(3));
        assert_eq!(k.read_key(), Some(4));
        assert_eq!(k.read_key(), Some(5));
    }

    #[test]
    fn test_default_capacity() {
        let k = KeyInput::new(Keymap::literal());
        k.push("0123456789".chars());
        assert_eq!(k.len(), KEY_BUFFER_CAPACITY);
        assert_eq!(k.read_key(), Some(2));
    }

    #[test]
    fn test_sender_from_other_thread() {
        let k = KeyInput::new(Keymap::default());
        let sender = k.sender();
        thread::spawn(move || sender.push(['v']))
            .join()
            .unwrap();
        assert_eq!(k.read_key(), Some(0xf));
    }

    #[test]
    fn test_forward_keys_until_quit() -> Result<(), io::Error> {
        let k = KeyInput::new(Keymap::default());
        let cancel = AtomicBool::new(false);
        forward_keys(DummyInput::new("1q").quit_when_done(), k.sender(), &cancel)?;
        assert!(cancel.load(Ordering::Relaxed));
        assert_eq!(k.read_key(), Some(0x1));
        assert_eq!(k.read_key(), Some(0x4));
        Ok(())
    }

    #[test]
    fn test_forward_keys_already_cancelled() -> Result<(), io::Error> {
        let k = KeyInput::new(Keymap::default());
        let cancel = AtomicBool::new(true);
        forward_keys(DummyInput::new("1"), k.sender(), &cancel)?;
        assert!(k.is_empty());
        Ok(())
    }

    #[test]
    fn test_dummy_input_script() -> Result<(), io::Error> {
        let k = KeyInput::new(Keymap::default());
        let mut input = DummyInput::new("wx").quit_when_done();
        assert_eq!(input.poll_keys(&k.sender())?, Control::Continue);
        assert_eq!(input.poll_keys(&k.sender())?, Control::Continue);
        assert_eq!(input.poll_keys(&k.sender())?, Control::Quit);
        assert_eq!(k.read_key(), Some(0x5));
        assert_eq!(k.read_key(), Some(0x0));
        Ok(())
    }
}
