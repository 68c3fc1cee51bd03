use crate::error::Chip8Error;

/// The tone generator. The machine only says when the sound timer is
/// running; making a noise about it is up to the implementation.
pub trait Sound {
    fn start(&mut self) -> Result<(), Chip8Error>;
    fn stop(&mut self) -> Result<(), Chip8Error>;
    fn is_beeping(&self) -> bool;

    /// start or stop so the tone matches `on`, doing nothing if it already does
    fn set(&mut self, on: bool) -> Result<(), Chip8Error> {
        match (on, self.is_beeping()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => Ok(()),
        }
    }
}

/// two octaves above middle C
pub const DEFAULT_PITCH_HZ: u16 = 2093;

/// PC speaker beeper
pub struct SimpleBeep {
    pitch: u16,
    on: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        Self::with_pitch(DEFAULT_PITCH_HZ)
    }

    pub fn with_pitch(pitch: u16) -> Self {
        SimpleBeep { pitch, on: false }
    }

    fn speaker(&mut self, pitch: u16) -> Result<(), Chip8Error> {
        beep::beep(pitch).map_err(|e| Chip8Error::Sound(e.to_string()))?;
        self.on = pitch != 0;
        Ok(())
    }
}

impl Drop for SimpleBeep {
    fn drop(&mut self) {
        if self.on {
            if let Err(e) = self.stop() {
                log::error!("couldn't silence speaker: {}", e);
            }
        }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn start(&mut self) -> Result<(), Chip8Error> {
        self.speaker(self.pitch)
    }

    fn stop(&mut self) -> Result<(), Chip8Error> {
        // zero silences the speaker
        self.speaker(0)
    }

    fn is_beeping(&self) -> bool {
        self.on
    }
}

/// Silence that still remembers whether it should be sounding, and how many
/// times it was asked to start.
#[derive(Debug, Default)]
pub struct Mute {
    on: bool,
    pub starts: usize,
}

impl Mute {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sound for Mute {
    fn start(&mut self) -> Result<(), Chip8Error> {
        self.on = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Chip8Error> {
        self.on = false;
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_tracks_state() -> Result<(), Chip8Error> {
        let mut m = Mute::new();
        assert!(!m.is_beeping());
        m.start()?;
        assert!(m.is_beeping());
        m.stop()?;
        assert!(!m.is_beeping());
        Ok(())
    }

    #[test]
    fn test_set_only_acts_on_change() -> Result<(), Chip8Error> {
        let mut m = Mute::new();
        m.set(true)?;
        m.set(true)?;
        assert_eq!(m.starts, 1);
        m.set(false)?;
        assert!(!m.is_beeping());
        m.set(true)?;
        assert_eq!(m.starts, 2);
        Ok(())
    }

    #[test]
    fn test_beeper_starts_silent() {
        assert!(!SimpleBeep::default().is_beeping());
        assert!(!SimpleBeep::with_pitch(440).is_beeping());
    }
}
