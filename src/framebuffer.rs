use crate::error::Chip8Error;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The CHIP-8 monochrome screen: a 64x32 grid of on/off pixels, row-major.
///
/// Coordinates wrap, so a sprite running off the right edge carries on from
/// the left one (and likewise top/bottom). The dirty flag is set by every
/// clear or draw and is only cleared by whoever presents the frame.
#[derive(Clone)]
pub struct Framebuffer {
    pixels: Box<[bool; SCREEN_WIDTH * SCREEN_HEIGHT]>,
    dirty: bool,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: Box::new([false; SCREEN_WIDTH * SCREEN_HEIGHT]),
            dirty: true,
        }
    }

    pub fn width(&self) -> usize {
        SCREEN_WIDTH
    }

    pub fn height(&self) -> usize {
        SCREEN_HEIGHT
    }

    /// turn every pixel off
    pub fn clear(&mut self) {
        self.pixels.fill(false);
        self.dirty = true;
    }

    /// XOR a sprite onto the screen with its top-left corner at (x, y).
    ///
    /// Each byte is one row, most significant bit leftmost. Returns true if
    /// any lit pixel was switched off.
    pub fn draw_sprite(&mut self, rows: &[u8], x: usize, y: usize) -> Result<bool, Chip8Error> {
        let mut collision = false;
        for (dy, row) in rows.iter().enumerate() {
            for dx in 0..8 {
                if row & (0x80 >> dx) == 0 {
                    continue;
                }
                let addr = self.addr_of(x + dx, y + dy)?;
                collision |= self.pixels[addr];
                self.pixels[addr] = !self.pixels[addr];
            }
        }
        // set even when nothing was drawn, as the real machine redraws anyway
        self.dirty = true;
        Ok(collision)
    }

    /// read a pixel, with the same wraparound as drawing
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<bool, Chip8Error> {
        Ok(self.pixels[self.addr_of(x, y)?])
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// called once the current frame has been presented
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// visit every pixel in row-major order
    pub fn each_pixel(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .map(|(addr, lit)| (addr % SCREEN_WIDTH, addr / SCREEN_WIDTH, *lit))
    }

    /// how many pixels are on
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    fn addr_of(&self, x: usize, y: usize) -> Result<usize, Chip8Error> {
        let addr = (y % SCREEN_HEIGHT) * SCREEN_WIDTH + (x % SCREEN_WIDTH);
        // can't happen after wrapping, but pixel addresses come from the program
        if addr >= self.pixels.len() {
            return Err(Chip8Error::OutOfBounds { addr });
        }
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ZERO_GLYPH: [u8; 5] = [0xf0, 0x90, 0x90, 0x90, 0xf0];

    fn lit(fb: &Framebuffer) -> Vec<(usize, usize)> {
        fb.each_pixel()
            .filter(|(_, _, on)| *on)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_new_is_blank() {
        let fb = Framebuffer::new();
        assert_eq!(fb.each_pixel().count(), 2048);
        assert_eq!(fb.lit_count(), 0);
        assert_eq!(fb.width(), 64);
        assert_eq!(fb.height(), 32);
    }

    #[test]
    fn test_draw_glyph() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        let collision = fb.draw_sprite(&ZERO_GLYPH, 0, 0)?;
        assert!(!collision);
        assert_eq!(fb.lit_count(), 14);
        for x in 0..4 {
            assert!(fb.get_pixel(x, 0)?);
            assert!(fb.get_pixel(x, 4)?);
        }
        for y in 1..4 {
            assert!(fb.get_pixel(0, y)?);
            assert!(!fb.get_pixel(1, y)?);
            assert!(!fb.get_pixel(2, y)?);
            assert!(fb.get_pixel(3, y)?);
        }
        Ok(())
    }

    #[test]
    fn test_draw_wraps_horizontally() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&ZERO_GLYPH, 62, 0)?;
        assert_eq!(
            lit(&fb)[..4],
            [(0, 0), (1, 0), (62, 0), (63, 0)]
        );
        assert!(fb.get_pixel(62, 2)?);
        assert!(fb.get_pixel(1, 2)?);
        assert!(!fb.get_pixel(63, 2)?);
        assert_eq!(fb.lit_count(), 14);
        Ok(())
    }

    #[test]
    fn test_draw_wraps_vertically() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0x80, 0x80], 5, 31)?;
        assert_eq!(lit(&fb), vec![(5, 0), (5, 31)]);
        Ok(())
    }

    #[test]
    fn test_rightmost_column_wraps_to_zero() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        // rightmost bit lands on x=64
        fb.draw_sprite(&[0x01], 57, 0)?;
        assert!(fb.get_pixel(0, 0)?);
        assert_eq!(fb.lit_count(), 1);
        Ok(())
    }

    #[test]
    fn test_collision() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&ZERO_GLYPH, 0, 0)?;
        assert!(!fb.draw_sprite(&ZERO_GLYPH, 10, 10)?);
        assert!(fb.draw_sprite(&ZERO_GLYPH, 1, 1)?);
        Ok(())
    }

    #[test]
    fn test_clear() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&ZERO_GLYPH, 0, 0)?;
        fb.mark_clean();
        fb.clear();
        assert_eq!(fb.lit_count(), 0);
        assert!(fb.is_dirty());
        Ok(())
    }

    #[test]
    fn test_empty_sprite_still_dirty() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        fb.mark_clean();
        assert!(!fb.is_dirty());
        assert!(!fb.draw_sprite(&[0x00, 0x00], 3, 3)?);
        assert!(fb.is_dirty());
        Ok(())
    }

    #[test]
    fn test_get_pixel_wraps() -> Result<(), Chip8Error> {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0x80], 0, 0)?;
        assert!(fb.get_pixel(64, 32)?);
        assert!(fb.get_pixel(128, 64)?);
        Ok(())
    }

    proptest! {
        #[test]
        fn draw_twice_restores(
            base in proptest::collection::vec(any::<u8>(), 0..16),
            rows in proptest::collection::vec(any::<u8>(), 0..16),
            x in 0usize..256,
            y in 0usize..256,
        ) {
            let mut fb = Framebuffer::new();
            fb.draw_sprite(&base, 20, 10).unwrap();
            let before = lit(&fb);
            fb.draw_sprite(&rows, x, y).unwrap();
            fb.draw_sprite(&rows, x, y).unwrap();
            prop_assert_eq!(lit(&fb), before);

            // on a blank screen, undoing a non-empty sprite always collides
            let mut blank = Framebuffer::new();
            prop_assert!(!blank.draw_sprite(&rows, x, y).unwrap());
            prop_assert_eq!(blank.draw_sprite(&rows, x, y).unwrap(), rows.iter().any(|r| *r != 0));
            prop_assert_eq!(blank.lit_count(), 0);
        }
    }
}
