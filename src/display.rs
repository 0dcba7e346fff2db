use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const CHIP8_SCREEN_WIDTH: usize = 64;
pub const CHIP8_SCREEN_HEIGHT: usize = 32;

/// the 64x32 monochrome screen, row-major. the interpreter XORs sprites into
/// it and hands it to a `Display` to show
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [bool; CHIP8_SCREEN_WIDTH * CHIP8_SCREEN_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [false; CHIP8_SCREEN_WIDTH * CHIP8_SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// coordinates wrap around both edges
    fn index(x: usize, y: usize) -> usize {
        (x % CHIP8_SCREEN_WIDTH) + (y % CHIP8_SCREEN_HEIGHT) * CHIP8_SCREEN_WIDTH
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::index(x, y)]
    }

    /// invert one pixel. returns true if it was on and is now off, i.e. a
    /// collision
    pub fn flip(&mut self, x: usize, y: usize) -> bool {
        let px = &mut self.pixels[Self::index(x, y)];
        *px = !*px;
        !*px
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// where finished frames go. the interpreter presents through this and
/// never knows what kind of screen is on the other end
pub trait Display {
    /// show the current contents of the frame buffer
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error>;
}

// store useful metadata about the screen
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coords of every lit pixel. y runs downwards on the chip8 and
    /// upwards on the canvas, hence the negation
    fn lit_points(&self, pixels: &[bool]) -> Vec<(f64, f64)> {
        let w = self.0;
        pixels
            .iter()
            .take(self.pixel_count())
            .enumerate()
            .filter(|(_, &px)| px)
            .map(|(count, _)| ((count % w) as f64, -((count / w) as f64)))
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm. the
/// terminal itself (raw mode, alternate screen) is set up by the input side
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(CHIP8_SCREEN_WIDTH, CHIP8_SCREEN_HEIGHT),
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        let resolution = &self.resolution;
        let lit = resolution.lit_points(frame.pixels());

        // one terminal cell per chip8 pixel, inside a border
        self.terminal.draw(|f| {
            let area = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16)
                .intersection(f.size());

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("chip8-vm")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, area);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; keeps a copy of the last frame
#[derive(Default)]
pub struct DummyDisplay {
    pub frames_drawn: usize,
    pub last_frame: Option<FrameBuffer>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        self.frames_drawn += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_points_blank_screen() {
        let r = Resolution(64, 32);
        assert!(r.lit_points(FrameBuffer::new().pixels()).is_empty());
    }

    #[test]
    fn test_points_coords() {
        let r = Resolution(64, 32);
        let mut fb = FrameBuffer::new();
        fb.flip(3, 2);
        fb.flip(63, 31);
        assert_eq!(r.lit_points(fb.pixels()), vec![(3.0, -2.0), (63.0, -31.0)]);
    }

    // FrameBuffer tests
    #[test]
    fn test_flip_reports_collision() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.flip(10, 5));
        assert!(fb.get(10, 5));
        assert!(fb.flip(10, 5));
        assert!(!fb.get(10, 5));
    }

    #[test]
    fn test_flip_wraps() {
        let mut fb = FrameBuffer::new();
        fb.flip(64, 32);
        assert!(fb.get(0, 0));
        fb.flip(65, 33);
        assert!(fb.get(1, 1));
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new();
        fb.flip(1, 1);
        fb.flip(63, 31);
        fb.clear();
        assert!(fb.pixels().iter().all(|&px| !px));
    }

    #[test]
    fn test_dummy_display_keeps_last_frame() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        let mut fb = FrameBuffer::new();
        fb.flip(2, 2);
        d.draw(&fb)?;
        assert_eq!(d.frames_drawn, 1);
        assert!(d.last_frame.as_ref().map_or(false, |f| f.get(2, 2)));
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. needs a real terminal to draw into
    fn test_draw_blank_frame() -> Result<(), io::Error> {
        let mut d = MonoTermDisplay::new()?;
        d.draw(&FrameBuffer::new())
    }
}
