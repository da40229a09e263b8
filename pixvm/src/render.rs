use std::io::{self, Stdout, Write};

use crossterm::{
    QueueableCommand, cursor, execute,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::{PixelMemory, Renderer};

/// Discards frames, counting them.
#[derive(Debug, Default)]
pub struct NullRenderer {
    presented: u64,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Renderer for NullRenderer {
    fn present(&mut self, _memory: &PixelMemory) {
        self.presented += 1;
    }
}

/// Draws the grid into the terminal, two pixels per cell using an upper
/// half block, downsampled to whatever size the terminal has.
pub struct TerminalRenderer {
    out: Stdout,
}

impl TerminalRenderer {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(out, cursor::Hide, Clear(ClearType::All))?;
        Ok(Self { out })
    }

    fn draw(&mut self, memory: &PixelMemory) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let (cols, rows) = (cols.max(1) as u64, rows.max(1) as u64);
        let (width, height) = (memory.width() as u64, memory.height() as u64);
        let sample = |col: u64, half_row: u64| {
            let x = col * width / cols;
            let y = half_row * height / (2 * rows);
            memory
                .word_at(x as u32, y as u32)
                .map_or(Color::Black, word_color)
        };

        for row in 0..rows {
            self.out.queue(cursor::MoveTo(0, row as u16))?;
            for col in 0..cols {
                self.out
                    .queue(SetForegroundColor(sample(col, 2 * row)))?
                    .queue(SetBackgroundColor(sample(col, 2 * row + 1)))?
                    .queue(Print('▀'))?;
            }
        }
        self.out.queue(ResetColor)?;
        self.out.flush()
    }
}

impl Renderer for TerminalRenderer {
    fn present(&mut self, memory: &PixelMemory) {
        if let Err(err) = self.draw(memory) {
            log::debug!("terminal present failed: {err}");
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Channel 0 is blue, 1 green, 2 red, the order the grid was first drawn in.
fn word_color(word: bytecode::Word) -> Color {
    Color::Rgb {
        r: word[2],
        g: word[1],
        b: word[0],
    }
}

/// Puts colours and the cursor back. Executors never stop on their own, so
/// the binary calls this on exit rather than waiting for a drop.
pub fn restore_terminal() {
    let mut out = io::stdout();
    let _ = execute!(out, ResetColor, cursor::Show, Print("\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renderer_counts() {
        let memory = PixelMemory::new(2, 2);
        let mut r = NullRenderer::new();
        r.present(&memory);
        r.present(&memory);
        assert_eq!(r.presented(), 2);
    }

    #[test]
    fn channels_map_to_bgr() {
        assert_eq!(
            word_color([1, 2, 3]),
            Color::Rgb { r: 3, g: 2, b: 1 }
        );
    }
}
