use anyhow::Context;
use crossterm::{ExecutableCommand, cursor, terminal};
use std::io::{BufWriter, Stdout, Write, stdout};

const BEGIN_FRAME: &[u8] = b"\x1b[?2026h\x1b[H\x1b[0m\x1b[?7l";
const END_FRAME: &[u8] = b"\x1b[?7h\x1b[?2026l";

/// Raw-mode alternate screen for the status HUD. Restores the terminal on
/// drop, including when setup fails halfway.
pub struct HudScreen {
    out: BufWriter<Stdout>,
}

impl HudScreen {
    pub fn open() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        let mut screen = Self {
            out: BufWriter::new(stdout()),
        };

        let out = screen.out.get_mut();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(terminal::ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;

        Ok(screen)
    }

    /// Repaints with the current terminal size.
    pub fn draw(&mut self, lines: &[String]) -> anyhow::Result<()> {
        let (cols, rows) = terminal::size().context("get terminal size")?;
        draw_lines(&mut self.out, lines, cols, rows)
    }
}

impl Drop for HudScreen {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = self.out.write_all(END_FRAME);
        let _ = self.out.write_all(b"\x1b[0m");
        let _ = self.out.flush();
        let out = self.out.get_mut();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
    }
}

/// One line per row, clipped to `cols`; rows past the last line are blanked.
pub fn draw_lines(
    out: &mut impl Write,
    lines: &[String],
    cols: u16,
    rows: u16,
) -> anyhow::Result<()> {
    out.write_all(BEGIN_FRAME)?;
    for row in 0..rows {
        write!(out, "\x1b[{};1H\x1b[2K", row + 1)?;
        if let Some(line) = lines.get(usize::from(row)) {
            let clipped: String = line.chars().take(usize::from(cols)).collect();
            out.write_all(clipped.as_bytes())?;
        }
    }
    out.write_all(END_FRAME)?;
    out.flush()?;
    Ok(())
}
