// Drag pad surface: marker placement and status text
//
// The translator only needs the `GestureSurface` capabilities; the terminal
// implementation redraws the whole pad with crossterm on each flush.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::input::Point;

pub const HELP_LINE: &str = "drag with the left button to drive | q/Esc quits";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Where the drag started
    Origin,
    /// Pointer position of the last transmitted command
    Target,
}

impl Marker {
    fn glyph(self) -> char {
        match self {
            Marker::Origin => 'o',
            Marker::Target => '@',
        }
    }
}

pub trait GestureSurface {
    fn place_marker(&mut self, marker: Marker, at: Point);
    fn show_status(&mut self, text: &str);
    /// Smallest dimension of the surface; a drag this long saturates the wheels
    fn min_size(&self) -> f64;
}

/// Marker edge length for a surface: 2 * round(min_size / 20), at least 1
pub fn marker_size(min_size: f64) -> u16 {
    let size = 2.0 * (min_size / 20.0).round();
    size.clamp(1.0, u16::MAX as f64) as u16
}

/// Drag pad rendered on a terminal
pub struct TerminalSurface<W: Write> {
    out: W,
    width: u16,
    height: u16,
    origin: Option<Point>,
    target: Option<Point>,
    status: String,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, width: u16, height: u16) -> Self {
        Self {
            out,
            width,
            height,
            origin: None,
            target: None,
            status: String::new(),
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Redraw the pad and flush it to the terminal
    pub fn flush(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        let size = marker_size(self.min_size());
        for (marker, at) in [(Marker::Origin, self.origin), (Marker::Target, self.target)] {
            if let Some(at) = at {
                self.draw_marker(marker, at, size)?;
            }
        }

        for (row, line) in self.status.lines().enumerate() {
            queue!(self.out, MoveTo(0, row as u16), Print(line))?;
        }
        queue!(
            self.out,
            MoveTo(0, self.height.saturating_sub(1)),
            Print(HELP_LINE)
        )?;

        self.out.flush()
    }

    fn draw_marker(&mut self, marker: Marker, at: Point, size: u16) -> io::Result<()> {
        let half = (size / 2) as f64;
        let left = (at.x - half).max(0.0) as u16;
        let top = (at.y - half).max(0.0) as u16;
        let block: String = std::iter::repeat_n(marker.glyph(), size as usize).collect();

        for row in top..top.saturating_add(size).min(self.height) {
            let visible = self.width.saturating_sub(left) as usize;
            if visible == 0 {
                break;
            }
            let line: String = block.chars().take(visible).collect();
            queue!(self.out, MoveTo(left, row), Print(line))?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GestureSurface for TerminalSurface<W> {
    fn place_marker(&mut self, marker: Marker, at: Point) {
        match marker {
            Marker::Origin => self.origin = Some(at),
            Marker::Target => self.target = Some(at),
        }
    }

    fn show_status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn min_size(&self) -> f64 {
        self.width.min(self.height) as f64
    }
}
