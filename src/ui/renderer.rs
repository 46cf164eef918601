/// Presentation layer: double-buffered, row-diff terminal renderer.
///
/// How it works:
///   1. `compose_frame` turns the world into lines of text (pure, testable)
///   2. Each line is compared with the one drawn last frame
///   3. Only changed lines are rewritten, batched with `queue!`
///   4. One flush per frame, then the new frame becomes the back buffer
///
/// Every grid cell is one double-width glyph, i.e. two terminal columns.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Pos;
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, World};

// ── Glyphs ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Glyph {
    Explosion,
    Player,
    Door,
    Enemy,
    Fireball,
    Tree,
    Open,
}

impl Glyph {
    pub fn as_str(self) -> &'static str {
        match self {
            Glyph::Explosion => "💥",
            Glyph::Player => "🧙",
            Glyph::Door => "🚪",
            Glyph::Enemy => "👻",
            Glyph::Fireball => "🔥",
            Glyph::Tree => "🌲",
            Glyph::Open => "・",
        }
    }
}

/// What is drawn on `pos`: explosion > player > door > enemy > fireball > terrain.
/// Retired entities are invisible.
pub fn glyph_at(world: &World, pos: Pos) -> Glyph {
    if world.explosion_at(pos) {
        Glyph::Explosion
    } else if world.player.occupies(pos) {
        Glyph::Player
    } else if world.door.occupies(pos) {
        Glyph::Door
    } else if world.enemy_at(pos) {
        Glyph::Enemy
    } else if world.fireball_at(pos) {
        Glyph::Fireball
    } else {
        match world.grid.tile_at(pos) {
            Some(Tile::Tree) => Glyph::Tree,
            _ => Glyph::Open,
        }
    }
}

// ── Frame composition ──

pub const MSG_DIED: &str = "☠️ You died ☠️";
pub const MSG_PASSED: &str = "🎉 Level passed 🎉";
const HELP: &str = "WASD/arrows: move   Space: fire ↑   q/Esc: quit";

/// One output row with its foreground colour.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    pub text: String,
    pub fg: Color,
}

impl Line {
    fn plain(text: String) -> Self {
        Line { text, fg: Color::Reset }
    }
}

/// Build the whole frame: map rows, a blank spacer, the status line, then
/// either the outcome message or the key help.
pub fn compose_frame(world: &World) -> Vec<Line> {
    let mut lines = Vec::with_capacity(world.grid.height() + 3);

    for r in 0..world.grid.height() {
        let row: String = (0..world.grid.width())
            .map(|c| glyph_at(world, Pos::new(r as i32, c as i32)).as_str())
            .collect();
        lines.push(Line::plain(row));
    }

    lines.push(Line::plain(String::new()));
    lines.push(Line {
        text: format!(
            " Tick {:<5}  Enemies {:<3}  Fireballs {:<3}",
            world.tick,
            world.live_enemies(),
            world.live_fireballs(),
        ),
        fg: Color::Cyan,
    });

    lines.push(match world.phase {
        Phase::GameOver => Line { text: format!(" {MSG_DIED}"), fg: Color::Red },
        Phase::LevelPassed => Line { text: format!(" {MSG_PASSED}"), fg: Color::Green },
        Phase::Playing => Line { text: format!(" {HELP}"), fg: Color::DarkGrey },
    });

    lines
}

// ── Renderer ──

pub struct Renderer<W: Write = BufWriter<io::Stdout>> {
    writer: W,
    back: Vec<Line>,
    term_size: Option<(u16, u16)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer::with_writer(BufWriter::with_capacity(16384, io::stdout()))
    }
}

impl<W: Write> Renderer<W> {
    pub fn with_writer(writer: W) -> Self {
        Renderer {
            writer,
            back: Vec::new(),
            term_size: None,
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn render(&mut self, world: &World) -> io::Result<()> {
        // First frame or resize: clear and repaint everything.
        let size = terminal::size().unwrap_or((80, 24));
        if self.term_size != Some(size) {
            self.term_size = Some(size);
            self.back.clear();
            queue!(self.writer, Clear(ClearType::All))?;
        }

        let front = compose_frame(world);
        for y in changed_rows(&self.back, &front) {
            let line = &front[y];
            queue!(
                self.writer,
                MoveTo(0, y as u16),
                SetForegroundColor(line.fg),
                Print(&line.text),
                Clear(ClearType::UntilNewLine),
            )?;
        }
        // rows left over from a taller previous frame
        for y in front.len()..self.back.len() {
            queue!(self.writer, MoveTo(0, y as u16), Clear(ClearType::CurrentLine))?;
        }
        queue!(self.writer, SetForegroundColor(Color::Reset))?;
        self.writer.flush()?;

        self.back = front;
        Ok(())
    }
}

/// Indices of rows in `front` that differ from `back`.
fn changed_rows(back: &[Line], front: &[Line]) -> Vec<usize> {
    front
        .iter()
        .enumerate()
        .filter(|(y, line)| back.get(*y) != Some(*line))
        .map(|(y, _)| y)
        .collect()
}
