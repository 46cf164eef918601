/// Entities: Player, Enemy, Door, Fireball.
/// All four share one shape; `kind` says which role an entity plays and
/// `status` says whether it is still in play.

/// Movement direction, one cell per step.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    /// (row delta, column delta)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
            Dir::Right => (0, 1),
        }
    }
}

/// Direction every new fireball travels in. Fireballs are not aimed.
pub const FIRE_DIR: Dir = Dir::Up;

/// Grid coordinate. Signed so a step off the top or left edge stays
/// representable and classifies as out of border.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub const fn new(row: i32, col: i32) -> Self {
        Pos { row, col }
    }

    /// The neighbouring cell in `dir`. No bounds check.
    pub fn step(self, dir: Dir) -> Pos {
        let (dr, dc) = dir.delta();
        Pos { row: self.row + dr, col: self.col + dc }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Player,
    Enemy,
    Door,
    Fireball,
}

/// Whether an entity still takes part in play.
///
/// Retired entities stay in their collection so indices never shift while
/// a step iterates; every query skips them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Active,
    Retired,
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub pos: Pos,
    pub kind: EntityKind,
    pub heading: Option<Dir>,
    pub status: Status,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Pos) -> Self {
        Entity { pos, kind, heading: None, status: Status::Active }
    }

    pub fn player(pos: Pos) -> Self {
        Entity::new(EntityKind::Player, pos)
    }

    pub fn enemy(pos: Pos) -> Self {
        Entity::new(EntityKind::Enemy, pos)
    }

    pub fn door(pos: Pos) -> Self {
        Entity::new(EntityKind::Door, pos)
    }

    pub fn fireball(pos: Pos, heading: Dir) -> Self {
        Entity { pos, kind: EntityKind::Fireball, heading: Some(heading), status: Status::Active }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Take this entity out of play. Idempotent.
    pub fn retire(&mut self) {
        self.status = Status::Retired;
    }

    /// Active and standing on `pos`.
    pub fn occupies(&self, pos: Pos) -> bool {
        self.is_active() && self.pos == pos
    }
}

/// One player command per tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Dir),
    Fire,
}
