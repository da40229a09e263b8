//! The radius → offset table shared by every program.
//!
//! A boundary-fill walk around the origin visits each cell of a square
//! working region once, so lower radii sit closer to the anchor along the
//! walk. Radius is the index into this walk, nothing more.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Largest working half-size. Offsets past a 4096-wide grid never resolve.
pub const MAX_REGION: u32 = 1 << 12;

/// Compass steps, starting at "up" and turning counter-clockwise.
const DIRECTIONS: [Offset; 8] = [
    Offset::new(0, -1),
    Offset::new(-1, -1),
    Offset::new(-1, 0),
    Offset::new(-1, 1),
    Offset::new(0, 1),
    Offset::new(1, 1),
    Offset::new(1, 0),
    Offset::new(1, -1),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Box<[Offset]>,
}

impl OffsetTable {
    /// Walks the square `[-half, half)²`, with `half` clamped to
    /// `2..=MAX_REGION`.
    pub fn generate(half: u32) -> Self {
        let half = half.clamp(2, MAX_REGION) as i32;
        let side = 2 * half as usize;
        let mut visited = vec![false; side * side];
        let cell = |o: Offset| {
            let row = (i64::from(o.dy) + i64::from(half)) as usize;
            let col = (i64::from(o.dx) + i64::from(half)) as usize;
            row * side + col
        };

        let mut offsets = vec![Offset::new(0, 0), Offset::new(0, 1)];
        for &o in &offsets {
            visited[cell(o)] = true;
        }

        let mut at = Offset::new(0, 1);
        'walk: loop {
            let heading = heading(at);
            for turn in 0..DIRECTIONS.len() {
                let step = DIRECTIONS[(heading + turn) % DIRECTIONS.len()];
                let next = Offset::new(at.dx + step.dx, at.dy + step.dy);
                if next.dx < -half || next.dx >= half || next.dy < -half || next.dy >= half {
                    break 'walk;
                }
                if !visited[cell(next)] {
                    visited[cell(next)] = true;
                    offsets.push(next);
                    at = next;
                    continue 'walk;
                }
            }
            // boxed in on all sides
            break;
        }

        log::debug!("offset table: {} radii over a {side}x{side} region", offsets.len());
        Self {
            offsets: offsets.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn get(&self, radius: u32) -> Option<Offset> {
        self.offsets.get(radius as usize).copied()
    }

    /// The maximum radius any program can address, exclusive.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn as_slice(&self) -> &[Offset] {
        &self.offsets
    }
}

/// Index into [`DIRECTIONS`] to start trying from, picked by the octant the
/// walk is currently in.
fn heading(at: Offset) -> usize {
    let Offset { dx, dy } = at;
    if dx >= 0 {
        if dy > dx {
            0
        } else if dy >= 0 {
            1
        } else if dx > -dy {
            2
        } else {
            3
        }
    } else if dy < dx {
        4
    } else if dy < 0 {
        5
    } else if -dx > dy {
        6
    } else {
        7
    }
}
