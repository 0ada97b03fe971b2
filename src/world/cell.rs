/// Side faces of a cell, packed into a u8 mask.
/// North is +z, East is +x.
pub mod face_flags {
    pub const NONE: u8 = 0;
    pub const NORTH: u8 = 1 << 0;
    pub const EAST: u8 = 1 << 1;
    pub const SOUTH: u8 = 1 << 2;
    pub const WEST: u8 = 1 << 3;
    pub const ALL_SIDES: u8 = NORTH | EAST | SOUTH | WEST;
}

/// One horizontal side of a cell with its grid step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    North,
    East,
    South,
    West,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::North, Face::East, Face::South, Face::West];

    pub fn flag(self) -> u8 {
        match self {
            Face::North => face_flags::NORTH,
            Face::East => face_flags::EAST,
            Face::South => face_flags::SOUTH,
            Face::West => face_flags::WEST,
        }
    }

    /// Column step (dx, dz) towards the neighbour on this side
    pub fn step(self) -> (i32, i32) {
        match self {
            Face::North => (0, 1),
            Face::East => (1, 0),
            Face::South => (0, -1),
            Face::West => (-1, 0),
        }
    }
}

/// One floor of a column.
///
/// Offset and thickness are fixed at construction. Only the `active` and
/// `collider_present` flags change while the world runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    x: u32,
    z: u32,
    floor: u32,
    offset: i32,
    thickness: i32,
    active: bool,
    collider_present: bool,
    faces: u8,
}

impl Cell {
    /// Create a cell, clamping negative thickness to a hole
    pub fn new(x: u32, z: u32, floor: u32, offset: i32, thickness: i32) -> Self {
        let thickness = thickness.max(0);
        let solid = thickness > 0;
        Self {
            x,
            z,
            floor,
            offset,
            thickness,
            active: solid,
            collider_present: false,
            faces: if solid { face_flags::ALL_SIDES } else { face_flags::NONE },
        }
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn z(&self) -> u32 {
        self.z
    }

    #[inline]
    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// Base height in height units
    #[inline]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    #[inline]
    pub fn thickness(&self) -> i32 {
        self.thickness
    }

    #[inline]
    pub fn top_height(&self) -> i32 {
        self.offset + self.thickness
    }

    /// Zero-thickness cells are permanent holes
    #[inline]
    pub fn is_hole(&self) -> bool {
        self.thickness == 0
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn collider_present(&self) -> bool {
        self.collider_present
    }

    /// Side faces still present after occlusion culling
    #[inline]
    pub fn faces(&self) -> u8 {
        self.faces
    }

    #[inline]
    pub fn has_face(&self, face: Face) -> bool {
        self.faces & face.flag() != 0
    }

    /// Whether the cell fully covers the vertical span of `other`
    pub fn covers(&self, other: &Cell) -> bool {
        !self.is_hole() && self.offset <= other.offset && self.top_height() >= other.top_height()
    }

    /// Show or hide the cell. Holes stay inactive; returns the resulting state.
    pub(crate) fn set_active(&mut self, active: bool) -> bool {
        self.active = active && !self.is_hole();
        if !self.active {
            self.collider_present = false;
        }
        self.active
    }

    /// Returns true if the flag changed
    pub(crate) fn set_collider(&mut self, present: bool) -> bool {
        let present = present && self.active;
        let changed = self.collider_present != present;
        self.collider_present = present;
        changed
    }

    pub(crate) fn remove_face(&mut self, face: Face) {
        self.faces &= !face.flag();
    }
}
