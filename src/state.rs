use crate::geometry::Face;

/// Orientation of a surface-bound molecule.
///
/// `Front` and `Back` molecules sit on the named face of their panel. `Up`
/// and `Down` are generic bound states that keep whichever face they were
/// placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundState {
    Front,
    Back,
    Up,
    Down,
}

impl BoundState {
    pub const ALL: [Self; 4] = [Self::Front, Self::Back, Self::Up, Self::Down];
    pub const COUNT: usize = 4;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The face this state pins the molecule to, if any.
    #[must_use]
    pub fn face(self) -> Option<Face> {
        match self {
            Self::Front => Some(Face::Front),
            Self::Back => Some(Face::Back),
            Self::Up | Self::Down => None,
        }
    }

    /// State seen from the other side of the panel.
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
            other => other,
        }
    }
}

/// Free or bound state of a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MolState {
    Solution,
    Bound(BoundState),
}

impl MolState {
    pub const COUNT: usize = 1 + BoundState::COUNT;
    pub const ALL: [Self; 5] = [
        Self::Solution,
        Self::Bound(BoundState::Front),
        Self::Bound(BoundState::Back),
        Self::Bound(BoundState::Up),
        Self::Bound(BoundState::Down),
    ];

    /// Row index in per-state tables. Solution is 0.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Solution => 0,
            Self::Bound(b) => 1 + b.index(),
        }
    }

    #[must_use]
    pub fn is_bound(self) -> bool {
        matches!(self, Self::Bound(_))
    }

    #[must_use]
    pub fn bound(self) -> Option<BoundState> {
        match self {
            Self::Solution => None,
            Self::Bound(b) => Some(b),
        }
    }
}

/// Origin or destination of a surface transition.
///
/// A free molecule is identified by the face it is on, a bound molecule by
/// its bound state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Solution(Face),
    Bound(BoundState),
}

impl Site {
    pub const COUNT: usize = 2 + BoundState::COUNT;
    pub const ALL: [Self; 6] = [
        Self::Solution(Face::Front),
        Self::Solution(Face::Back),
        Self::Bound(BoundState::Front),
        Self::Bound(BoundState::Back),
        Self::Bound(BoundState::Up),
        Self::Bound(BoundState::Down),
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Solution(face) => face.index(),
            Self::Bound(b) => 2 + b.index(),
        }
    }
}
