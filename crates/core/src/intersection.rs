//! Grid intersections and the sorted per-axis lists that hold them.
//!
//! Each place where a ring crosses a tile side is recorded once, in the tile
//! that owns that side (its south or west side). The intersection links the
//! fragment on each side of the crossing, so a walk can hop from one tile to
//! its neighbour, and it sits in a doubly linked list ordered by position
//! along the side, so a walk can follow the tile border.
//!
//! All intersections live in one [`IntersectionArena`] and are addressed by
//! [`IntersectionId`]; tiles only store list heads.

/// Index of an intersection in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntersectionId(usize);

impl IntersectionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Reference to a fragment of one tile together with the traversal direction
/// of the crossing it is attached to.
///
/// A crossing is *forward* when the ring moves from south to north or from
/// west to east through the owning side, and *reversed* otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRef {
    pub index: usize,
    pub reversed: bool,
}

impl FragmentRef {
    pub fn forward(index: usize) -> Self {
        Self {
            index,
            reversed: false,
        }
    }

    pub fn backward(index: usize) -> Self {
        Self {
            index,
            reversed: true,
        }
    }

    /// Fragment index if the crossing is forward
    pub fn if_forward(self) -> Option<usize> {
        (!self.reversed).then_some(self.index)
    }

    /// Fragment index if the crossing is reversed
    pub fn if_reversed(self) -> Option<usize> {
        self.reversed.then_some(self.index)
    }
}

/// One crossing of a ring through a tile side
#[derive(Debug, Clone, PartialEq)]
pub struct GridIntersection {
    /// Fraction of the side length, in `[0, 1)`
    pub position: f64,
    /// Fragment in the tile owning the side
    pub inside: FragmentRef,
    /// Fragment in the south or west neighbour
    pub outside: FragmentRef,
    prev: Option<IntersectionId>,
    next: Option<IntersectionId>,
}

impl GridIntersection {
    pub fn new(position: f64, inside: FragmentRef, outside: FragmentRef) -> Self {
        Self {
            position,
            inside,
            outside,
            prev: None,
            next: None,
        }
    }

    /// Neighbour with a smaller or equal position
    pub fn prev(&self) -> Option<IntersectionId> {
        self.prev
    }

    /// Neighbour with a greater or equal position
    pub fn next(&self) -> Option<IntersectionId> {
        self.next
    }
}

/// Owner of every intersection of a tiled polygon
#[derive(Debug, Clone, Default)]
pub struct IntersectionArena {
    items: Vec<GridIntersection>,
}

impl IntersectionArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: IntersectionId) -> &GridIntersection {
        &self.items[id.0]
    }

    /// Add `intersection` to the list starting at `head`, before the first
    /// element with a greater position. Equal positions keep insertion order.
    pub fn insert_sorted(
        &mut self,
        head: &mut Option<IntersectionId>,
        intersection: GridIntersection,
    ) -> IntersectionId {
        let id = IntersectionId(self.items.len());
        let position = intersection.position;
        self.items.push(intersection);

        let mut before = None;
        let mut cursor = *head;
        while let Some(current) = cursor {
            let item = &self.items[current.0];
            if item.position > position {
                break;
            }
            before = Some(current);
            cursor = item.next;
        }

        self.items[id.0].prev = before;
        self.items[id.0].next = cursor;
        match before {
            Some(before) => self.items[before.0].next = Some(id),
            None => *head = Some(id),
        }
        if let Some(after) = cursor {
            self.items[after.0].prev = Some(id);
        }

        id
    }

    /// Last element of the list starting at `head`
    pub fn last_of(&self, head: Option<IntersectionId>) -> Option<IntersectionId> {
        self.list(head).last()
    }

    /// Iterate the list starting at `head` in position order
    pub fn list(&self, head: Option<IntersectionId>) -> impl Iterator<Item = IntersectionId> + '_ {
        std::iter::successors(head, move |id| self.items[id.0].next)
    }
}
