//! Shelf packing with per-shelf free lists.
//!
//! Glyphs are placed left to right on horizontal shelves. The last shelf is
//! still open and grows to the tallest glyph placed on it; earlier shelves
//! have a fixed height. Evicted rectangles go back to their shelf as free
//! spans and are reused before new space is consumed. A shelf that drains
//! completely merges with drained neighbours, and drained shelves at the
//! bottom are dropped, so a packer whose glyphs are all freed is empty again.

/// Footprint of one packed glyph. `width`/`height` include padding.
///
/// The shelf is identified by `y`, which stays stable while shelves above
/// or below are merged away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Allocation {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeSpan {
    x: u32,
    width: u32,
}

#[derive(Debug, Clone)]
struct Shelf {
    y: u32,
    height: u32,
    cursor_x: u32,
    free: Vec<FreeSpan>,
}

impl Shelf {
    /// Spans are merged eagerly, so a drained shelf has its cursor back at 0.
    fn is_drained(&self) -> bool {
        self.cursor_x == 0 && self.free.is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ShelfPacker {
    width: u32,
    height: u32,
    padding: u32,
    shelves: Vec<Shelf>,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
            shelves: Vec::new(),
        }
    }

    /// Whether a `width` x `height` glyph fits an empty texture.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        width + self.padding <= self.width && height + self.padding <= self.height
    }

    pub fn pack(&mut self, width: u32, height: u32) -> Option<Allocation> {
        let pw = width + self.padding;
        let ph = height + self.padding;
        if !self.fits(width, height) {
            return None;
        }

        // Free spans left by eviction
        for shelf in &mut self.shelves {
            if shelf.height < ph {
                continue;
            }
            if let Some(pos) = shelf.free.iter().position(|span| span.width >= pw) {
                let span = shelf.free[pos];
                if span.width == pw {
                    shelf.free.remove(pos);
                } else {
                    shelf.free[pos] = FreeSpan {
                        x: span.x + pw,
                        width: span.width - pw,
                    };
                }
                return Some(Allocation {
                    x: span.x,
                    y: shelf.y,
                    width: pw,
                    height: ph,
                });
            }
        }

        // Closed shelves: the shortest one that is tall enough and has room
        let last = self.shelves.len().checked_sub(1);
        let candidate = self
            .shelves
            .iter()
            .enumerate()
            .filter(|(idx, shelf)| {
                Some(*idx) != last && shelf.height >= ph && shelf.cursor_x + pw <= self.width
            })
            .min_by_key(|(_, shelf)| shelf.height)
            .map(|(idx, _)| idx);
        if let Some(idx) = candidate {
            return Some(self.place(idx, pw, ph));
        }

        // The open shelf, growing it if there is room below
        if let Some(idx) = last {
            let shelf = &self.shelves[idx];
            let fits_row = shelf.cursor_x + pw <= self.width;
            let fits_height = shelf.height >= ph || shelf.y + ph <= self.height;
            if fits_row && fits_height {
                let shelf = &mut self.shelves[idx];
                shelf.height = shelf.height.max(ph);
                return Some(self.place(idx, pw, ph));
            }
        }

        // A new shelf below the last one
        let next_y = self
            .shelves
            .last()
            .map(|shelf| shelf.y + shelf.height)
            .unwrap_or(0);
        if next_y + ph > self.height {
            return None;
        }
        self.shelves.push(Shelf {
            y: next_y,
            height: ph,
            cursor_x: 0,
            free: Vec::new(),
        });
        Some(self.place(self.shelves.len() - 1, pw, ph))
    }

    fn place(&mut self, idx: usize, pw: u32, ph: u32) -> Allocation {
        let shelf = &mut self.shelves[idx];
        let alloc = Allocation {
            x: shelf.cursor_x,
            y: shelf.y,
            width: pw,
            height: ph,
        };
        shelf.cursor_x += pw;
        alloc
    }

    /// Return an allocation's span to its shelf.
    pub fn free(&mut self, alloc: &Allocation) {
        let Some(idx) = self.shelves.iter().position(|shelf| shelf.y == alloc.y) else {
            return;
        };
        let shelf = &mut self.shelves[idx];

        let mut span = FreeSpan {
            x: alloc.x,
            width: alloc.width,
        };
        // Merge with neighbours
        shelf.free.retain(|other| {
            if other.x + other.width == span.x {
                span = FreeSpan {
                    x: other.x,
                    width: other.width + span.width,
                };
                false
            } else if span.x + span.width == other.x {
                span.width += other.width;
                false
            } else {
                true
            }
        });

        if span.x + span.width == shelf.cursor_x {
            shelf.cursor_x = span.x;
        } else {
            shelf.free.push(span);
        }

        if shelf.is_drained() {
            self.release_shelf(idx);
        }
    }

    /// Fold a drained shelf into drained neighbours, then drop drained
    /// shelves at the bottom so the space below is open again.
    fn release_shelf(&mut self, mut idx: usize) {
        if self.shelves.get(idx + 1).is_some_and(Shelf::is_drained) {
            let below = self.shelves.remove(idx + 1);
            self.shelves[idx].height += below.height;
        }
        if idx > 0 && self.shelves[idx - 1].is_drained() {
            let shelf = self.shelves.remove(idx);
            idx -= 1;
            self.shelves[idx].height += shelf.height;
        }
        while self.shelves.last().is_some_and(Shelf::is_drained) {
            self.shelves.pop();
        }
    }

    pub fn reset(&mut self) {
        self.shelves.clear();
    }

    #[cfg(test)]
    pub fn shelf_count(&self) -> usize {
        self.shelves.len()
    }
}
