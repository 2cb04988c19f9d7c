//! Preview grid layout.
//!
//! A [`LayoutContext`] belongs to exactly one session: its cursor and its
//! row containers are created with the session and dropped with it, so
//! two sessions never see each other's positions.

mod container;
mod cursor;

pub use container::{ContainerCache, Surface};
pub use cursor::{GridPosition, LayoutCursor};

use std::num::NonZeroUsize;

/// Cursor plus row containers of one session.
#[derive(Debug)]
pub struct LayoutContext<S> {
    cursor: LayoutCursor,
    containers: ContainerCache<S>,
}

impl<S> LayoutContext<S> {
    pub const fn new(max_columns: NonZeroUsize) -> Self {
        Self {
            cursor: LayoutCursor::new(max_columns),
            containers: ContainerCache::new(),
        }
    }

    /// Take the next grid slot and return it with its row's container.
    pub fn place(&mut self, make: impl FnOnce(usize) -> S) -> (GridPosition, &mut S) {
        let position = self.cursor.next_position();
        let container = self.containers.get_or_create(position.row, make);
        (position, container)
    }

    pub const fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub const fn containers(&self) -> &ContainerCache<S> {
        &self.containers
    }

    pub const fn max_columns(&self) -> NonZeroUsize {
        self.cursor.max_columns()
    }
}
