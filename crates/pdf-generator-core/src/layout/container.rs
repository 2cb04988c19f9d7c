use std::collections::BTreeMap;

use crate::session::AcceptedImage;

/// Display surface for one grid row.
///
/// Front ends implement this for whatever holds a row of previews. `()` is
/// the surface for front ends without a preview.
pub trait Surface {
    /// Create the surface for `row`, `columns` cells wide.
    fn create(row: usize, columns: usize) -> Self;

    /// Show an accepted image in the given column of this row.
    fn show(&mut self, column: usize, image: &AcceptedImage);
}

impl Surface for () {
    fn create(_row: usize, _columns: usize) -> Self {}

    fn show(&mut self, _column: usize, _image: &AcceptedImage) {}
}

/// Lazily created row surfaces, keyed by row index.
///
/// A row's surface is created on first reference and reused afterwards.
/// There is no eviction: the cache lives exactly as long as its owner.
#[derive(Debug)]
pub struct ContainerCache<S> {
    rows: BTreeMap<usize, S>,
}

impl<S> ContainerCache<S> {
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    pub fn get_or_create(&mut self, row: usize, make: impl FnOnce(usize) -> S) -> &mut S {
        self.rows.entry(row).or_insert_with(|| {
            tracing::debug!("Creating container for row {}", row);
            make(row)
        })
    }

    pub fn get(&self, row: usize) -> Option<&S> {
        self.rows.get(&row)
    }

    /// Rows in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &S)> {
        self.rows.iter().map(|(row, surface)| (*row, surface))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<S> Default for ContainerCache<S> {
    fn default() -> Self {
        Self::new()
    }
}
