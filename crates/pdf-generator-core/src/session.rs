//! Per-session generation state.
//!
//! A [`GeneratorSession`] is created at the start of a user's interaction
//! and dropped at its end. It owns the layout cursor, the row containers,
//! the accepted images (in acceptance order) and the per-file notices.

use std::num::NonZeroUsize;

use tracing::debug;

use crate::layout::{GridPosition, LayoutContext, Surface};
use crate::pdf::PageImage;
use crate::upload::UploadedImage;
use crate::validate::Notice;

/// An upload that passed validation and decoding and holds a grid slot.
#[derive(Debug, Clone)]
pub struct AcceptedImage {
    /// 0-based acceptance order within the session
    pub index: usize,
    pub position: GridPosition,
    pub image: UploadedImage,
    pub page: PageImage,
}

/// Result of validating and decoding one batch, before it touches a session.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub(crate) items: Vec<PreparedItem>,
}

#[derive(Debug)]
pub(crate) enum PreparedItem {
    Ready(UploadedImage, PageImage),
    Rejected(Notice),
}

impl PreparedBatch {
    pub fn ready_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, PreparedItem::Ready(..)))
            .count()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter_map(|item| match item {
            PreparedItem::Rejected(notice) => Some(notice),
            PreparedItem::Ready(..) => None,
        })
    }
}

/// Summary of one committed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Positions handed out in this batch, in upload order
    pub placed: Vec<GridPosition>,
    /// Notices raised in this batch, in upload order
    pub notices: Vec<Notice>,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.placed.len()
    }

    pub fn rejected(&self) -> usize {
        self.notices.len()
    }
}

/// Layout and accepted images of one user session.
///
/// `S` is the front end's row surface; see [`Surface`].
#[derive(Debug)]
pub struct GeneratorSession<S> {
    layout: LayoutContext<S>,
    accepted: Vec<AcceptedImage>,
    notices: Vec<Notice>,
}

impl<S: Surface> GeneratorSession<S> {
    pub const fn new(max_columns: NonZeroUsize) -> Self {
        Self {
            layout: LayoutContext::new(max_columns),
            accepted: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Place every prepared image in upload order and record its notices.
    ///
    /// Rejected uploads consume no grid slot.
    pub fn commit(&mut self, batch: PreparedBatch) -> BatchReport {
        let columns = self.layout.max_columns().get();
        let mut report = BatchReport::default();

        for item in batch.items {
            match item {
                PreparedItem::Ready(image, page) => {
                    let index = self.accepted.len();
                    let (position, container) = self.layout.place(|row| S::create(row, columns));
                    let accepted = AcceptedImage {
                        index,
                        position,
                        image,
                        page,
                    };
                    container.show(position.column, &accepted);
                    debug!("Placed {} at {}", accepted.image.name(), position);

                    report.placed.push(position);
                    self.accepted.push(accepted);
                }
                PreparedItem::Rejected(notice) => {
                    report.notices.push(notice.clone());
                    self.notices.push(notice);
                }
            }
        }

        report
    }
}

impl<S> GeneratorSession<S> {
    pub fn accepted(&self) -> &[AcceptedImage] {
        &self.accepted
    }

    pub fn accepted_image(&self, index: usize) -> Option<&AcceptedImage> {
        self.accepted.get(index)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub const fn layout(&self) -> &LayoutContext<S> {
        &self.layout
    }

    /// Decoded pages in acceptance order.
    pub fn pages(&self) -> Vec<PageImage> {
        self.accepted.iter().map(|a| a.page.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}
