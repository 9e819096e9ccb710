//! # Output Backends
//!
//! The renderer produces [`LayoutPage`]s; a backend turns them into an
//! artifact. Pages arrive one at a time, in output order, together with the
//! photo slots they reference, so a backend can consume image data before
//! the assembler releases it.
//!
//! Two backends ship with the crate: [`crate::pdf::PdfWriter`] paints PDF
//! bytes and [`LayoutRecorder`] keeps a serializable [`LayoutInfo`] tree.

use crate::error::ReportError;
use crate::layout::{LayoutInfo, LayoutPage, PageInfo, PhotoSlot};

pub trait RenderBackend {
    type Output;

    /// Append one physical page. `slots` are the photos the page's
    /// `DrawCommand::Image` elements refer to by index.
    fn add_page(&mut self, page: &LayoutPage, slots: &[PhotoSlot<'_>]) -> Result<(), ReportError>;

    /// Produce the finished artifact.
    fn finish(self) -> Result<Self::Output, ReportError>;
}

/// Structured backend: records every page as a [`PageInfo`] tree.
#[derive(Debug, Default)]
pub struct LayoutRecorder {
    info: LayoutInfo,
}

impl LayoutRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for LayoutRecorder {
    type Output = LayoutInfo;

    fn add_page(&mut self, page: &LayoutPage, _slots: &[PhotoSlot<'_>]) -> Result<(), ReportError> {
        self.info.pages.push(PageInfo::from_page(page));
        Ok(())
    }

    fn finish(self) -> Result<LayoutInfo, ReportError> {
        Ok(self.info)
    }
}
