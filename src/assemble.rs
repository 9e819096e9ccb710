//! # Document Assembly
//!
//! Drives a report from model to artifact, one page at a time:
//!
//! 1. validate the document
//! 2. lay out the cover
//! 3. for each page, in order: resolve its photos, lay it out, hand it to
//!    the backend, release the photos
//! 4. finish the backend
//!
//! The figure counter lives here and is threaded through every content
//! page, so numbering runs across the whole document. Decoded images never
//! outlive the page that draws them. Any fatal error or cancellation drops
//! the backend, so no partial artifact escapes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, Utc};

use crate::backend::RenderBackend;
use crate::config::LayoutConfig;
use crate::error::ReportError;
use crate::image_loader::{ImageResolver, SourceResolver};
use crate::layout::cover::format_timestamp;
use crate::layout::{FigureCounter, PageRenderer, PhotoSlot};
use crate::model::{ReportDocument, ReportPage};
use crate::pdf::PdfWriter;

/// Shared abort switch. Clone it, hand one copy to the assembler and raise
/// the other from anywhere.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Assembler {
    config: LayoutConfig,
    resolver: Box<dyn ImageResolver>,
    generated_at: Option<String>,
    cancel: CancelFlag,
}

impl Assembler {
    /// An assembler using the default [`SourceResolver`] and the local clock.
    pub fn new(config: LayoutConfig) -> Self {
        let resolver = SourceResolver::new(&config);
        Assembler {
            config,
            resolver: Box::new(resolver),
            generated_at: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Fix the cover timestamp text instead of reading the local clock.
    pub fn with_generated_at(mut self, stamp: impl Into<String>) -> Self {
        self.generated_at = Some(stamp.into());
        self
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Render `doc` as PDF bytes.
    pub fn render_pdf(&self, doc: &ReportDocument) -> Result<Vec<u8>, ReportError> {
        let writer = PdfWriter::new()
            .with_title(&doc.name)
            .with_creation_date(Utc::now());
        self.run(doc, writer)
    }

    /// Lay out every page of `doc` into `backend` and return its output.
    pub fn run<B: RenderBackend>(&self, doc: &ReportDocument, mut backend: B) -> Result<B::Output, ReportError> {
        doc.validate()?;
        self.check_cancelled()?;

        let renderer = PageRenderer::new(&self.config);
        let mut figures = FigureCounter::new();

        let stamp = self
            .generated_at
            .clone()
            .unwrap_or_else(|| format_timestamp(&Local::now()));
        backend.add_page(&renderer.render_cover(doc, &stamp), &[])?;

        for (index, page) in doc.pages.iter().enumerate() {
            self.check_cancelled()?;

            let slots = self.resolve_page(page)?;
            let layout = renderer.render_content(page, &slots, index + 1, &mut figures);
            let written = backend.add_page(&layout, &slots);
            self.release(slots);
            written?;

            log::debug!(
                "page {} ('{}') laid out, figures issued so far: {}",
                index + 1,
                page.id,
                figures.issued()
            );
        }

        let output = backend.finish()?;
        log::info!(
            "report '{}' assembled: {} content page(s), {} figure(s)",
            doc.name,
            doc.pages.len(),
            figures.issued()
        );
        Ok(output)
    }

    /// Resolve a page's photos in render order. Recoverable failures become
    /// placeholder slots. On a fatal error every image resolved so far is
    /// released before returning.
    fn resolve_page<'d>(&self, page: &'d ReportPage) -> Result<Vec<PhotoSlot<'d>>, ReportError> {
        let mut slots = Vec::with_capacity(page.photos.len());

        for index in page.render_order() {
            if let Err(e) = self.check_cancelled() {
                self.release(slots);
                return Err(e);
            }

            let photo = &page.photos[index];
            match self.resolver.resolve(photo) {
                Ok(image) => slots.push(PhotoSlot::resolved(photo, image)),
                Err(e) if e.is_recoverable() => {
                    log::warn!(
                        "page '{}': photo {} unavailable, drawing placeholder: {}",
                        page.id,
                        index,
                        e
                    );
                    slots.push(PhotoSlot::unavailable(photo));
                }
                Err(e) => {
                    self.release(slots);
                    return Err(e.into());
                }
            }
        }

        Ok(slots)
    }

    fn release(&self, slots: Vec<PhotoSlot<'_>>) {
        for image in slots.into_iter().filter_map(|slot| slot.image) {
            self.resolver.release(image);
        }
    }

    fn check_cancelled(&self) -> Result<(), ReportError> {
        if self.cancel.is_cancelled() {
            log::debug!("assembly cancelled");
            return Err(ReportError::Cancelled);
        }
        Ok(())
    }
}

/// Render a report with the default configuration, resolver and PDF output.
pub fn assemble(doc: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    Assembler::new(LayoutConfig::default()).render_pdf(doc)
}
