//! Image upload pipeline: validation, concurrent uploads, insertion into the
//! editor, and the paste / file picker / drag-and-drop ingress paths.
//!
//! The editor is shared through a `RefCell` and only borrowed while a
//! finished upload is inserted, so the user keeps typing while a batch is in
//! flight. Each image lands at the selection as it is when its upload
//! completes.

use std::cell::RefCell;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use quill_common::{ImageBlob, ImageUploader, UploadConfig, UploadError, is_valid_image};
use quill_editor_core::{Editor, MarkdownRenderer};
use serde::Serialize;

use crate::notice::{Notice, Notifier, UPLOAD_FAILED, UPLOADING_IMAGE, invalid_image_message};

/// One entry of a clipboard paste.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClipboardItem {
    File(ImageBlob),
    Text(String),
}

/// What happened to a batch of images.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// URLs of uploaded images, in completion order.
    pub inserted: Vec<String>,
    pub failed: usize,
    /// Refused before upload.
    pub rejected: usize,
}

impl BatchReport {
    /// Uploads that finished, either way.
    pub fn settled(&self) -> usize {
        self.inserted.len() + self.failed
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Inserted(String),
    Failed,
    Rejected,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasteOutcome {
    /// The paste carried files, so the platform shouldn't paste it as text.
    pub prevent_default: bool,
    pub report: BatchReport,
}

/// Uploads images and inserts them into an [`Editor`].
///
/// Uploads run concurrently on the caller's task; no retries, no cancellation.
#[derive(Debug)]
pub struct UploadPipeline<U, N> {
    uploader: U,
    notifier: N,
    max_size: u64,
    max_size_human: String,
    uploading: bool,
    drop_zone_active: bool,
}

impl<U: ImageUploader, N: Notifier> UploadPipeline<U, N> {
    pub fn new(uploader: U, notifier: N) -> Self {
        Self::with_config(uploader, notifier, &UploadConfig::default())
    }

    pub fn with_config(uploader: U, notifier: N, config: &UploadConfig) -> Self {
        Self {
            uploader,
            notifier,
            max_size: config.max_size,
            max_size_human: config.max_size_human(),
            uploading: false,
            drop_zone_active: false,
        }
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn into_notifier(self) -> N {
        self.notifier
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn drop_zone_active(&self) -> bool {
        self.drop_zone_active
    }

    pub fn drag_enter(&mut self) {
        self.drop_zone_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drop_zone_active = false;
    }

    fn set_uploading(&mut self, uploading: bool) {
        if self.uploading != uploading {
            self.uploading = uploading;
            self.notifier.uploading_changed(uploading);
        }
    }

    fn accept(&self, blob: &ImageBlob) -> Result<(), UploadError> {
        if is_valid_image(blob, self.max_size) {
            return Ok(());
        }
        Err(UploadError::InvalidImage {
            name: blob.display_name().to_string(),
            mime_type: blob.mime_type.clone(),
            size: blob.size(),
            max_size: self.max_size,
        })
    }

    fn reject(&mut self, error: &UploadError) {
        tracing::warn!(error = %error, "rejected invalid image");
        self.notifier
            .notify(Notice::error(invalid_image_message(&self.max_size_human)));
    }

    /// Upload a single image.
    pub async fn upload_one<R: MarkdownRenderer>(
        &mut self,
        editor: &RefCell<Editor<R>>,
        blob: ImageBlob,
    ) -> UploadOutcome {
        let report = self.upload_batch(editor, vec![blob]).await;
        if report.rejected > 0 {
            UploadOutcome::Rejected
        } else if let Some(url) = report.inserted.into_iter().next() {
            UploadOutcome::Inserted(url)
        } else {
            UploadOutcome::Failed
        }
    }

    /// Upload every valid blob concurrently and insert each image as its
    /// upload completes. The uploading indicator stays on until all of them
    /// have settled.
    pub async fn upload_batch<R: MarkdownRenderer>(
        &mut self,
        editor: &RefCell<Editor<R>>,
        blobs: Vec<ImageBlob>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut accepted = Vec::with_capacity(blobs.len());
        for blob in blobs {
            match self.accept(&blob) {
                Ok(()) => accepted.push(blob),
                Err(e) => {
                    self.reject(&e);
                    report.rejected += 1;
                }
            }
        }
        if accepted.is_empty() {
            return report;
        }

        self.set_uploading(true);
        for blob in &accepted {
            tracing::debug!(name = blob.display_name(), size = blob.size(), "uploading image");
            self.notifier.notify(Notice::info(UPLOADING_IMAGE));
        }

        let uploader = &self.uploader;
        let mut pending: FuturesUnordered<_> = accepted
            .iter()
            .map(|blob| async move { (blob, uploader.upload(blob).await) })
            .collect();

        while let Some((blob, result)) = pending.next().await {
            match result {
                Ok(url) => {
                    let inserted = editor
                        .borrow_mut()
                        .insert_image(&url, Some(blob.display_name()));
                    if !inserted {
                        tracing::warn!(%url, "uploaded image but the editor is detached");
                    }
                    report.inserted.push(url);
                }
                Err(e) => {
                    tracing::warn!(name = blob.display_name(), error = %e, "image upload failed");
                    report.failed += 1;
                    self.notifier.notify(Notice::error(UPLOAD_FAILED));
                }
            }
        }
        drop(pending);

        self.set_uploading(false);
        tracing::info!(
            inserted = report.inserted.len(),
            failed = report.failed,
            rejected = report.rejected,
            "image batch settled"
        );
        report
    }

    /// Clipboard paste. File items are uploaded as one batch.
    pub async fn handle_paste<R: MarkdownRenderer>(
        &mut self,
        editor: &RefCell<Editor<R>>,
        items: Vec<ClipboardItem>,
    ) -> PasteOutcome {
        let files: Vec<ImageBlob> = items
            .into_iter()
            .filter_map(|item| match item {
                ClipboardItem::File(blob) => Some(blob),
                ClipboardItem::Text(_) => None,
            })
            .collect();
        if files.is_empty() {
            return PasteOutcome::default();
        }
        PasteOutcome {
            prevent_default: true,
            report: self.upload_batch(editor, files).await,
        }
    }

    /// File picker. Only the first selected file is used.
    pub async fn handle_file_input<R: MarkdownRenderer>(
        &mut self,
        editor: &RefCell<Editor<R>>,
        files: Vec<ImageBlob>,
    ) -> Option<UploadOutcome> {
        let first = files.into_iter().next()?;
        Some(self.upload_one(editor, first).await)
    }

    /// Drop onto the editor. Closes the drop zone first.
    pub async fn handle_drop<R: MarkdownRenderer>(
        &mut self,
        editor: &RefCell<Editor<R>>,
        files: Vec<ImageBlob>,
    ) -> BatchReport {
        self.drop_zone_active = false;
        if files.is_empty() {
            return BatchReport::default();
        }
        self.upload_batch(editor, files).await
    }
}
