//! Post composition: the draft model, validation, the form controller and
//! the image upload pipeline.

pub mod draft;
pub mod form;
pub mod notice;
pub mod upload;
pub mod validate;

pub use draft::{
    DraftProps, DraftUpdate, FieldChange, FormFields, MAX_TITLE_CHARS, MAX_TOPICS, RewardTier,
    Submission, UnknownRewardTier,
};
pub use form::{ComposeForm, NO_CONTENT_HELP, SubmitHandler};
pub use notice::{Notice, NoticeEvent, NoticeLevel, NoticeLog, Notifier, TracingNotifier};
pub use upload::{BatchReport, ClipboardItem, PasteOutcome, UploadOutcome, UploadPipeline};
pub use validate::{
    FieldError, ValidationErrors, is_valid_topic, validate_fields, validate_title,
    validate_topics,
};
