pub mod export;
pub mod source;
pub mod types;

pub use export::{ChatError, JsonExportSource};
pub use source::{ChatSource, UserCache};
pub use types::{Attachment, AttachmentField, Block, Message, RichTextElement, TextObject, UserInfo};
