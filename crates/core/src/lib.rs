pub mod document;
pub mod session;

pub use document::{Document, DocumentError, Encoding, LineEnding};
pub use session::{FindReplaceSession, Notice, NoticeKind, Notifier, Renderer};
