mod error;
pub use error::AppError;

mod env;
pub use env::APP_ENV;

mod document;
pub use document::{ConversationMessage, Document, DocumentKind};
