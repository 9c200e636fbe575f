mod export;
mod record;
mod session;

pub use export::{save_history, save_record_image, HISTORY_MANIFEST_FILE};
pub use record::{GeneratedImageRecord, GenerationKind};
pub use session::SessionHistory;
