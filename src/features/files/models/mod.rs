mod uploaded_file;

pub use uploaded_file::{UploadOutcome, UploadedFile};
