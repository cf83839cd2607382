use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, get_file, list_files, upload_file, view_file,
};
use crate::features::files::services::FileService;

/// Headroom for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>, max_upload_size: usize) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(
                max_upload_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/files", get(list_files))
        .route("/files/view/{filename}", get(view_file))
        // Catch-all so `files/<id>` and full URIs can be sent unencoded
        .route("/files/{*file_id}", get(get_file).delete(delete_file))
        .with_state(file_service)
}
