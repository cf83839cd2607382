pub mod file_dto;

pub use file_dto::{FileRecordDto, FileUploadResponseDto, UploadFileDto};
