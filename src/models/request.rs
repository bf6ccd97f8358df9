use bytes::Bytes;

pub const DEFAULT_TARGET_ROLE: &str = "a general professional position";

/// A resume as received in the multipart form, before it touches disk.
#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub file_name: String,
    pub size: usize,
    pub content: Bytes,
    pub content_type: Option<String>,
}

impl UploadedResume {
    pub fn new(file_name: String, content: Bytes) -> Self {
        let size = content.len();
        Self {
            file_name,
            size,
            content,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: String) -> Self {
        self.content_type = Some(content_type);
        self
    }
}

/// Lowercased text after the last `.`, if the name has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Trims the submitted role and falls back to the default when it is blank.
pub fn normalize_target_role(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(role) if !role.is_empty() => role.to_string(),
        _ => DEFAULT_TARGET_ROLE.to_string(),
    }
}
