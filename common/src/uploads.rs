use uuid::Uuid;

const MAX_EXTENSION_LENGTH: usize = 8;

/// Storage path for an uploaded store logo: `uploads/<store-uuid>/<random>.<ext>`.
/// The original file name only contributes its extension, and only when that
/// extension is short and ASCII alphanumeric. Otherwise the path has none.
pub fn store_image_file_path(store_uuid: &Uuid, filename: &str) -> String {
    match file_extension(filename) {
        Some(ext) => format!("uploads/{}/{}.{}", store_uuid, Uuid::new_v4(), ext),
        None => format!("uploads/{}/{}", store_uuid, Uuid::new_v4()),
    }
}

fn file_extension(filename: &str) -> Option<&str> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LENGTH
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}
