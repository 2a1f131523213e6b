//! Coarse file type classification and extension category definitions.

use serde::{Deserialize, Serialize};

use crate::path::extension_of_name;

/// Coarse type tag stored on every indexed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Directory,
    Image,
    Audio,
    Video,
    Doc,
    Text,
    Archive,
    Blob,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Doc => "doc",
            Self::Text => "text",
            Self::Archive => "archive",
            Self::Blob => "blob",
        }
    }

    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Extension category constants
// ---------------------------------------------------------------------------

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "ico", "svg", "heic", "heif", "raw",
    "arw", "cr2", "nef", "orf", "raf", "psd", "avif", "jxl",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "wmv", "webm", "flv", "mpg", "mpeg", "3gp", "3g2", "mts",
    "m2ts", "ogv",
];

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "oga", "opus", "wma", "m4a", "alac", "aiff", "mid", "midi",
];

pub const DOC_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "rtf", "odt", "pages", "xls", "xlsx", "ods", "numbers", "ppt", "pptx",
    "odp", "key", "epub", "mobi",
];

pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "log", "csv", "tsv", "json", "yaml", "yml", "toml", "ini", "cfg", "conf",
    "xml", "html", "htm", "css", "scss", "js", "jsx", "ts", "tsx", "rs", "go", "py", "rb", "java",
    "kt", "c", "cc", "cpp", "h", "hpp", "cs", "php", "sh", "zsh", "fish", "ps1", "sql", "lua",
    "swift", "vue", "srt", "vtt",
];

pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "zst", "cab", "iso", "dmg", "lz", "lzma",
];

/// Classifies a file by the extension of its name.
pub fn classify_file_name(name: &str) -> FileKind {
    let Some(extension) = extension_of_name(name) else {
        return FileKind::Blob;
    };
    let extension = extension.as_str();
    if IMAGE_EXTENSIONS.contains(&extension) {
        FileKind::Image
    } else if AUDIO_EXTENSIONS.contains(&extension) {
        FileKind::Audio
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        FileKind::Video
    } else if DOC_EXTENSIONS.contains(&extension) {
        FileKind::Doc
    } else if TEXT_EXTENSIONS.contains(&extension) {
        FileKind::Text
    } else if ARCHIVE_EXTENSIONS.contains(&extension) {
        FileKind::Archive
    } else {
        FileKind::Blob
    }
}
