use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extensions accepted as audio, with the MIME type they map to.
pub const AUDIO_EXTENSIONS: &[(&str, &str)] = &[
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
    ("m4a", "audio/mp4"),
    ("opus", "audio/opus"),
    ("weba", "audio/webm"),
];

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("{path} is not an audio file")]
    NotAudio { path: String },
    #[error("failed to read audio at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to store audio: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAudio {
    pub uri: String,
}

pub trait AudioUploader {
    fn upload_audio(&mut self, path: &Path) -> Result<UploadedAudio, AudioError>;
}

pub fn audio_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    AUDIO_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Copies uploads into a directory under the SHA-256 of their contents, so the
/// same file always yields the same URI.
pub struct LocalAudioStore {
    root: PathBuf,
}

impl LocalAudioStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AudioUploader for LocalAudioStore {
    fn upload_audio(&mut self, path: &Path) -> Result<UploadedAudio, AudioError> {
        if audio_mime_type(path).is_none() {
            return Err(AudioError::NotAudio {
                path: path.display().to_string(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| AudioError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let digest = format!("{:x}", Sha256::digest(&bytes));
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin")
            .to_ascii_lowercase();
        let target = self.root.join(format!("{digest}.{extension}"));
        if !target.exists() {
            std::fs::write(&target, &bytes)?;
        }
        log::info!("Stored audio {} as {}", path.display(), target.display());
        Ok(UploadedAudio {
            uri: format!("file://{}", target.display()),
        })
    }
}

/// Native file picker restricted to audio extensions.
pub fn pick_audio_file() -> Option<PathBuf> {
    let extensions: Vec<&str> = AUDIO_EXTENSIONS.iter().map(|(ext, _)| *ext).collect();
    rfd::FileDialog::new()
        .add_filter("Audio", &extensions)
        .pick_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup_is_case_insensitive() {
        assert_eq!(audio_mime_type(Path::new("a/b/engine.WAV")), Some("audio/wav"));
        assert_eq!(audio_mime_type(Path::new("take.mp3")), Some("audio/mpeg"));
        assert_eq!(audio_mime_type(Path::new("notes.txt")), None);
        assert_eq!(audio_mime_type(Path::new("no_extension")), None);
    }

    #[test]
    fn rejects_non_audio_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalAudioStore::open(dir.path().join("audio")).unwrap();
        // The file does not exist; rejection must not depend on I/O.
        let result = store.upload_audio(Path::new("missing/readme.txt"));
        assert!(matches!(result, Err(AudioError::NotAudio { .. })));
    }

    #[test]
    fn identical_content_shares_uri() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("one.wav");
        let second = dir.path().join("two.WAV");
        std::fs::write(&first, b"RIFF....WAVE").unwrap();
        std::fs::write(&second, b"RIFF....WAVE").unwrap();

        let mut store = LocalAudioStore::open(dir.path().join("audio")).unwrap();
        let a = store.upload_audio(&first).unwrap();
        let b = store.upload_audio(&second).unwrap();
        assert_eq!(a, b);
        assert!(a.uri.starts_with("file://"));
        assert!(a.uri.ends_with(".wav"));
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 1);
    }

    #[test]
    fn missing_audio_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalAudioStore::open(dir.path()).unwrap();
        let result = store.upload_audio(&dir.path().join("ghost.ogg"));
        assert!(matches!(result, Err(AudioError::Read { .. })));
    }
}
