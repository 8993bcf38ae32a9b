use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5c71_9ca5_7d0e_a1b3;

/// Kind of external render a request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderKind {
    /// Text-to-speech audio.
    Speech,
    /// Source code screenshot.
    CodeImage,
}

impl RenderKind {
    /// File extension of the primary artifact stored for this kind.
    pub fn artifact_extension(self) -> &'static str {
        match self {
            RenderKind::Speech => "wav",
            RenderKind::CodeImage => "png",
        }
    }
}

impl std::fmt::Display for RenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RenderKind::Speech => "speech",
            RenderKind::CodeImage => "code-image",
        })
    }
}

/// A render request reduced to the bytes that determine its output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenderRequest {
    kind: RenderKind,
    canonical: Vec<u8>,
}

impl RenderRequest {
    /// Speech for `text` spoken by `voice`.
    ///
    /// Canonical bytes are the normalized voice, a NUL separator, then the normalized text.
    pub fn speech(voice: &str, text: &str) -> Self {
        let voice = normalize_text(voice);
        let text = normalize_text(text);
        let mut canonical = Vec::with_capacity(voice.len() + text.len() + 1);
        canonical.extend_from_slice(voice.as_bytes());
        canonical.push(0);
        canonical.extend_from_slice(text.as_bytes());
        Self {
            kind: RenderKind::Speech,
            canonical,
        }
    }

    /// Screenshot of `source`, highlighted as a file with `extension`.
    ///
    /// The extension selects syntax highlighting, so it is part of the canonical bytes.
    pub fn code_image(source: &str, extension: &str) -> Self {
        let source = normalize_text(source);
        let extension = extension.trim().to_ascii_lowercase();
        let mut canonical = Vec::with_capacity(source.len() + extension.len() + 1);
        canonical.extend_from_slice(extension.as_bytes());
        canonical.push(0);
        canonical.extend_from_slice(source.as_bytes());
        Self {
            kind: RenderKind::CodeImage,
            canonical,
        }
    }

    /// Build a request from raw canonical bytes.
    pub fn from_canonical(kind: RenderKind, canonical: Vec<u8>) -> Self {
        Self { kind, canonical }
    }

    /// Render kind.
    pub fn kind(&self) -> RenderKind {
        self.kind
    }

    /// Canonical content bytes.
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    /// Content digest of the canonical bytes.
    pub fn key(&self) -> CacheKey {
        CacheKey::digest(&self.canonical)
    }
}

/// 128-bit content digest, rendered as 32 lowercase hex chars in artifact file names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u128);

impl CacheKey {
    /// Digest arbitrary bytes.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Xxh3::with_seed(XXH3_SEED);
        hasher.update(bytes);
        Self(hasher.digest128())
    }

    /// Raw digest value.
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Trim surrounding whitespace and unify line endings.
fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").trim().to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
