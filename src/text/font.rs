//! Font resolution with an ordered fallback chain and a process-lifetime cache.
//!
//! Resolution never fails: when no candidate yields a usable face the resolver hands out the
//! built-in box face, whose metrics are fixed multiples of the font size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::foundation::math::Fnv1a64;

/// Default weight for regular text.
pub const WEIGHT_REGULAR: u16 = 400;
/// Default weight for titles.
pub const WEIGHT_BOLD: u16 = 700;

/// Cache key: `(family, size, weight)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub family: String,
    pub size: u32,
    pub weight: u16,
}

/// Where a resolved face came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    CacheDir(PathBuf),
    System,
    Fallback(PathBuf),
}

/// Glyph source of a resolved font.
#[derive(Clone, Debug)]
pub enum FontFace {
    /// Raw font bytes (TTF/OTF/TTC) plus the face index inside the collection.
    Loaded {
        data: Arc<Vec<u8>>,
        index: u32,
        source: FontSource,
        /// Hash of `data`; identifies the face across resolver entries.
        fingerprint: u64,
    },
    /// Deterministic fallback: fixed advances, glyphs drawn as boxes.
    Builtin,
}

/// A font ready to measure and draw at a fixed pixel size.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    pub key: FontKey,
    pub face: FontFace,
}

impl ResolvedFont {
    /// The built-in face at `size`. Used directly by tests and as the last fallback.
    pub fn builtin(size: u32) -> Self {
        Self {
            key: FontKey {
                family: BUILTIN_FAMILY.to_owned(),
                size,
                weight: WEIGHT_REGULAR,
            },
            face: FontFace::Builtin,
        }
    }

    pub fn size_px(&self) -> f32 {
        self.key.size.max(1) as f32
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, FontFace::Builtin)
    }
}

pub(crate) const BUILTIN_FAMILY: &str = "storygrid-builtin";

/// Resolver configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontResolverOpts {
    /// Directory searched first for `<family>.ttf` style files. `None` skips this step.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Query installed fonts by family name and weight.
    #[serde(default = "default_true")]
    pub use_system_fonts: bool,
    /// Files tried in order when neither the cache directory nor the system has the family.
    #[serde(default = "default_fallback_paths")]
    pub fallback_paths: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_fallback_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Helvetica.ttc",
        "C:/Windows/Fonts/arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl Default for FontResolverOpts {
    fn default() -> Self {
        Self {
            cache_dir: Some(PathBuf::from("./fonts")),
            use_system_fonts: true,
            fallback_paths: default_fallback_paths(),
        }
    }
}

impl FontResolverOpts {
    /// Skip every lookup and always use the built-in face.
    pub fn builtin_only() -> Self {
        Self {
            cache_dir: None,
            use_system_fonts: false,
            fallback_paths: Vec::new(),
        }
    }
}

/// Append-only `(family, size, weight)` cache in front of the fallback chain.
///
/// Safe to share between threads; the insertion path is guarded by a single mutex.
pub struct FontResolver {
    opts: FontResolverOpts,
    cache: Mutex<HashMap<FontKey, ResolvedFont>>,
    system: OnceLock<usvg::fontdb::Database>,
}

impl FontResolver {
    pub fn new(opts: FontResolverOpts) -> Self {
        Self {
            opts,
            cache: Mutex::new(HashMap::new()),
            system: OnceLock::new(),
        }
    }

    /// Resolve a font. Always returns something renderable.
    pub fn resolve(&self, family: &str, size: u32, weight: u16) -> ResolvedFont {
        let key = FontKey {
            family: family.to_owned(),
            size,
            weight,
        };

        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        let face = self.lookup(family, weight).unwrap_or_else(|| {
            if self.opts != FontResolverOpts::builtin_only() {
                tracing::warn!(family, weight, "no usable font found, using built-in face");
            }
            FontFace::Builtin
        });
        let resolved = ResolvedFont {
            key: key.clone(),
            face,
        };

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.entry(key).or_insert(resolved).clone()
    }

    /// Number of cached `(family, size, weight)` entries.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lookup(&self, family: &str, weight: u16) -> Option<FontFace> {
        if let Some(dir) = &self.opts.cache_dir {
            for path in cache_dir_candidates(dir, family, weight) {
                if let Some(face) = load_font_file(&path, FontSource::CacheDir(path.clone())) {
                    tracing::debug!(family, path = %path.display(), "font resolved from cache dir");
                    return Some(face);
                }
            }
        }

        if self.opts.use_system_fonts
            && let Some(face) = self.lookup_system(family, weight)
        {
            tracing::debug!(family, weight, "font resolved from system fonts");
            return Some(face);
        }

        for path in &self.opts.fallback_paths {
            if let Some(face) = load_font_file(path, FontSource::Fallback(path.clone())) {
                tracing::debug!(family, path = %path.display(), "font resolved from fallback file");
                return Some(face);
            }
        }

        None
    }

    fn lookup_system(&self, family: &str, weight: u16) -> Option<FontFace> {
        let db = self.system.get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system font database");
            db
        });

        let families = [usvg::fontdb::Family::Name(family)];
        let id = db.query(&usvg::fontdb::Query {
            families: &families,
            weight: usvg::fontdb::Weight(weight),
            ..Default::default()
        })?;

        db.with_face_data(id, |data, index| {
            loaded_face(data.to_vec(), index, FontSource::System)
        })
        .flatten()
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(FontResolverOpts::default())
    }
}

impl std::fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResolver")
            .field("opts", &self.opts)
            .field("cached", &self.cached_len())
            .finish()
    }
}

/// File-name style used by the font cache directory, e.g. `Montserrat-SemiBold.ttf`.
pub fn weight_name(weight: u16) -> String {
    match weight {
        100 => "Thin".to_owned(),
        200 => "ExtraLight".to_owned(),
        300 => "Light".to_owned(),
        400 => "Regular".to_owned(),
        500 => "Medium".to_owned(),
        600 => "SemiBold".to_owned(),
        700 => "Bold".to_owned(),
        800 => "ExtraBold".to_owned(),
        900 => "Black".to_owned(),
        other => other.to_string(),
    }
}

pub(crate) fn cache_dir_candidates(dir: &Path, family: &str, weight: u16) -> Vec<PathBuf> {
    let compact: String = family.chars().filter(|c| !c.is_whitespace()).collect();
    vec![
        dir.join(format!("{family}.ttf")),
        dir.join(format!("{family}.otf")),
        dir.join(format!("{compact}-{}.ttf", weight_name(weight))),
    ]
}

fn load_font_file(path: &Path, source: FontSource) -> Option<FontFace> {
    let bytes = std::fs::read(path).ok()?;
    loaded_face(bytes, 0, source)
}

/// Accept `bytes` only if fontdb can parse at least one face from them.
fn loaded_face(bytes: Vec<u8>, index: u32, source: FontSource) -> Option<FontFace> {
    let mut probe = usvg::fontdb::Database::new();
    probe.load_font_data(bytes.clone());
    probe.faces().next()?;

    let mut h = Fnv1a64::new_default();
    h.write_bytes(&bytes);
    Some(FontFace::Loaded {
        data: Arc::new(bytes),
        index,
        source,
        fingerprint: h.finish(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
