//! Media assets: images, video, rive animations, svg and fonts.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Discriminator carried in every asset record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Video,
    Rive,
    Svg,
    Font,
}

impl AssetKind {
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "rive" => Some(Self::Rive),
            "svg" => Some(Self::Svg),
            "font" => Some(Self::Font),
            _ => None,
        }
    }

    pub const ALL: [AssetKind; 5] = [
        AssetKind::Image,
        AssetKind::Video,
        AssetKind::Rive,
        AssetKind::Svg,
        AssetKind::Font,
    ];
}

/// Upload/processing lifecycle of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetState {
    #[default]
    Pending,
    Ready,
    Failed,
}

impl AssetState {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pending" => Some(Self::Pending),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One size variant of an image or font resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeVariant {
    pub url: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Image metadata. `available_sizes` is keyed by variant name
/// ("compressed", "thumb", ...) and is merged by overlay, never
/// replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMeta {
    pub aspect_ratio: Option<f64>,
    pub available_sizes: BTreeMap<String, SizeVariant>,
}

/// Font naming metadata, merged field-by-field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontMeta {
    pub font_family: Option<String>,
    pub font_sub_family: Option<String>,
    pub preferred_family: Option<String>,
    pub preferred_sub_family: Option<String>,
    pub post_script_name: Option<String>,
    pub file_extension: Option<String>,
}

/// Kind-specific metadata payload. Video/rive/svg metadata has no
/// fields the runtime interprets, so it stays an opaque bag overlaid
/// field-by-field.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetMeta {
    Image(ImageMeta),
    Font(FontMeta),
    Opaque(Map<String, Value>),
}

impl AssetMeta {
    pub fn for_kind(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Image => AssetMeta::Image(ImageMeta::default()),
            AssetKind::Font => AssetMeta::Font(FontMeta::default()),
            _ => AssetMeta::Opaque(Map::new()),
        }
    }

    pub fn as_image(&self) -> Option<&ImageMeta> {
        match self {
            AssetMeta::Image(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn as_font(&self) -> Option<&FontMeta> {
        match self {
            AssetMeta::Font(meta) => Some(meta),
            _ => None,
        }
    }
}

/// A media asset record.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub state: AssetState,
    pub url: Option<String>,
    pub meta: AssetMeta,
}

impl Asset {
    pub fn new(id: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            state: AssetState::default(),
            url: None,
            meta: AssetMeta::for_kind(kind),
        }
    }
}
