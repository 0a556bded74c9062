//! Slideshow sub-view selection.
//!
//! The slideshow is only offered while computing, and only when the viewport
//! is tall enough. A second, higher threshold decides whether the large image
//! fits or only the caption strip is shown.

#![allow(missing_docs)]

use serde::Serialize;

use crate::client::status::{ImageHandle, SlideshowAsset};
use crate::core::config::SlideshowConfig;

// ──────────────────── viewport ────────────────────

/// Screen size plus the configured slideshow thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewportConstraints {
    pub width: u32,
    pub height: u32,
    pub min_height_for_slideshow: u32,
    pub min_height_for_image: u32,
    pub caption_bottom_padding_px: u32,
}

impl ViewportConstraints {
    #[must_use]
    pub const fn new(width: u32, height: u32, thresholds: &SlideshowConfig) -> Self {
        Self {
            width,
            height,
            min_height_for_slideshow: thresholds.min_height_for_slideshow,
            min_height_for_image: thresholds.min_height_for_image,
            caption_bottom_padding_px: thresholds.caption_bottom_padding_px,
        }
    }

    #[must_use]
    pub const fn allows_slideshow(&self) -> bool {
        self.height >= self.min_height_for_slideshow
    }

    #[must_use]
    pub const fn allows_image(&self) -> bool {
        self.height >= self.min_height_for_image
    }
}

impl Default for ViewportConstraints {
    fn default() -> Self {
        Self::new(0, 0, &SlideshowConfig::default())
    }
}

// ──────────────────── layout ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    /// Large image plus caption strip.
    Full,
    /// Image hidden; caption strip reflowed to fill the width.
    CaptionOnly,
}

impl Density {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::CaptionOnly => "caption_only",
        }
    }
}

/// Placement of the caption/gallery strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptionStrip {
    pub fill_width: bool,
    pub centered: bool,
    pub bottom_padding_px: u32,
}

/// Result of a selection callback: what the view must change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionUpdate {
    pub index: usize,
    pub caption: String,
    /// New image for the large view; `None` in caption-only density.
    pub image: Option<ImageHandle>,
    /// False when the index was already selected.
    pub changed: bool,
}

/// A shown slideshow and its current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideshowLayout {
    density: Density,
    strip: CaptionStrip,
    assets: Vec<SlideshowAsset>,
    selected: usize,
}

impl SlideshowLayout {
    #[must_use]
    pub const fn density(&self) -> Density {
        self.density
    }

    #[must_use]
    pub const fn strip(&self) -> CaptionStrip {
        self.strip
    }

    #[must_use]
    pub fn assets(&self) -> &[SlideshowAsset] {
        &self.assets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// Caption of the selected asset.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.assets[self.selected].project_name
    }

    /// Image bound to the large view; `None` in caption-only density.
    #[must_use]
    pub fn image(&self) -> Option<&ImageHandle> {
        match self.density {
            Density::Full => Some(&self.assets[self.selected].image),
            Density::CaptionOnly => None,
        }
    }

    /// Selection callback. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<SelectionUpdate> {
        let asset = self.assets.get(index)?;
        let changed = index != self.selected;
        let update = SelectionUpdate {
            index,
            caption: asset.project_name.clone(),
            image: match self.density {
                Density::Full => Some(asset.image.clone()),
                Density::CaptionOnly => None,
            },
            changed,
        };
        self.selected = index;
        Some(update)
    }
}

// ──────────────────── selector ────────────────────

/// Decide whether the slideshow can be shown and in which density.
///
/// Returns `None` when the viewport is too short or there is nothing to show;
/// the caller then falls back to the plain "running" panel.
#[must_use]
pub fn select(viewport: &ViewportConstraints, assets: &[SlideshowAsset]) -> Option<SlideshowLayout> {
    if !viewport.allows_slideshow() || assets.is_empty() {
        return None;
    }

    let (density, strip) = if viewport.allows_image() {
        (
            Density::Full,
            CaptionStrip {
                fill_width: false,
                centered: false,
                bottom_padding_px: 0,
            },
        )
    } else {
        (
            Density::CaptionOnly,
            CaptionStrip {
                fill_width: true,
                centered: true,
                bottom_padding_px: viewport.caption_bottom_padding_px,
            },
        )
    };

    Some(SlideshowLayout {
        density,
        strip,
        assets: assets.to_vec(),
        selected: 0,
    })
}
