use std::path::Path;
use std::time::Duration;

use lofty::picture::{Picture, PictureType};
use lofty::prelude::*;

use crate::error::MetadataError;
use crate::library::Artwork;

/// Whatever tags a file yielded. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TagInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub artwork: Option<Artwork>,
}

/// Source of per-file tags.
pub trait TagReader: Send + Sync {
    fn read_tags(&self, location: &Path) -> Result<TagInfo, MetadataError>;
}

/// Reads tags and stream properties with `lofty`.
#[derive(Debug, Clone, Copy)]
pub struct LoftyReader {
    pub artwork: bool,
}

impl TagReader for LoftyReader {
    fn read_tags(&self, location: &Path) -> Result<TagInfo, MetadataError> {
        let tagged = lofty::read_from_path(location).map_err(|e| MetadataError::Unreadable {
            path: location.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut info = TagInfo {
            duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
            ..TagInfo::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            info.title = non_blank(tag.title().as_deref());
            info.artist = non_blank(tag.artist().as_deref());
            info.album = non_blank(tag.album().as_deref());
            if self.artwork {
                info.artwork = cover_art(tag.pictures());
            }
        }

        Ok(info)
    }
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Prefer the front cover; otherwise take the first picture.
fn cover_art(pictures: &[Picture]) -> Option<Artwork> {
    let pic = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())?;
    Some(Artwork {
        mime_type: pic.mime_type().map(|m| m.as_str().to_string()),
        data: pic.data().to_vec(),
    })
}
