use super::model::{Catalog, Track};

/// A filtered, read-only window onto a [`Catalog`].
///
/// Entries keep their catalog index, so anything selected from a view can
/// be handed straight to the playback session.
#[derive(Debug, Clone)]
pub struct CatalogView<'a> {
    catalog: &'a Catalog,
    indices: Vec<usize>,
}

impl<'a> CatalogView<'a> {
    /// Catalog indices visible in this view, in catalog order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `(catalog_index, track)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Track)> + '_ {
        let catalog = self.catalog;
        self.indices.iter().map(move |&i| (i, &catalog.tracks()[i]))
    }

    /// The visible tracks, cloned out of the catalog.
    pub fn tracks(&self) -> Vec<Track> {
        self.iter().map(|(_, t)| t.clone()).collect()
    }
}

/// Case-insensitive substring match on title and artist.
///
/// A blank query yields every track in catalog order.
pub fn filter<'a>(catalog: &'a Catalog, query: &str) -> CatalogView<'a> {
    let query = query.trim().to_lowercase();
    let indices = if query.is_empty() {
        (0..catalog.len()).collect()
    } else {
        catalog
            .tracks()
            .iter()
            .enumerate()
            .filter(|(_, t)| matches_query(t, &query))
            .map(|(i, _)| i)
            .collect()
    };
    CatalogView { catalog, indices }
}

fn matches_query(track: &Track, query_lower: &str) -> bool {
    track.title.to_lowercase().contains(query_lower)
        || track
            .artist
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(query_lower))
}
