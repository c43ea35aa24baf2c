//! Photo union keyed by photo identity.
//!
//! When a recommendation is seen again, the photos stored from the earlier
//! payload are merged with the new ones before evaluation. Photos are the same
//! photo when their `id`s are equal. On a clash the first occurrence wins, so
//! a stored photo keeps its content over a re-sent copy.

use std::collections::HashSet;

use crate::types::Photo;

/// Insertion-ordered set of photos, unique by `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoSet {
    photos: Vec<Photo>,
    seen: HashSet<String>,
}

impl PhotoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a photo. Returns false if a photo with the same id is already held.
    pub fn insert(&mut self, photo: Photo) -> bool {
        if self.seen.contains(&photo.id) {
            return false;
        }
        self.seen.insert(photo.id.clone());
        self.photos.push(photo);
        true
    }

    /// Union of `first` then `second`
    pub fn union(first: &[Photo], second: &[Photo]) -> Self {
        let mut set = Self::new();
        set.extend(first.iter().cloned());
        set.extend(second.iter().cloned());
        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn as_slice(&self) -> &[Photo] {
        &self.photos
    }

    pub fn into_vec(self) -> Vec<Photo> {
        self.photos
    }
}

impl Extend<Photo> for PhotoSet {
    fn extend<I: IntoIterator<Item = Photo>>(&mut self, iter: I) {
        for photo in iter {
            self.insert(photo);
        }
    }
}

impl FromIterator<Photo> for PhotoSet {
    fn from_iter<I: IntoIterator<Item = Photo>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
