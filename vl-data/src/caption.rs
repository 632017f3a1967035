//! The caption pool used to draw hard negative captions.

use crate::common::*;

/// The identifier group of an image or caption.
///
/// Identifiers of one group share every character but the last one, which
/// tells individual captions of the group apart.
pub fn group_prefix(id: &str) -> &str {
    match id.char_indices().last() {
        Some((index, _)) => &id[..index],
        None => id,
    }
}

/// Identifier to caption mapping, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct CaptionPool {
    captions: IndexMap<String, String>,
    groups: IndexSet<String>,
}

impl CaptionPool {
    pub fn new(captions: IndexMap<String, String>) -> Self {
        let groups: IndexSet<_> = captions
            .keys()
            .map(|id| group_prefix(id).to_string())
            .collect();

        if groups.len() < 2 {
            warn!(
                "the caption pool has {} identifier group(s), hard negatives may be unavailable",
                groups.len()
            );
        }

        Self { captions, groups }
    }

    /// Load a JSON object mapping identifiers to captions.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read caption file '{}'", path.display()))?;
        let captions: IndexMap<String, String> = serde_json::from_str(&text)
            .with_context(|| format!("invalid caption file '{}'", path.display()))?;
        info!("loaded {} captions from '{}'", captions.len(), path.display());
        Ok(Self::new(captions))
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.captions.get(id).map(String::as_str)
    }

    /// Draw a caption from a group other than the group of `image_id`.
    ///
    /// Identifiers are drawn uniformly until one falls outside the group of
    /// `image_id`. Returns the drawn identifier and its caption.
    pub fn sample_negative<R>(&self, image_id: &str, rng: &mut R) -> Result<(&str, &str)>
    where
        R: Rng + ?Sized,
    {
        let prefix = group_prefix(image_id);
        let has_other_group = self.groups.iter().any(|group| group != prefix);
        ensure!(
            has_other_group,
            "no caption outside the group of image '{}' is available",
            image_id
        );

        loop {
            let index = rng.gen_range(0..self.captions.len());
            let (id, caption) = self
                .captions
                .get_index(index)
                .ok_or_else(|| format_err!("caption index {} out of range", index))?;

            if group_prefix(id) != prefix {
                break Ok((id.as_str(), caption.as_str()));
            }
        }
    }
}
