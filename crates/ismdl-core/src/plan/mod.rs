//! Concatenation plan: the ordered list of fragment files handed to the muxer.
//!
//! The plan is built from the extracted identifiers in extraction order and is
//! the only source of playback order. It is never sorted.

mod list;

pub use list::{parse_list, read_list, render_list, write_list};

use std::path::{Path, PathBuf};

use crate::manifest::FragmentId;
use crate::url_model::{IsmUrl, TrackSelection};

/// Suffix of a complete fragment file.
pub const FRAGMENT_SUFFIX: &str = ".part";

/// File name of a fragment artifact, relative to the working directory.
pub fn fragment_file_name(id: FragmentId) -> String {
    format!("{}{}", id, FRAGMENT_SUFFIX)
}

/// One fragment to fetch: identifier, destination and source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTask {
    pub id: FragmentId,
    pub dest: PathBuf,
    pub url: String,
}

/// Ordered fragment entries, one per extracted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConcatPlan {
    ids: Vec<FragmentId>,
}

impl ConcatPlan {
    pub fn from_ids(ids: Vec<FragmentId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[FragmentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Relative fragment file names, in plan order.
    pub fn file_names(&self) -> Vec<String> {
        self.ids.iter().map(|id| fragment_file_name(*id)).collect()
    }

    /// One task per entry, in plan order (duplicates included).
    pub fn tasks(&self, work_dir: &Path, base: &IsmUrl, tracks: &TrackSelection) -> Vec<FragmentTask> {
        self.ids
            .iter()
            .map(|&id| FragmentTask {
                id,
                dest: work_dir.join(fragment_file_name(id)),
                url: base.fragment_url(id, tracks),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_order_matches_identifier_order() {
        let ids: Vec<FragmentId> = [10u64, 7, 10].into_iter().map(FragmentId::new).collect();
        let plan = ConcatPlan::from_ids(ids);
        assert_eq!(plan.file_names(), vec!["10.part", "7.part", "10.part"]);
    }

    #[test]
    fn tasks_derive_paths_and_urls() {
        let base = IsmUrl::parse("http://example.com/a.ism").unwrap();
        let tracks = TrackSelection::new(100, "english");
        let plan = ConcatPlan::from_ids(vec![FragmentId::new(3), FragmentId::new(1)]);
        let tasks = plan.tasks(Path::new("/work"), &base, &tracks);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, FragmentId::new(3));
        assert_eq!(tasks[0].dest, Path::new("/work/3.part"));
        assert!(tasks[0].url.ends_with("Fragments(video=3,format=m3u8-aapl-v3,audiotrack=english)"));
        assert_eq!(tasks[1].dest, Path::new("/work/1.part"));
    }
}
