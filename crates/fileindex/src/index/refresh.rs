//! Single-item refresh after a mutating file operation.

use super::data::Index;
use crate::error::Result;
use crate::path::{base_name, normalize_index_path, parent_index_path, ROOT_PATH};
use crate::types::{DirectoryInfo, ItemInfo};

impl Index {
    /// Brings the index up to date for one changed item without a full scan.
    ///
    /// For a file the parent directory is re-read; for a directory the
    /// directory itself is. Both are re-read non-recursively. Size changes are
    /// then pushed up the ancestor chain until an ancestor is missing from the
    /// index or the root has been updated.
    ///
    /// A target that the source rules exclude (an excluded or hidden folder,
    /// or anything below one) is dropped from the index instead of re-read.
    ///
    /// Runs on the source's scan lane, so a call made while a scan is in
    /// progress blocks until that scan finishes. On a complex source a full
    /// scan can take minutes.
    pub fn refresh_file_info(&self, path: &str, is_dir: bool) -> Result<()> {
        let path = normalize_index_path(path);
        let target = if is_dir {
            path
        } else {
            parent_index_path(&path).unwrap_or(ROOT_PATH).to_string()
        };

        let _scan_guard = self.scan_lane.lock();
        let previous = self.get_directory(&target);
        match self.index_directory_locked(&target, false, false) {
            Ok(_) => {}
            Err(error) if error.is_vanished() && target != ROOT_PATH => {
                log::debug!(
                    "filesystem refresh removed source={} path={} error={}",
                    self.name(),
                    target,
                    error
                );
            }
            Err(error) => return Err(error),
        }
        let current = self.get_directory(&target);

        let previous_size = previous.as_ref().map(|info| info.size);
        let current_size = current.as_ref().map(|info| info.size);
        if previous_size == current_size && previous.is_some() == current.is_some() {
            return Ok(());
        }

        log::debug!(
            "filesystem refresh propagate source={} path={} previous_size={:?} size={:?}",
            self.name(),
            target,
            previous_size,
            current_size
        );
        self.propagate_to_ancestors(&target, current.map(|info| info.as_item()));
        Ok(())
    }

    /// Replaces `child`'s folder item in each ancestor and recomputes sizes.
    ///
    /// `item` is `None` when the child directory no longer exists.
    fn propagate_to_ancestors(&self, child: &str, item: Option<ItemInfo>) {
        let mut current = child.to_string();
        let mut item = item;
        while let Some(parent) = parent_index_path(&current) {
            let name = base_name(&current).to_string();
            let previous_size = self.get_directory(parent).map(|info| info.size);
            let replacement = item.take();
            let updated = self.update_directory(parent, |info| {
                with_folder_item(info, &name, replacement)
            });
            if !updated {
                break;
            }

            let parent_info = self.get_directory(parent);
            if parent_info.as_ref().map(|info| info.size) == previous_size {
                break;
            }
            item = parent_info.map(|info| info.as_item());
            current = parent.to_string();
        }
    }
}

fn with_folder_item(info: &DirectoryInfo, name: &str, item: Option<ItemInfo>) -> DirectoryInfo {
    let mut folders: Vec<ItemInfo> = info
        .folders
        .iter()
        .filter(|existing| existing.name != name)
        .cloned()
        .collect();
    if let Some(item) = item {
        folders.push(item);
        folders.sort_by(|a, b| a.name.cmp(&b.name));
    }
    let mut next = DirectoryInfo {
        folders,
        ..info.clone()
    };
    next.size = next.children_size();
    next
}
