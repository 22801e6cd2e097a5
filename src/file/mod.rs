// offstream - Offline HLS Stream Management
// Copyright (C) 2025 offstream contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Local file system operations
//!
//! The small capability surface the coordinator needs: existence checks,
//! recursive size accumulation, and tree deletion. Downloaded HLS assets
//! are directory trees (manifest plus segments), so deletion and sizing
//! always operate on whole trees.

use std::io;
use std::path::Path;

use tokio::fs;
use walkdir::WalkDir;

/// Whether anything exists at `path`.
pub async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

/// Recursive byte size of the tree under `path`.
///
/// Entries whose metadata cannot be read contribute 0 rather than
/// failing the whole accumulation. A missing path sizes to 0.
pub async fn tree_size(path: &Path) -> u64 {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        WalkDir::new(&path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.metadata().ok())
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
            .sum()
    })
    .await
    .unwrap_or(0)
}

/// Delete the file or directory tree at `path`.
pub async fn remove_tree(path: &Path) -> io::Result<()> {
    let meta = fs::metadata(path).await?;
    if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tree_size_sums_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Sample");
        std::fs::create_dir_all(root.join("segments")).unwrap();
        std::fs::write(root.join("master.m3u8"), vec![0u8; 120]).unwrap();
        std::fs::write(root.join("segments/0.ts"), vec![0u8; 1000]).unwrap();
        std::fs::write(root.join("segments/1.ts"), vec![0u8; 880]).unwrap();

        assert_eq!(tree_size(&root).await, 2000);
    }

    #[tokio::test]
    async fn test_tree_size_of_missing_path_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(tree_size(&dir.path().join("nope")).await, 0);
    }

    #[tokio::test]
    async fn test_remove_tree_handles_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("asset");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("index.m3u8"), b"#EXTM3U").unwrap();
        let single = dir.path().join("single.m3u8");
        std::fs::write(&single, b"#EXTM3U").unwrap();

        remove_tree(&tree).await.unwrap();
        remove_tree(&single).await.unwrap();
        assert!(!exists(&tree).await);
        assert!(!exists(&single).await);
    }

    #[tokio::test]
    async fn test_remove_tree_propagates_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = remove_tree(&dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
