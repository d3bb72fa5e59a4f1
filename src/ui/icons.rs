// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Application icons for stream rows.
//!
//! Streams only carry an icon name. Names are looked up as PNG files in the
//! freedesktop icon directories under each XDG data dir, then in `pixmaps`.

use crate::audio::types::DEFAULT_ICON;
use directories::BaseDirs;
use iced::widget::image;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const THEMES: &[&str] = &["hicolor", "Adwaita", "breeze"];
const SIZES: &[&str] = &["48x48", "32x32", "64x64", "128x128", "24x24", "256x256"];
const CONTEXTS: &[&str] = &["apps", "mimetypes", "devices", "legacy"];

/// Data directories to search, most specific first.
pub fn search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(base) = BaseDirs::new() {
        roots.push(base.data_local_dir().to_path_buf());
    }

    let data_dirs = std::env::var_os("XDG_DATA_DIRS")
        .filter(|dirs| !dirs.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".into());
    roots.extend(std::env::split_paths(&data_dirs));
    roots
}

/// Find the PNG for icon `name` under `roots`.
pub fn find_icon(roots: &[PathBuf], name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }
    // Anything else with a separator is not an icon name.
    if name.contains('/') {
        return None;
    }

    let file = format!("{}.png", name);
    for root in roots {
        let icons = root.join("icons");
        for theme in THEMES {
            for size in SIZES {
                for context in CONTEXTS {
                    let candidate = icons.join(theme).join(size).join(context).join(&file);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }

        let pixmap = root.join("pixmaps").join(&file);
        if pixmap.is_file() {
            return Some(pixmap);
        }
    }
    None
}

/// Icon handles by name, resolved once per name.
pub struct IconCache {
    roots: Vec<PathBuf>,
    handles: HashMap<String, Option<image::Handle>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::with_roots(search_roots())
    }

    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            handles: HashMap::new(),
        }
    }

    /// Look up `name` unless it was looked up before. Unknown names fall
    /// back to the generic multimedia icon.
    pub fn resolve(&mut self, name: &str) {
        if self.handles.contains_key(name) {
            return;
        }

        let path = find_icon(&self.roots, name)
            .or_else(|| find_icon(&self.roots, DEFAULT_ICON));
        debug!("Icon '{}' -> {:?}", name, path);
        self.handles
            .insert(name.to_string(), path.map(image::Handle::from_path));
    }

    pub fn get(&self, name: &str) -> Option<&image::Handle> {
        self.handles.get(name).and_then(Option::as_ref)
    }
}
