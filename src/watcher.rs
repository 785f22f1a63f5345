use eyre::{Result, WrapErr};
use notify::{
    event::{EventKind, ModifyKind},
    RecommendedWatcher, RecursiveMode, Watcher as _,
};

use std::path::{Path, PathBuf};

/// Replaceable shader of a demo that can be loaded from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderSlot {
    SceneFragment,
    CompositeFragment,
}

/// Watches shader files and reports which slots changed.
///
/// Directories are watched instead of the files themselves: editors that save
/// by renaming a temporary file would otherwise detach the watch.
pub struct Watcher {
    _watcher: RecommendedWatcher,
    files: Vec<(PathBuf, ShaderSlot)>,
    events: crossbeam_channel::Receiver<notify::Event>,
}

impl Watcher {
    pub fn new(files: Vec<(PathBuf, ShaderSlot)>) -> Result<Self> {
        let (tx, events) = crossbeam_channel::unbounded();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        log::debug!("Shader watcher outlived its receiver");
                    }
                }
                Err(err) => log::error!("File watcher error: {err}"),
            })?;

        let files = files
            .into_iter()
            .map(|(path, slot)| {
                let path = path
                    .canonicalize()
                    .wrap_err_with(|| format!("Failed to resolve {}", path.display()))?;
                Ok((path, slot))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut dirs: Vec<&Path> = files.iter().filter_map(|(path, _)| path.parent()).collect();
        dirs.sort();
        dirs.dedup();
        for dir in dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .wrap_err_with(|| format!("Failed to watch {}", dir.display()))?;
            log::info!("Watching {}", dir.display());
        }

        Ok(Self {
            _watcher: watcher,
            files,
            events,
        })
    }

    /// Slots whose file `event` wrote or recreated.
    pub fn changed_slots(&self, event: &notify::Event) -> Vec<ShaderSlot> {
        changed_slots(&self.files, event)
    }

    /// Drains pending events without blocking, each slot reported once.
    pub fn poll(&self) -> Vec<ShaderSlot> {
        let mut changed = Vec::new();
        for event in self.events.try_iter() {
            for slot in self.changed_slots(&event) {
                if !changed.contains(&slot) {
                    changed.push(slot);
                }
            }
        }
        changed
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
    )
}

fn changed_slots(files: &[(PathBuf, ShaderSlot)], event: &notify::Event) -> Vec<ShaderSlot> {
    if !is_write(&event.kind) {
        return Vec::new();
    }

    files
        .iter()
        .filter(|(file, _)| event.paths.iter().any(|path| path == file))
        .map(|&(_, slot)| slot)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};

    fn files() -> Vec<(PathBuf, ShaderSlot)> {
        vec![
            (PathBuf::from("/shaders/scene.frag"), ShaderSlot::SceneFragment),
            (PathBuf::from("/shaders/post.frag"), ShaderSlot::CompositeFragment),
        ]
    }

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn data_change_maps_to_slot() {
        let event = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/shaders/post.frag",
        );
        assert_eq!(
            changed_slots(&files(), &event),
            [ShaderSlot::CompositeFragment]
        );
    }

    #[test]
    fn recreated_file_maps_to_slot() {
        let event = event(EventKind::Create(CreateKind::File), "/shaders/scene.frag");
        assert_eq!(changed_slots(&files(), &event), [ShaderSlot::SceneFragment]);
    }

    #[test]
    fn other_files_are_ignored() {
        let event = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            "/shaders/scene.frag.swp",
        );
        assert!(changed_slots(&files(), &event).is_empty());
    }

    #[test]
    fn reads_and_metadata_are_ignored() {
        let read = event(EventKind::Access(AccessKind::Any), "/shaders/scene.frag");
        assert!(changed_slots(&files(), &read).is_empty());

        let touch = event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)),
            "/shaders/scene.frag",
        );
        assert!(changed_slots(&files(), &touch).is_empty());
    }

    #[test]
    fn watches_real_files() {
        let dir = std::env::temp_dir().join(format!("shadetoy-watch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scene.frag");
        std::fs::write(&path, "void main() {}").unwrap();

        let watcher = Watcher::new(vec![(path.clone(), ShaderSlot::SceneFragment)]).unwrap();

        let canonical = path.canonicalize().unwrap();
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Any)).add_path(canonical);
        assert_eq!(watcher.changed_slots(&event), [ShaderSlot::SceneFragment]);

        drop(watcher);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("shadetoy-missing-dir/none.frag");
        assert!(Watcher::new(vec![(missing, ShaderSlot::SceneFragment)]).is_err());
    }
}
