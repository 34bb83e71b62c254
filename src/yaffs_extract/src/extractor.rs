use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use nix::sys::stat::{fchmodat, mknod, FchmodatFlags, Mode, SFlag};
use nix::unistd::{chown, Gid, Uid};

use crate::config::Config;
use crate::entry::{ObjectRecord, ObjectType};
use crate::error::YaffsError;

const MODE_MASK: u32 = 0o7777;
const S_IFMT: u32 = 0o170000;

/// `obj_id → record` (last write wins) and `obj_id → relative path`
/// maps, built in a single pass over the log (§4.6).
#[derive(Debug, Default)]
pub struct ObjectTable {
    pub entries: HashMap<u32, ObjectRecord>,
    pub paths: HashMap<u32, Vec<u8>>,
}

/// Counts of objects actually created during materialisation (§4.6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub dirs_created: usize,
    pub files_created: usize,
    pub links_created: usize,
}

impl ObjectTable {
    /// Drains a record stream into the two maps. Path computation
    /// happens at insert time, in emission order, which is why this
    /// takes an iterator rather than a pre-collected `Vec`: mkyaffs
    /// output places parents before children, so a parent's path is
    /// already resolvable by the time its children are seen (§4.6).
    pub fn build<I>(records: I) -> Result<ObjectTable, YaffsError>
    where
        I: IntoIterator<Item = Result<ObjectRecord, YaffsError>>,
    {
        let mut table = ObjectTable::default();
        for record in records {
            let record = record?;
            table.insert(record);
        }
        Ok(table)
    }

    fn insert(&mut self, record: ObjectRecord) {
        let path = match self.paths.get(&record.parent_obj_id) {
            Some(parent_path) => join_path(parent_path, &record.name),
            None => {
                if record.parent_obj_id != 1 {
                    log::warn!(
                        "object #{} ({:?}) is the child of an unknown parent object [{}]",
                        record.obj_id,
                        String::from_utf8_lossy(&record.name),
                        record.parent_obj_id
                    );
                }
                record.name.clone()
            }
        };

        if log::log_enabled!(log::Level::Debug) {
            log_entry(&record, &path);
        }

        self.paths.insert(record.obj_id, path);
        self.entries.insert(record.obj_id, record);
    }

    /// Object ids in ascending order. The three materialisation passes
    /// iterate in this order purely for deterministic test output — §5
    /// explicitly says within-pass order must not be relied on for
    /// correctness.
    fn sorted_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.paths.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Builds absolute host paths and creates every object in the fixed
    /// three-pass order required by §4.6: directories, then files and
    /// specials, then links. Every failure is a warning, not an abort
    /// (§7).
    pub fn materialise(&self, outdir: &Path, config: &Config) -> Counters {
        let mut counters = Counters::default();
        let ids = self.sorted_ids();

        for id in &ids {
            let Some(path) = self.paths.get(id) else { continue };
            if path.is_empty() {
                continue;
            }
            let Some(entry) = self.entries.get(id) else { continue };
            if entry.obj_type != ObjectType::Directory {
                continue;
            }

            let full = full_path(outdir, path);
            match fs::create_dir_all(&full) {
                Ok(()) => {
                    apply_mode_owner(&full, entry, config);
                    counters.dirs_created += 1;
                }
                Err(e) => log::warn!("failed to create directory '{}': {e}", full.display()),
            }
        }

        for id in &ids {
            let Some(path) = self.paths.get(id) else { continue };
            if path.is_empty() {
                continue;
            }
            let Some(entry) = self.entries.get(id) else { continue };

            match entry.obj_type {
                ObjectType::File => {
                    let full = full_path(outdir, path);
                    match fs::write(&full, &entry.file_data) {
                        Ok(()) => {
                            apply_mode_owner(&full, entry, config);
                            counters.files_created += 1;
                        }
                        Err(e) => log::warn!("failed to create file '{}': {e}", full.display()),
                    }
                }
                ObjectType::Special => {
                    let full = full_path(outdir, path);
                    create_special(&full, entry, config, &mut counters);
                }
                _ => {}
            }
        }

        for id in &ids {
            let Some(path) = self.paths.get(id) else { continue };
            if path.is_empty() {
                continue;
            }
            let Some(entry) = self.entries.get(id) else { continue };

            match entry.obj_type {
                ObjectType::Symlink => {
                    if entry.alias.is_empty() {
                        log::warn!("object #{} has an empty symlink target, skipping", entry.obj_id);
                        continue;
                    }
                    let dst = full_path(outdir, path);
                    let src = OsStr::from_bytes(&entry.alias);
                    match symlink(src, &dst) {
                        Ok(()) => counters.links_created += 1,
                        Err(e) => log::warn!("failed to create symlink '{}' -> '{:?}': {e}", dst.display(), src),
                    }
                }
                ObjectType::HardLink => {
                    let Some(target_path) = self.paths.get(&entry.equiv_id) else {
                        log::warn!(
                            "object #{} is a hard link to unknown object [{}], skipping",
                            entry.obj_id,
                            entry.equiv_id
                        );
                        continue;
                    };
                    let dst = full_path(outdir, path);
                    let src = full_path(outdir, target_path);
                    match fs::hard_link(&src, &dst) {
                        Ok(()) => counters.links_created += 1,
                        Err(e) => log::warn!("failed to create hard link '{}' -> '{}': {e}", dst.display(), src.display()),
                    }
                }
                _ => {}
            }
        }

        counters
    }
}

fn join_path(parent: &[u8], name: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parent.len() + 1 + name.len());
    out.extend_from_slice(parent);
    out.push(b'/');
    out.extend_from_slice(name);
    out
}

fn full_path(outdir: &Path, relative: &[u8]) -> PathBuf {
    outdir.join(OsStr::from_bytes(relative))
}

fn apply_mode_owner(path: &Path, entry: &ObjectRecord, config: &Config) {
    if config.preserve_mode {
        let mode = Mode::from_bits_truncate(entry.yst_mode & MODE_MASK);
        if let Err(e) = fchmodat(None, path, mode, FchmodatFlags::FollowSymlink) {
            log::warn!("failed to chmod '{}': {e}", path.display());
        }
    }
    if config.preserve_owner {
        let uid = Uid::from_raw(entry.yst_uid);
        let gid = Gid::from_raw(entry.yst_gid);
        if let Err(e) = chown(path, Some(uid), Some(gid)) {
            log::warn!("failed to chown '{}': {e}", path.display());
        }
    }
}

/// Device nodes require elevated privilege; a failure here is a warning
/// like any other materialisation error (§9).
fn create_special(path: &Path, entry: &ObjectRecord, config: &Config, counters: &mut Counters) {
    let kind_bits = entry.yst_mode & S_IFMT;
    let kind = SFlag::from_bits_truncate(kind_bits);
    let kind = if kind.is_empty() { SFlag::S_IFCHR } else { kind };
    let perm = Mode::from_bits_truncate(entry.yst_mode & MODE_MASK);

    match mknod(path, kind, perm, entry.yst_rdev as u64) {
        Ok(()) => {
            counters.files_created += 1;
            if config.preserve_owner {
                let uid = Uid::from_raw(entry.yst_uid);
                let gid = Gid::from_raw(entry.yst_gid);
                if let Err(e) = chown(path, Some(uid), Some(gid)) {
                    log::warn!("failed to chown device node '{}': {e}", path.display());
                }
            }
        }
        Err(e) => log::warn!("failed to create special device file '{}': {e}", path.display()),
    }
}

fn log_entry(record: &ObjectRecord, path: &[u8]) {
    log::debug!(
        "obj #{} type={:?} parent={} path={:?} size={}",
        record.obj_id,
        record.obj_type,
        record.parent_obj_id,
        String::from_utf8_lossy(path),
        record.file_size
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spare::SpareRecord;
    use std::os::unix::fs::PermissionsExt;

    fn record(obj_id: u32, obj_type: ObjectType, parent: u32, name: &str) -> ObjectRecord {
        ObjectRecord {
            obj_id,
            obj_type,
            parent_obj_id: parent,
            name: name.as_bytes().to_vec(),
            yst_mode: 0o644,
            yst_uid: 0,
            yst_gid: 0,
            yst_atime: 0,
            yst_mtime: 0,
            yst_ctime: 0,
            file_size: 0,
            equiv_id: 0,
            alias: Vec::new(),
            yst_rdev: 0,
            win_ctime_1: 0,
            win_ctime_2: 0,
            win_atime_1: 0,
            win_atime_2: 0,
            win_mtime_1: 0,
            win_mtime_2: 0,
            inband_shadowed_obj_id: 0,
            inband_is_shrink: 0,
            reserved: 0,
            shadows_obj: 0,
            is_shrink: 0,
            spare: SpareRecord { chunk_id: 0, obj_id },
            file_data: Vec::new(),
        }
    }

    #[test]
    fn path_composition_joins_parent_and_name() {
        let mut table = ObjectTable::default();
        table.insert(record(0x101, ObjectType::Directory, 1, "dir1"));
        table.insert(record(0x102, ObjectType::File, 0x101, "a.txt"));

        assert_eq!(table.paths[&0x101], b"dir1");
        assert_eq!(table.paths[&0x102], b"dir1/a.txt");
    }

    #[test]
    fn orphan_parent_becomes_top_level() {
        let mut table = ObjectTable::default();
        table.insert(record(0x200, ObjectType::File, 0x999, "orphan"));
        assert_eq!(table.paths[&0x200], b"orphan");
    }

    #[test]
    fn directory_then_file_extraction_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ObjectTable::default();

        let mut dir_rec = record(0x101, ObjectType::Directory, 1, "dir1");
        dir_rec.yst_mode = 0o755;
        table.insert(dir_rec);

        let mut file_rec = record(0x102, ObjectType::File, 0x101, "a.txt");
        file_rec.file_data = b"hello\n".to_vec();
        file_rec.file_size = 6;
        table.insert(file_rec);

        let config = Config::default();
        let counters = table.materialise(dir.path(), &config);

        assert_eq!(counters, Counters { dirs_created: 1, files_created: 1, links_created: 0 });

        let contents = fs::read(dir.path().join("dir1/a.txt")).unwrap();
        assert_eq!(contents, b"hello\n");
    }

    #[test]
    fn symlink_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ObjectTable::default();

        let mut link = record(0x200, ObjectType::Symlink, 1, "link");
        link.alias = b"../target".to_vec();
        table.insert(link);

        let config = Config::default();
        let counters = table.materialise(dir.path(), &config);
        assert_eq!(counters, Counters { dirs_created: 0, files_created: 0, links_created: 1 });

        let target = fs::read_link(dir.path().join("link")).unwrap();
        assert_eq!(target, PathBuf::from("../target"));
    }

    #[test]
    fn hard_link_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ObjectTable::default();

        let mut file = record(0x300, ObjectType::File, 1, "a");
        file.file_data = b"X".to_vec();
        file.file_size = 1;
        table.insert(file);

        let mut hardlink = record(0x301, ObjectType::HardLink, 1, "b");
        hardlink.equiv_id = 0x300;
        table.insert(hardlink);

        let config = Config::default();
        let counters = table.materialise(dir.path(), &config);
        assert_eq!(counters, Counters { dirs_created: 0, files_created: 1, links_created: 1 });

        assert_eq!(fs::read(dir.path().join("a")).unwrap(), b"X");
        assert_eq!(fs::read(dir.path().join("b")).unwrap(), b"X");
    }

    #[test]
    fn dangling_hard_link_is_a_warning_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ObjectTable::default();

        let mut hardlink = record(0x301, ObjectType::HardLink, 1, "b");
        hardlink.equiv_id = 0xDEAD;
        table.insert(hardlink);

        let config = Config::default();
        let counters = table.materialise(dir.path(), &config);
        assert_eq!(counters.links_created, 0);
    }

    #[test]
    fn preserve_mode_applies_permission_bits() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ObjectTable::default();

        let mut dir_rec = record(0x101, ObjectType::Directory, 1, "dir1");
        dir_rec.yst_mode = 0o040_750; // S_IFDIR | 0750
        table.insert(dir_rec);

        let config = Config {
            preserve_mode: true,
            ..Config::default()
        };
        table.materialise(dir.path(), &config);

        let meta = fs::metadata(dir.path().join("dir1")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o7777, 0o750);
    }
}
