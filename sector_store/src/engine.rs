// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use host_clock::BlockHeight;
use host_db::{Store, BUCKET_HOST_STATE, BUCKET_SECTOR_USAGE};
use host_types::{SectorId, SectorRoot, StorageFolderUid};

use crate::errors::SectorError;
use crate::folder::StorageFolder;
use crate::usage::SectorUsageRecord;

const FOLDERS_KEY: &str = "storage_folders";

/// Content-addressed sector store, spanning however many storage folders
/// have been registered, and the folder registry itself. One instance owns
/// all mutable state; every public method is safe to call concurrently.
pub struct SectorStore<S> {
    store: S,
    persist_dir: PathBuf,
    host_salt: [u8; 32],
    sector_size: u64,
    maximum_virtual_sectors: usize,
    maximum_storage_folders: usize,
    minimum_storage_folder_size: u64,
    maximum_storage_folder_size: u64,
    storage_folder_uid_len: usize,
    folders: Mutex<Vec<Option<StorageFolder>>>,
}

type Slots = Vec<Option<StorageFolder>>;

fn pick_emptiest(folders: &Slots, sector_size: u64, excluded: &HashSet<StorageFolderUid>) -> Option<usize> {
    folders
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().map(|f| (i, f)))
        .filter(|(_, f)| f.size_remaining >= sector_size)
        .filter(|(_, f)| !excluded.contains(&f.uid))
        .min_by(|(ia, a), (ib, b)| {
            a.usage_ratio()
                .partial_cmp(&b.usage_ratio())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        })
        .map(|(i, _)| i)
}

impl<S: Store> SectorStore<S> {
    pub fn open(
        store: S,
        persist_dir: PathBuf,
        host_salt: [u8; 32],
        params: &host_types::HostParams,
    ) -> Result<Self, SectorError> {
        let folders = match store.read_bucket(FOLDERS_KEY, BUCKET_HOST_STATE)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SectorError::CorruptRecord(e.to_string()))?,
            None => Vec::new(),
        };
        Ok(SectorStore {
            store,
            persist_dir,
            host_salt,
            sector_size: params.sector_size,
            maximum_virtual_sectors: params.maximum_virtual_sectors,
            maximum_storage_folders: params.maximum_storage_folders,
            minimum_storage_folder_size: params.minimum_storage_folder_size,
            maximum_storage_folder_size: params.maximum_storage_folder_size,
            storage_folder_uid_len: params.storage_folder_uid_len,
            folders: Mutex::new(folders),
        })
    }

    pub fn folders(&self) -> Vec<StorageFolder> {
        self.folders.lock().iter().flatten().cloned().collect()
    }

    fn persist_folders(&self, folders: &Slots) -> Result<(), SectorError> {
        let bytes = serde_json::to_vec(folders).expect("storage folder list is serializable");
        self.store.write_bucket(FOLDERS_KEY, bytes, BUCKET_HOST_STATE)?;
        Ok(())
    }

    fn load_usage(&self, id: SectorId) -> Result<Option<SectorUsageRecord>, SectorError> {
        match self.store.read_bucket(id.as_ref(), BUCKET_SECTOR_USAGE)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(|e| SectorError::CorruptRecord(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn save_usage(&self, id: SectorId, record: &SectorUsageRecord) -> Result<(), SectorError> {
        let bytes = serde_json::to_vec(record).expect("sector usage record is serializable");
        self.store.write_bucket(id.as_ref(), bytes, BUCKET_SECTOR_USAGE)?;
        Ok(())
    }

    fn delete_usage(&self, id: SectorId) -> Result<(), SectorError> {
        self.store.delete_bucket(id.as_ref(), BUCKET_SECTOR_USAGE)?;
        Ok(())
    }

    fn sector_path(folder: &StorageFolder, id: SectorId) -> PathBuf {
        folder.path.join(id.to_filename())
    }

    // ---- Sector engine (4.A) ----------------------------------------

    pub fn add_sector(
        &self,
        root: SectorRoot,
        expiry: BlockHeight,
        bytes: &[u8],
    ) -> Result<(), SectorError> {
        if bytes.len() as u64 != self.sector_size {
            return Err(SectorError::IncorrectSize {
                expected: self.sector_size,
                got: bytes.len() as u64,
            });
        }
        let id = host_crypto::sector_id(&root, &self.host_salt);

        if let Some(mut record) = self.load_usage(id)? {
            if record.expiries.len() >= self.maximum_virtual_sectors {
                return Err(SectorError::MaxVirtualSectors {
                    max: self.maximum_virtual_sectors,
                });
            }
            record.expiries.push(expiry);
            self.save_usage(id, &record)?;
            return Ok(());
        }

        let mut tried = HashSet::new();
        let mut any_attempted = false;
        loop {
            let (idx, uid, path) = {
                let mut folders = self.folders.lock();
                let idx = match pick_emptiest(&folders, self.sector_size, &tried) {
                    Some(i) => i,
                    None if any_attempted => return Err(SectorError::DiskTrouble),
                    None => return Err(SectorError::InsufficientStorage),
                };
                let folder = folders[idx].as_mut().expect("index from pick_emptiest is occupied");
                folder.size_remaining -= self.sector_size;
                (idx, folder.uid.clone(), folder.path.clone())
            };
            any_attempted = true;

            match write_sector_file(&path, id, bytes) {
                Ok(()) => {
                    let mut folders = self.folders.lock();
                    if let Some(folder) = folders[idx].as_mut() {
                        folder.successful_writes += 1;
                    }
                    self.persist_folders(&folders)?;
                    drop(folders);
                    self.save_usage(
                        id,
                        &SectorUsageRecord {
                            storage_folder_uid: uid,
                            expiries: vec![expiry],
                            corrupted: false,
                        },
                    )?;
                    return Ok(());
                }
                Err(_) => {
                    let mut folders = self.folders.lock();
                    if let Some(folder) = folders[idx].as_mut() {
                        folder.size_remaining += self.sector_size;
                        folder.failed_writes += 1;
                    }
                    self.persist_folders(&folders)?;
                    drop(folders);
                    tried.insert(uid);
                    continue;
                }
            }
        }
    }

    pub fn read_sector(&self, root: SectorRoot) -> Result<Vec<u8>, SectorError> {
        let id = host_crypto::sector_id(&root, &self.host_salt);
        let record = self.load_usage(id)?.ok_or(SectorError::SectorNotFound)?;
        if record.corrupted {
            return Err(SectorError::SectorCorrupted);
        }

        let path = {
            let folders = self.folders.lock();
            folders
                .iter()
                .flatten()
                .find(|f| f.uid == record.storage_folder_uid)
                .map(|f| Self::sector_path(f, id))
        };
        let Some(path) = path else {
            self.bump_read_counter(&record.storage_folder_uid, false);
            self.mark_corrupted(id, record);
            return Err(SectorError::SectorNotFound);
        };

        match fs::read(&path) {
            Ok(bytes) => {
                self.bump_read_counter(&record.storage_folder_uid, true);
                Ok(bytes)
            }
            Err(e) => {
                self.bump_read_counter(&record.storage_folder_uid, false);
                self.mark_corrupted(id, record);
                Err(e.into())
            }
        }
    }

    fn mark_corrupted(&self, id: SectorId, mut record: SectorUsageRecord) {
        record.corrupted = true;
        let _ = self.save_usage(id, &record);
    }

    fn bump_read_counter(&self, uid: &StorageFolderUid, success: bool) {
        let mut folders = self.folders.lock();
        if let Some(folder) = folders.iter_mut().flatten().find(|f| &f.uid == uid) {
            if success {
                folder.successful_reads += 1;
            } else {
                folder.failed_reads += 1;
            }
        }
        let _ = self.persist_folders(&folders);
    }

    pub fn remove_sector(&self, root: SectorRoot, expiry: BlockHeight) -> Result<(), SectorError> {
        let id = host_crypto::sector_id(&root, &self.host_salt);
        let mut record = self.load_usage(id)?.ok_or(SectorError::SectorNotFound)?;

        let pos = record
            .expiries
            .iter()
            .position(|&e| e == expiry)
            .ok_or(SectorError::SectorNotFound)?;
        record.expiries.remove(pos);

        if record.expiries.is_empty() {
            self.delete_usage(id)?;
            let mut folders = self.folders.lock();
            if let Some(folder) = folders
                .iter_mut()
                .flatten()
                .find(|f| f.uid == record.storage_folder_uid)
            {
                let path = Self::sector_path(folder, id);
                folder.size_remaining += self.sector_size;
                let _ = fs::remove_file(path);
            }
            self.persist_folders(&folders)?;
        } else {
            self.save_usage(id, &record)?;
        }
        Ok(())
    }

    // ---- Storage-folder manager (4.B) --------------------------------

    pub fn add_storage_folder(&self, path: PathBuf, size: u64) -> Result<StorageFolderUid, SectorError> {
        if size < self.minimum_storage_folder_size || size > self.maximum_storage_folder_size {
            return Err(SectorError::FolderSizeOutOfBounds {
                min: self.minimum_storage_folder_size,
                max: self.maximum_storage_folder_size,
            });
        }
        if !path.is_dir() {
            return Err(SectorError::InvalidFolderPath);
        }

        let mut folders = self.folders.lock();
        if folders.iter().flatten().count() >= self.maximum_storage_folders {
            return Err(SectorError::TooManyStorageFolders {
                max: self.maximum_storage_folders,
            });
        }

        let uid = loop {
            let candidate = random_uid(self.storage_folder_uid_len);
            if !folders.iter().flatten().any(|f| f.uid == candidate) {
                break candidate;
            }
        };

        let symlink_path = self.persist_dir.join(uid.to_hex());
        #[cfg(unix)]
        std::os::unix::fs::symlink(&path, &symlink_path)?;
        #[cfg(not(unix))]
        let _ = &symlink_path;

        let folder = StorageFolder::new(uid.clone(), path, size);
        if let Some(slot) = folders.iter_mut().find(|s| s.is_none()) {
            *slot = Some(folder);
        } else {
            folders.push(Some(folder));
        }
        self.persist_folders(&folders)?;
        Ok(uid)
    }

    pub fn remove_storage_folder(&self, index: usize, force: bool) -> Result<(), SectorError> {
        let (source_uid, bytes_to_move) = {
            let folders = self.folders.lock();
            let f = folders
                .get(index)
                .and_then(|s| s.as_ref())
                .ok_or(SectorError::BadStorageFolderIndex(index))?;
            (f.uid.clone(), f.size - f.size_remaining)
        };

        let complete = self.offload(&source_uid, bytes_to_move)?;

        if !complete && !force {
            return Err(SectorError::IncompleteOffload);
        }

        let mut folders = self.folders.lock();
        folders[index] = None;
        self.persist_folders(&folders)?;
        Ok(())
    }

    pub fn resize_storage_folder(&self, index: usize, new_size: u64) -> Result<(), SectorError> {
        if new_size < self.minimum_storage_folder_size || new_size > self.maximum_storage_folder_size {
            return Err(SectorError::FolderSizeOutOfBounds {
                min: self.minimum_storage_folder_size,
                max: self.maximum_storage_folder_size,
            });
        }
        let (uid, used, old_size) = {
            let folders = self.folders.lock();
            let f = folders
                .get(index)
                .and_then(|s| s.as_ref())
                .ok_or(SectorError::BadStorageFolderIndex(index))?;
            (f.uid.clone(), f.size - f.size_remaining, f.size)
        };

        if new_size >= old_size {
            let mut folders = self.folders.lock();
            if let Some(f) = folders[index].as_mut() {
                let delta = new_size - old_size;
                f.size += delta;
                f.size_remaining += delta;
            }
            self.persist_folders(&folders)?;
            return Ok(());
        }

        if used <= new_size {
            let mut folders = self.folders.lock();
            if let Some(f) = folders[index].as_mut() {
                f.size_remaining -= old_size - new_size;
                f.size = new_size;
            }
            self.persist_folders(&folders)?;
            return Ok(());
        }

        let to_offload = used - new_size;
        let complete = self.offload(&uid, to_offload)?;
        let mut folders = self.folders.lock();
        if let Some(f) = folders[index].as_mut() {
            let still_used = f.size - f.size_remaining;
            if complete {
                f.size = new_size;
                f.size_remaining = new_size - still_used.min(new_size);
            } else {
                // clamp to "used" so no further writes land on it
                f.size = still_used;
                f.size_remaining = 0;
            }
        }
        self.persist_folders(&folders)?;
        if !complete {
            return Err(SectorError::IncompleteOffload);
        }
        Ok(())
    }

    /// Moves up to `bytes` worth of sectors off `source`, onto other
    /// eligible folders. Returns `true` if the full amount was moved.
    fn offload(&self, source: &StorageFolderUid, bytes: u64) -> Result<bool, SectorError> {
        let mut moved = 0u64;
        for (key, value) in self.store.iter_bucket(BUCKET_SECTOR_USAGE)? {
            if moved >= bytes {
                break;
            }
            if key.len() != 12 {
                continue;
            }
            let mut record: SectorUsageRecord = match serde_json::from_slice(&value) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if record.storage_folder_uid != *source {
                continue;
            }
            let mut id_bytes = [0u8; 12];
            id_bytes.copy_from_slice(&key);
            let id = SectorId(id_bytes);

            let source_path = {
                let folders = self.folders.lock();
                folders
                    .iter()
                    .flatten()
                    .find(|f| f.uid == *source)
                    .map(|f| Self::sector_path(f, id))
            };
            let Some(source_path) = source_path else { continue };
            let Ok(bytes_read) = fs::read(&source_path) else { continue };

            let mut excluded = HashSet::new();
            excluded.insert(source.clone());
            let moved_this_sector = loop {
                let dest_idx = {
                    let folders = self.folders.lock();
                    pick_emptiest(&folders, self.sector_size, &excluded)
                };
                let Some(dest_idx) = dest_idx else { break false };
                let (dest_uid, dest_path) = {
                    let mut folders = self.folders.lock();
                    let f = folders[dest_idx].as_mut().expect("index from pick_emptiest is occupied");
                    f.size_remaining -= self.sector_size;
                    (f.uid.clone(), f.path.clone())
                };
                match write_sector_file(&dest_path, id, &bytes_read) {
                    Ok(()) => {
                        record.storage_folder_uid = dest_uid;
                        let _ = self.save_usage(id, &record);
                        let _ = fs::remove_file(&source_path);
                        let mut folders = self.folders.lock();
                        if let Some(f) = folders.iter_mut().flatten().find(|f| f.uid == *source) {
                            f.size_remaining += self.sector_size;
                        }
                        let _ = self.persist_folders(&folders);
                        break true;
                    }
                    Err(_) => {
                        let mut folders = self.folders.lock();
                        if let Some(f) = folders[dest_idx].as_mut() {
                            f.size_remaining += self.sector_size;
                            f.failed_writes += 1;
                        }
                        let _ = self.persist_folders(&folders);
                        excluded.insert(dest_uid);
                        continue;
                    }
                }
            };
            if moved_this_sector {
                moved += self.sector_size;
            }
        }
        Ok(moved >= bytes)
    }
}

fn write_sector_file(dir: &Path, id: SectorId, bytes: &[u8]) -> std::io::Result<()> {
    let path = dir.join(id.to_filename());
    match fs::write(&path, bytes) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&path);
            Err(e)
        }
    }
}

fn random_uid(len: usize) -> StorageFolderUid {
    use rand::RngCore;
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    StorageFolderUid(bytes)
}
