// trailer-core - cross-process housekeeping lock protocol
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Cross-host advisory lock protocol for the housekeeping driver
//!
//! This module is a library contract only: it holds the lock file, the
//! auto-trigger predicates, and nothing resembling the orchestrator's own
//! `repack`/`prune`/`reflog expire` subprocess invocations, which remain
//! that sibling binary's responsibility.
//!

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use lazy_static::lazy_static;

use crate::error::{Error, ErrorKind, Result, ResultExt};

const STALE_AFTER_SECS: u64 = 12 * 3600;
const LOCK_FILE_NAME: &str = "gc.pid";

lazy_static! {
    /// Path and pid of whichever lock this process currently holds, read by
    /// the signal handler installed in `acquire`.
    static ref HELD_LOCK: Mutex<Option<(PathBuf, u32)>> = Mutex::new(None);
}

/// A held housekeeping lock
///
/// Removes its lock file on drop, but only if the file still names this
/// process's pid — a concurrent holder (e.g. one that raced in after a
/// `force`-broken stale lock) must not have its own, still-valid file
/// deleted out from under it.
pub struct GcLock {
    path: PathBuf,
    pid: u32,
}

impl GcLock {
    fn cleanup(path: &Path, pid: u32) {
        if let Ok(mut file) = File::open(path) {
            let mut contents = String::new();
            if file.read_to_string(&mut contents).is_ok() {
                let recorded_pid = contents.split_whitespace().next().and_then(|s| s.parse::<u32>().ok());
                if recorded_pid != Some(pid) {
                    return;
                }
            }
        }
        let _ = fs::remove_file(path);
    }
}

impl Drop for GcLock {
    fn drop(&mut self) {
        Self::cleanup(&self.path, self.pid);
        *HELD_LOCK.lock().unwrap() = None;
    }
}

extern "C" fn handle_terminating_signal(signo: i32) {
    if let Ok(guard) = HELD_LOCK.lock() {
        if let Some((path, pid)) = guard.as_ref() {
            GcLock::cleanup(path, *pid);
        }
    }
    unsafe {
        libc::signal(signo, libc::SIG_DFL);
        libc::raise(signo);
    }
}

fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGINT, handle_terminating_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_terminating_signal as libc::sighandler_t);
        libc::signal(libc::SIGHUP, handle_terminating_signal as libc::sighandler_t);
    }
}

fn hostname() -> String {
    let mut buf = vec![0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return "unknown".to_owned();
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

fn process_alive(pid: u32) -> bool {
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Attempt to acquire the housekeeping lock under `repo_path`
///
/// `force` bypasses the staleness/liveness check, matching `--force` on the
/// upstream command, but not the exclusive-creation step below: every
/// acquirer, forced or not, first takes sole ownership of `<lock>.lock` via
/// `create_new`, which is fatal on failure. That serializes the
/// staleness read and the final commit against every other concurrent
/// `acquire`, so at most one of them ever writes `path` for a given race.
pub fn acquire(repo_path: &Path, force: bool) -> Result<GcLock> {
    let path = repo_path.join(LOCK_FILE_NAME);
    let staging_path = repo_path.join(format!("{}.lock", LOCK_FILE_NAME));
    let my_host = hostname();
    let my_pid = std::process::id();

    let mut staging = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staging_path)
        .chain_err(|| ErrorKind::LockCreateFailed(staging_path.display().to_string()))?;

    if !force {
        if let Some((host, pid)) = read_existing(&path) {
            if host == my_host && !process_alive(pid) {
                // stale: same host, pid no longer running, fall through and steal it
            } else if is_fresh(&path) {
                let _ = fs::remove_file(&staging_path);
                return Err(Error::from(ErrorKind::LockAlreadyHeld(host, pid)));
            }
        }
    }

    let commit = write!(staging, "{} {}", my_pid, my_host).and_then(|_| staging.sync_all());
    drop(staging);
    if let Err(err) = commit {
        let _ = fs::remove_file(&staging_path);
        return Err(err).chain_err(|| ErrorKind::LockCreateFailed(path.display().to_string()));
    }
    if let Err(err) = fs::rename(&staging_path, &path) {
        let _ = fs::remove_file(&staging_path);
        return Err(err).chain_err(|| ErrorKind::LockCreateFailed(path.display().to_string()));
    }

    *HELD_LOCK.lock().unwrap() = Some((path.clone(), my_pid));
    install_signal_handlers();

    Ok(GcLock { path, pid: my_pid })
}

fn is_fresh(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map_or(false, |age| age.as_secs() <= STALE_AFTER_SECS)
}

fn read_existing(path: &Path) -> Option<(String, u32)> {
    let contents = fs::read_to_string(path).ok()?;
    let mut parts = contents.splitn(2, ' ');
    let pid = parts.next()?.trim().parse().ok()?;
    let host = parts.next()?.trim().to_owned();
    Some((host, pid))
}

/// Whether the `17` bucket of the object store holds more loose objects than
/// `threshold/256` would predict for the whole store
///
/// `bucket_entries` is the directory listing of that single bucket; this
/// function never touches the filesystem itself.
pub fn too_many_loose_objects<I>(bucket_entries: I, threshold: i64) -> bool
where
    I: IntoIterator<Item = String>,
{
    if threshold <= 0 {
        return false;
    }
    let auto_threshold = (threshold + 255) / 256;
    let mut count = 0i64;
    for name in bucket_entries {
        if is_loose_object_name(&name) {
            count += 1;
            if count > auto_threshold {
                return true;
            }
        }
    }
    false
}

fn is_loose_object_name(name: &str) -> bool {
    name.len() == 38 && name.bytes().all(|b| b.is_ascii_digit() || (b.is_ascii_lowercase() && b.is_ascii_hexdigit()))
}

/// Whether the count of local, non-kept pack files meets the configured limit
pub fn too_many_packs(local_non_kept_pack_count: usize, limit: i64) -> bool {
    limit > 0 && local_non_kept_pack_count as i64 >= limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_loose_objects_respects_threshold() {
        let names: Vec<String> = (0..10).map(|i| format!("{:038x}", i)).collect();
        assert!(!too_many_loose_objects(names.clone(), 6700));
        assert!(too_many_loose_objects(names, 1));
    }

    #[test]
    fn too_many_loose_objects_disabled_at_zero_threshold() {
        let names = vec!["0".repeat(38)];
        assert!(!too_many_loose_objects(names, 0));
    }

    #[test]
    fn non_loose_names_are_not_counted() {
        let names = vec!["not-a-sha".to_owned(), "tmp_obj_123".to_owned()];
        assert!(!too_many_loose_objects(names, 1));
    }

    #[test]
    fn too_many_packs_respects_limit() {
        assert!(!too_many_packs(10, 50));
        assert!(too_many_packs(50, 50));
        assert!(!too_many_packs(100, 0));
    }

    #[test]
    fn acquire_writes_pid_and_host() {
        let dir = std::env::temp_dir().join(format!("trailer-core-gc-lock-test-{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let lock = acquire(&dir, true).expect("lock acquisition should succeed");
        let contents = fs::read_to_string(dir.join(LOCK_FILE_NAME)).unwrap();
        assert!(contents.split_whitespace().next().unwrap().parse::<u32>().unwrap() == std::process::id());
        drop(lock);
        assert!(!dir.join(LOCK_FILE_NAME).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn acquire_does_not_leak_the_staging_file_on_success() {
        let dir = std::env::temp_dir().join(format!("trailer-core-gc-lock-test-staging-{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let lock = acquire(&dir, true).expect("lock acquisition should succeed");
        assert!(!dir.join(format!("{}.lock", LOCK_FILE_NAME)).exists());
        drop(lock);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn acquire_is_fatal_when_another_acquirer_holds_the_staging_file() {
        let dir =
            std::env::temp_dir().join(format!("trailer-core-gc-lock-test-contested-{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let staging = dir.join(format!("{}.lock", LOCK_FILE_NAME));
        let _held = OpenOptions::new().write(true).create_new(true).open(&staging).unwrap();

        assert!(acquire(&dir, true).is_err());

        drop(_held);
        let _ = fs::remove_file(&staging);
        let _ = fs::remove_dir_all(&dir);
    }
}
