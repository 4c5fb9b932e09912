/// Batch relocation of classified files into category subdirectories.
///
/// The relocator builds a candidate list from the top level of a directory,
/// moves each candidate into `<dir>/<category>/`, resolves name collisions by
/// numbering (`a.txt`, `a_1.txt`, `a_2.txt`, ...) and folds per-file failures
/// into one aggregated error. Running out of disk space is the one failure that
/// stops a batch early.
use crate::config::CompiledFilters;
use crate::error::{MoveFailure, MoveFailureReason, SortError, SortResult};
use crate::file_category::{ExtensionTable, extension_of, normalize_extension};
use crate::scanner::list_files;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Filesystem operations used by a batch.
///
/// [`FsMover`] is the real implementation; tests substitute their own to
/// simulate locked files or a full disk.
pub trait FileMover {
    /// True only for a real directory. A symlink to a directory is not one.
    fn is_dir(&self, path: &Path) -> bool;

    /// True if anything, including a dangling symlink, occupies `path`.
    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`FileMover`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMover;

impl FileMover for FsMover {
    fn is_dir(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|metadata| metadata.is_dir())
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                copy_then_remove(from, to, |from, to| fs::copy(from, to))
            }
            result => result,
        }
    }
}

/// Copies `from` to `to`, then removes `from`.
///
/// A failed copy removes whatever part of `to` was written, so the source
/// stays the only copy.
fn copy_then_remove<C>(from: &Path, to: &Path, copy: C) -> io::Result<()>
where
    C: Fn(&Path, &Path) -> io::Result<u64>,
{
    if let Err(e) = copy(from, to) {
        if let Err(cleanup) = fs::remove_file(to)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %to.display(), error = %cleanup, "could not remove partial copy");
        }
        return Err(e);
    }
    fs::remove_file(from)
}

/// Receives `(current, total)` before each file and once more on completion.
///
/// Calls happen synchronously on the thread running the batch.
pub trait ProgressObserver {
    fn on_progress(&mut self, current: usize, total: usize);
}

impl<F: FnMut(usize, usize)> ProgressObserver for F {
    fn on_progress(&mut self, current: usize, total: usize) {
        self(current, total)
    }
}

/// Observer that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _current: usize, _total: usize) {}
}

/// A file the batch will try to move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub file_name: String,
    #[serde(skip)]
    os_name: OsString,
    pub source: PathBuf,
    pub category: String,
}

/// The ordered candidate list of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelocationPlan {
    candidates: Vec<Candidate>,
}

impl RelocationPlan {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate file names grouped by category, categories sorted.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for candidate in &self.candidates {
            groups
                .entry(candidate.category.as_str())
                .or_default()
                .push(candidate.file_name.as_str());
        }
        groups
    }
}

/// A file that reached its category folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFile {
    pub file_name: String,
    pub category: String,
    pub destination: PathBuf,
    /// True when a collision forced a numbered name.
    pub renamed: bool,
}

/// Result of a batch in which every candidate was moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    pub moved: Vec<MovedFile>,
}

impl RelocationReport {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    pub fn renamed(&self) -> impl Iterator<Item = &MovedFile> {
        self.moved.iter().filter(|file| file.renamed)
    }

    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.moved {
            *counts.entry(file.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Outcome of one candidate. Disk-full errors never become an outcome; they
/// end the batch.
#[derive(Debug)]
enum MoveOutcome {
    Moved(MovedFile),
    Failed(MoveFailure),
}

/// How a failed filesystem operation affects the batch.
#[derive(Debug, PartialEq, Eq)]
enum FailureClass {
    /// Stop the batch.
    Fatal,
    /// Record against the file and carry on.
    Deferred(MoveFailureReason),
}

fn is_disk_full(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::StorageFull {
        return true;
    }
    match err.raw_os_error() {
        // ENOSPC
        #[cfg(unix)]
        Some(28) => true,
        // ERROR_HANDLE_DISK_FULL, ERROR_DISK_FULL
        #[cfg(windows)]
        Some(39) | Some(112) => true,
        _ => false,
    }
}

fn is_file_in_use(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::ResourceBusy | io::ErrorKind::ExecutableFileBusy
    ) {
        return true;
    }
    match err.raw_os_error() {
        // EBUSY, ETXTBSY
        #[cfg(unix)]
        Some(16) | Some(26) => true,
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        #[cfg(windows)]
        Some(32) | Some(33) => true,
        _ => false,
    }
}

fn classify_failure(err: &io::Error) -> FailureClass {
    if is_disk_full(err) {
        FailureClass::Fatal
    } else if is_file_in_use(err) {
        FailureClass::Deferred(MoveFailureReason::FileInUse)
    } else if err.kind() == io::ErrorKind::PermissionDenied {
        FailureClass::Deferred(MoveFailureReason::PermissionDenied)
    } else {
        FailureClass::Deferred(MoveFailureReason::Other(err.to_string()))
    }
}

/// Splits a file name at its last dot into `(base, ".ext")`. Either half may be
/// empty.
fn split_name(file_name: &OsStr) -> (OsString, OsString) {
    if let Some(name) = file_name.to_str() {
        return match name.rfind('.') {
            Some(idx) => (name[..idx].into(), name[idx..].into()),
            None => (name.into(), OsString::new()),
        };
    }

    // Not valid UTF-8: let Path do the split.
    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let mut dotted = OsString::from(".");
            dotted.push(ext);
            (stem.to_os_string(), dotted)
        }
        _ => (file_name.to_os_string(), OsString::new()),
    }
}

/// Picks the destination for `file_name` inside `folder`.
///
/// Returns `folder/file_name` if it is free, otherwise the first free name of
/// `base_1.ext`, `base_2.ext`, ... Only names are compared; file content is
/// never inspected.
///
/// ```
/// use dirsorter::relocator::resolve_collision;
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// let taken = [Path::new("/t/a.txt"), Path::new("/t/a_1.txt")];
/// let dest = resolve_collision(Path::new("/t"), OsStr::new("a.txt"), |p| taken.contains(&p));
/// assert_eq!(dest, Path::new("/t/a_2.txt"));
/// ```
pub fn resolve_collision(
    folder: &Path,
    file_name: &OsStr,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    let direct = folder.join(file_name);
    if !exists(&direct) {
        return direct;
    }

    let (base, ext) = split_name(file_name);
    let mut counter: u64 = 1;
    loop {
        let mut numbered = base.clone();
        numbered.push(format!("_{}", counter));
        numbered.push(&ext);

        let path = folder.join(numbered);
        if !exists(&path) {
            return path;
        }
        counter += 1;
    }
}

/// Moves selected files of a directory into per-category subfolders.
///
/// A batch is strictly sequential and assumes exclusive access to the
/// category folders; callers must not run two batches on the same directory
/// at once. There is no cancellation and no timeout on individual moves.
pub struct Relocator<'a, M: FileMover = FsMover> {
    table: &'a ExtensionTable,
    filters: Option<&'a CompiledFilters>,
    mover: M,
}

impl<'a> Relocator<'a, FsMover> {
    pub fn new(table: &'a ExtensionTable) -> Self {
        Self {
            table,
            filters: None,
            mover: FsMover,
        }
    }
}

impl<'a, M: FileMover> Relocator<'a, M> {
    /// Replaces the filesystem backend.
    pub fn with_mover<N: FileMover>(self, mover: N) -> Relocator<'a, N> {
        Relocator {
            table: self.table,
            filters: self.filters,
            mover,
        }
    }

    /// Leaves out files the filters reject.
    pub fn with_filters(mut self, filters: &'a CompiledFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Builds the candidate list without touching anything.
    ///
    /// A candidate is a regular file directly inside `dir` whose extension is
    /// both in the table and in `selected`. Extensions in `selected` may be
    /// given in any case, with or without the leading dot. Order follows
    /// directory enumeration. A missing `dir` gives an empty plan.
    pub fn plan(&self, dir: &Path, selected: &HashSet<String>) -> SortResult<RelocationPlan> {
        if !dir.exists() {
            return Ok(RelocationPlan::default());
        }

        let selected: HashSet<String> = selected
            .iter()
            .filter_map(|ext| normalize_extension(ext))
            .collect();

        let mut candidates = Vec::new();
        for file in list_files(dir, self.filters)? {
            let ext = extension_of(&file.name);
            if !selected.contains(&ext) {
                continue;
            }
            let Some(category) = self.table.classify(&file.name) else {
                continue;
            };
            debug!(file = %file.name, category, "candidate");
            candidates.push(Candidate {
                file_name: file.name,
                os_name: file.os_name,
                source: file.path,
                category: category.to_string(),
            });
        }

        Ok(RelocationPlan { candidates })
    }

    /// Runs a batch over `dir`.
    ///
    /// `progress` receives `(i, total)` before candidate `i` and `(total, total)`
    /// after the last one. Pass [`NoProgress`] to ignore it. A missing `dir` is a
    /// no-op that returns an empty report without reporting progress.
    ///
    /// # Errors
    ///
    /// - [`SortError::MoveFailures`] once every candidate has been attempted, if
    ///   any of them failed. The other files are still moved.
    /// - [`SortError::DiskFull`] as soon as a move runs out of space; later
    ///   candidates are not attempted and no completion progress is reported.
    /// - [`SortError::PermissionDenied`] / [`SortError::Io`] if `dir` itself
    ///   cannot be enumerated.
    pub fn relocate<P>(
        &self,
        dir: &Path,
        selected: &HashSet<String>,
        progress: &mut P,
    ) -> SortResult<RelocationReport>
    where
        P: ProgressObserver + ?Sized,
    {
        if !dir.exists() {
            debug!(path = %dir.display(), "relocation path does not exist");
            return Ok(RelocationReport::default());
        }

        let plan = self.plan(dir, selected)?;
        let total = plan.len();
        info!(path = %dir.display(), total, "starting relocation batch");

        let mut report = RelocationReport::default();
        let mut failures: Vec<MoveFailure> = Vec::new();

        for (index, candidate) in plan.candidates.iter().enumerate() {
            progress.on_progress(index, total);

            match self.move_candidate(dir, candidate) {
                Ok(MoveOutcome::Moved(moved)) => report.moved.push(moved),
                Ok(MoveOutcome::Failed(failure)) => {
                    warn!(file = %failure.file_name, reason = %failure.reason, "could not move file");
                    failures.push(failure);
                }
                Err(source) => {
                    error!(file = %candidate.file_name, error = %source, "disk full, aborting batch");
                    return Err(SortError::DiskFull {
                        file: candidate.file_name.clone(),
                        moved: report.moved_count(),
                        source,
                    });
                }
            }
        }

        progress.on_progress(total, total);

        if failures.is_empty() {
            info!(moved = report.moved_count(), "relocation batch complete");
            Ok(report)
        } else {
            Err(SortError::MoveFailures {
                failures,
                moved: report.moved_count(),
            })
        }
    }

    /// Moves one candidate. `Err` is reserved for a full disk.
    fn move_candidate(&self, dir: &Path, candidate: &Candidate) -> Result<MoveOutcome, io::Error> {
        match self.try_move(dir, candidate) {
            Ok(moved) => Ok(MoveOutcome::Moved(moved)),
            Err(err) => match classify_failure(&err) {
                FailureClass::Fatal => Err(err),
                FailureClass::Deferred(reason) => Ok(MoveOutcome::Failed(MoveFailure {
                    file_name: candidate.file_name.clone(),
                    reason,
                })),
            },
        }
    }

    fn try_move(&self, dir: &Path, candidate: &Candidate) -> io::Result<MovedFile> {
        let target_folder = dir.join(&candidate.category);
        if !self.mover.is_dir(&target_folder) {
            // A symlink here could point outside `dir`.
            if self.mover.exists(&target_folder) {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!(
                        "{} exists and is not a directory",
                        target_folder.display()
                    ),
                ));
            }
            self.mover.create_dir_all(&target_folder)?;
            debug!(folder = %target_folder.display(), "created category folder");
        }

        let destination =
            resolve_collision(&target_folder, &candidate.os_name, |path| self.mover.exists(path));
        let renamed = destination.file_name() != Some(candidate.os_name.as_os_str());

        self.mover.move_file(&candidate.source, &destination)?;

        if renamed {
            info!(
                file = %candidate.file_name,
                destination = %destination.display(),
                "moved with new name to avoid collision"
            );
        } else {
            info!(file = %candidate.file_name, category = %candidate.category, "moved");
        }

        Ok(MovedFile {
            file_name: candidate.file_name.clone(),
            category: candidate.category.clone(),
            destination,
            renamed,
        })
    }
}
