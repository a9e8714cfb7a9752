//! Archive normalization.
//!
//! Every submission reaches the lifecycle manager as a gzip-compressed tar
//! archive. Directories get packed into a fresh temporary archive, files
//! that already look like gzip data pass through untouched, and anything
//! else (the extra-payload case) is wrapped into a single-entry archive.
//! New archives are created with unique names inside the caller's scratch
//! directory, so same-named submissions (or a submission named like the
//! extra payload) never write to the same path. Whoever receives a
//! `NormalizedArchive` with `is_temporary` set owns its deletion.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::PackagingError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A submission (or extra payload) reduced to a single gzipped tarball.
#[derive(Debug, Clone)]
pub struct NormalizedArchive {
    pub path: PathBuf,
    /// True when the file was created by this run and must be deleted by
    /// the batch orchestrator once the batch is done.
    pub is_temporary: bool,
}

/// Normalize `source` into a gzipped tar archive.
///
/// `name_override` names the archive entry root for directories; when absent
/// the source's display name is used. New archives land in `scratch` under a
/// uniquely suffixed file name.
pub fn normalize(
    source: &Path,
    name_override: Option<&str>,
    scratch: &Path,
) -> Result<NormalizedArchive, PackagingError> {
    let wrap = |source_path: &Path, e: std::io::Error| PackagingError {
        path: source_path.to_path_buf(),
        source: e,
    };

    let metadata = std::fs::metadata(source).map_err(|e| wrap(source, e))?;

    let name = match name_override {
        Some(n) => n.to_string(),
        None => crate::identity::display_name(source),
    };

    if metadata.is_dir() {
        let (file, out) = create_archive_file(scratch, &name).map_err(|e| wrap(source, e))?;
        pack_directory(source, &name, file).map_err(|e| wrap(source, e))?;
        return Ok(NormalizedArchive {
            path: out,
            is_temporary: true,
        });
    }

    if is_gzip(source).map_err(|e| wrap(source, e))? {
        return Ok(NormalizedArchive {
            path: source.to_path_buf(),
            is_temporary: false,
        });
    }

    let (file, out) = create_archive_file(scratch, &name).map_err(|e| wrap(source, e))?;
    pack_file(source, file).map_err(|e| wrap(source, e))?;
    Ok(NormalizedArchive {
        path: out,
        is_temporary: true,
    })
}

/// Sniff the gzip magic bytes. Extension is ignored; students name their
/// tarballs all sorts of things.
fn is_gzip(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == GZIP_MAGIC),
        // Shorter than two bytes, cannot be gzip
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Open a uniquely named `<name>-XXXX.tar.gz` in the scratch directory.
/// The file is kept on disk; the cleanup set owns its deletion.
fn create_archive_file(scratch: &Path, name: &str) -> std::io::Result<(File, PathBuf)> {
    let (file, path) = tempfile::Builder::new()
        .prefix(&format!("{}-", name))
        .suffix(".tar.gz")
        .tempfile_in(scratch)?
        .keep()
        .map_err(|e| e.error)?;
    Ok((file, path))
}

/// Pack a directory's contents under `root/` inside the tar.gz, so they
/// extract into `<dest>/<root>/...` in the container.
fn pack_directory(source: &Path, root: &str, out: File) -> std::io::Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(root, source)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}

/// Wrap a single non-archive file into the tar.gz under its own basename.
fn pack_file(source: &Path, out: File) -> std::io::Result<()> {
    let entry_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extra".to_string());

    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_path_with_name(source, entry_name)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}
