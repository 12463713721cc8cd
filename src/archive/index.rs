use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use zip::ZipArchive;

use crate::error::PrepError;
use crate::types::ArchiveIndexEntry;

const NPY_MAGIC: [u8; 6] = [0x93, b'N', b'U', b'M', b'P', b'Y'];

/// Rebuilds the utterance index from a sealed archive.
///
/// Byte ranges come from the container's own member records rather than from
/// bookkeeping during the write, and every member's payload is read back from
/// its recorded range and checked against the npy magic, so a successful
/// index doubles as proof that each item is independently retrievable.
pub fn read_archive_index(path: &Path) -> Result<HashMap<String, ArchiveIndexEntry>, PrepError> {
    let file = File::open(path).map_err(|e| PrepError::io("opening feature archive", e))?;
    let mut zip = ZipArchive::new(BufReader::new(file))
        .map_err(|e| PrepError::archive_corruption("reading archive directory", e))?;

    let mut entries = HashMap::with_capacity(zip.len());
    for member_idx in 0..zip.len() {
        let member = zip
            .by_index(member_idx)
            .map_err(|e| PrepError::archive_corruption("reading archive member record", e))?;
        let utterance_id = Path::new(member.name())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| member.name().to_string());
        entries.insert(
            utterance_id,
            ArchiveIndexEntry {
                byte_offset: member.data_start(),
                byte_len: member.size(),
            },
        );
    }

    let mut raw = File::open(path).map_err(|e| PrepError::io("reopening feature archive", e))?;
    for (utterance_id, entry) in &entries {
        let payload = read_range(&mut raw, entry)?;
        if payload.len() < NPY_MAGIC.len() || payload[..NPY_MAGIC.len()] != NPY_MAGIC {
            return Err(PrepError::archive_corruption(
                "verifying archive member",
                format!("member '{utterance_id}' is not a serialized array"),
            ));
        }
    }
    Ok(entries)
}

/// Checks that every id packed into the archive survived into the rebuilt
/// index.
pub fn verify_packed_ids(
    index: &HashMap<String, ArchiveIndexEntry>,
    packed_ids: &[String],
) -> Result<(), PrepError> {
    for utterance_id in packed_ids {
        if !index.contains_key(utterance_id) {
            return Err(PrepError::archive_corruption(
                "verifying rebuilt index",
                format!("packed utterance '{utterance_id}' is absent from the index"),
            ));
        }
    }
    Ok(())
}

fn read_range(file: &mut File, entry: &ArchiveIndexEntry) -> Result<Vec<u8>, PrepError> {
    file.seek(SeekFrom::Start(entry.byte_offset))
        .map_err(|e| PrepError::io("seeking archive member", e))?;
    let mut payload = vec![0u8; entry.byte_len as usize];
    file.read_exact(&mut payload)
        .map_err(|e| PrepError::io("reading archive member", e))?;
    Ok(payload)
}
