use crate::error::{IoError, Result};
use larvasim_data::EnergeticState;
use rkyv::AlignedVec;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Leading bytes of every state snapshot.
const MAGIC: &[u8; 6] = b"LVSNAP";
/// Bumped whenever the archived layout of [`EnergeticState`] changes.
const VERSION: u16 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Snapshots an organism's energetic state as a versioned, validated rkyv archive.
///
/// The archive is written next to `path` first and renamed into place, so a
/// crash never leaves a half-written snapshot behind.
pub fn save_state<P: AsRef<Path>>(state: &EnergeticState, path: P) -> Result<()> {
    let path = path.as_ref();
    let payload = rkyv::to_bytes::<_, 256>(state)
        .map_err(|e| IoError::rkyv(format!("serialization: {e:?}")))?;

    let tmp = path.with_extension("partial");
    let mut file = File::create(&tmp)?;
    file.write_all(MAGIC)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(&payload)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;

    tracing::debug!(
        path = %path.display(),
        stage = %state.stage,
        bytes = HEADER_LEN + payload.len(),
        "Saved state snapshot"
    );
    Ok(())
}

/// Reads a snapshot written by [`save_state`], rejecting foreign, outdated or
/// corrupted files.
pub fn load_state<P: AsRef<Path>>(path: P) -> Result<EnergeticState> {
    let path = path.as_ref();
    read_state(path).map_err(|e| e.with_context(format!("loading state from {}", path.display())))
}

fn read_state(path: &Path) -> Result<EnergeticState> {
    let bytes = fs::read(path)?;
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(IoError::rkyv("not a state snapshot"));
    }
    let version = u16::from_le_bytes([bytes[MAGIC.len()], bytes[MAGIC.len() + 1]]);
    if version != VERSION {
        return Err(IoError::rkyv(format!(
            "snapshot version {version}, expected {VERSION}"
        )));
    }

    // The archive root must sit on an aligned buffer.
    let mut payload = AlignedVec::with_capacity(bytes.len() - HEADER_LEN);
    payload.extend_from_slice(&bytes[HEADER_LEN..]);
    rkyv::from_bytes::<EnergeticState>(&payload)
        .map_err(|e| IoError::rkyv(format!("validation: {e:?}")))
}
