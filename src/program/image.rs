//! Program images and machine snapshots.
//!
//! A program image is a raw binary file: byte `i` of the file is loaded into
//! memory cell `i`. A snapshot is the whole machine (registers, counters,
//! fault state and memory) serialized as JSON.

use crate::cpu::Cpu;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Read a raw program image from disk.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), size = bytes.len(), "read program image");
    Ok(bytes)
}

/// Serialize the machine to a JSON string.
pub fn snapshot_to_string(cpu: &Cpu) -> Result<String, ImageError> {
    Ok(serde_json::to_string_pretty(cpu)?)
}

/// Restore a machine from a JSON string.
///
/// The micro-state cursor is taken as-is; an illegal value faults on the
/// next clock cycle.
pub fn snapshot_from_str(json: &str) -> Result<Cpu, ImageError> {
    Ok(serde_json::from_str(json)?)
}

/// Save the machine state to disk.
pub fn save_snapshot<P: AsRef<Path>>(path: P, cpu: &Cpu) -> Result<(), ImageError> {
    let path = path.as_ref();
    let json = snapshot_to_string(cpu)?;
    std::fs::write(path, json).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "saved snapshot");
    Ok(())
}

/// Load a machine state from disk.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Cpu, ImageError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cpu = snapshot_from_str(&json)?;
    tracing::info!(path = %path.display(), pc = cpu.regs.pc, "loaded snapshot");
    Ok(cpu)
}

/// Errors that can occur while reading images or snapshots.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{CpuError, Phase};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("subleq-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_read_image() {
        let path = temp_path("image.bin");
        std::fs::write(&path, [3u8, 3, 6, 253]).unwrap();

        let bytes = read_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bytes, vec![3, 3, 6, 253]);
    }

    #[test]
    fn test_read_missing_image() {
        let err = read_image(temp_path("does-not-exist.bin")).unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
    }

    #[test]
    fn test_snapshot_preserves_mid_instruction_state() {
        let mut cpu = Cpu::new();
        cpu.load_image(&[3, 3, 6, 253]);
        for _ in 0..5 {
            cpu.step_clock_cycle().unwrap();
        }

        let path = temp_path("snapshot.json");
        save_snapshot(&path, &cpu).unwrap();
        let mut restored = load_snapshot(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(restored.regs, cpu.regs);
        assert_eq!(restored.clock_count, 5);
        assert_eq!(restored.mem.as_slice(), cpu.mem.as_slice());

        assert_eq!(restored.step_instruction(), Ok(7));
        assert_eq!(restored.regs.pc, 6);
    }

    #[test]
    fn test_corrupt_phase_faults_after_restore() {
        let cpu = Cpu::new();
        let json = snapshot_to_string(&cpu)
            .unwrap()
            .replace("\"phase\": 0", "\"phase\": 42");

        let mut restored = snapshot_from_str(&json).unwrap();

        assert_eq!(restored.step_clock_cycle(), Err(CpuError::InvalidPhase(42)));
        assert!(restored.is_faulted());
        assert_ne!(restored.regs.phase(), Ok(Phase::INITIAL));
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(matches!(
            snapshot_from_str("{not json"),
            Err(ImageError::Snapshot(_))
        ));
    }
}
