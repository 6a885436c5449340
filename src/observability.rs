use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use uuid::Uuid;

use crate::dataset::DatasetStatus;

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub dataset: DatasetStats,
}

impl RunMetadata {
    pub fn new(run_id: Uuid, dataset: DatasetStats) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            dataset,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub path: String,
    pub hash: String, // SHA256 hex
    pub size_bytes: u64,
    pub row_count: usize,
    pub seed: Option<u64>,
    pub generated: bool,
}

impl DatasetStats {
    pub fn collect<P: AsRef<Path>>(
        path: P,
        row_count: usize,
        seed: Option<u64>,
        status: DatasetStatus,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            path: path.display().to_string(),
            hash: compute_file_hash(path)?,
            size_bytes: std::fs::metadata(path)?.len(),
            row_count,
            seed,
            generated: status == DatasetStatus::Generated,
        })
    }
}

pub fn compute_file_hash<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192]; // 8KB buffer

    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
