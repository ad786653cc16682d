//! 聚合记录存储 (Record Store)
//!
//! 只追加: 每次写库产生一条 (跌倒数, 正常数, 时间戳)。

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// 聚合记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub fall_count: u64,
    pub normal_count: u64,
    pub timestamp: DateTime<Local>,
}

/// 记录存储接口
pub trait RecordStore: Send {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), StoreError>;

    /// 最新的记录在前, 最多 `limit` 条
    fn recent(&self, limit: usize) -> Result<Vec<AggregateRecord>, StoreError>;
}

// ========== JSON Lines 文件存储 ==========

/// 每行一条 JSON 记录
#[derive(Debug, Clone)]
pub struct JsonlRecordStore {
    path: PathBuf,
}

impl JsonlRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部记录 (按写入顺序), 损坏的行跳过
    pub fn load_all(&self) -> Result<Vec<AggregateRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AggregateRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("⚠️  记录文件第 {} 行损坏, 已跳过: {}", index + 1, e),
            }
        }
        Ok(records)
    }
}

impl RecordStore for JsonlRecordStore {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AggregateRecord>, StoreError> {
        let mut records = self.load_all()?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}

// ========== 内存存储 ==========

/// 内存存储, Clone 后共享同一份数据; 可切换为不可用以模拟数据库故障
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<Vec<AggregateRecord>>>,
    available: Arc<Mutex<bool>>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(Mutex::new(true)),
        }
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        if let Ok(mut flag) = self.available.lock() {
            *flag = available;
        }
    }

    pub fn records(&self) -> Vec<AggregateRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn is_available(&self) -> bool {
        self.available.lock().map(|f| *f).unwrap_or(false)
    }
}

impl RecordStore for MemoryRecordStore {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), StoreError> {
        if !self.is_available() {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        records.push(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AggregateRecord>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
