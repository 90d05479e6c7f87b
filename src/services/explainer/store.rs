//! 讲解结果缓存
//!
//! 指纹 → 文档 的持久化映射，每个条目一个 JSON 文件。
//! 所有错误都在本模块内消化：读取失败视为未命中，写入失败只记录日志。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::fingerprint::Fingerprint;
use super::types::Documentation;

/// 缓存条目扩展名
const ENTRY_EXTENSION: &str = "json";
/// 临时文件扩展名
const TEMP_EXTENSION: &str = "tmp";

/// 缓存内部错误（不会传播到模块外）
#[derive(Debug, thiserror::Error)]
enum StoreError {
    #[error("IO error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// 讲解结果缓存
pub struct ResultStore {
    /// 缓存根目录
    root: PathBuf,
}

impl ResultStore {
    /// 创建缓存（不会立即创建目录）
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 默认缓存根目录：用户缓存目录下的 explainer-rs/docs
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join("explainer-rs").join("docs"))
            .unwrap_or_else(|| PathBuf::from(".explainer-cache"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, fp: &Fingerprint) -> PathBuf {
        self.root.join(format!("{}.{}", fp.to_hex(), ENTRY_EXTENSION))
    }

    /// 检查条目是否存在（不做反序列化）
    pub fn exists(&self, fp: &Fingerprint) -> bool {
        self.entry_path(fp).is_file()
    }

    /// 读取条目，任何错误都视为未命中
    pub fn load(&self, fp: &Fingerprint) -> Option<Documentation> {
        let path = self.entry_path(fp);
        match Self::read_entry(&path) {
            Ok(Some(doc)) => {
                debug!("Cache hit: {}", fp);
                Some(doc)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable cache entry: {}", e);
                None
            }
        }
    }

    fn read_entry(path: &Path) -> Result<Option<Documentation>, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(path.to_path_buf(), e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Parse(path.to_path_buf(), e))
    }

    /// 写入条目，失败时返回 false 并记录日志
    ///
    /// 先写临时文件再 rename，读取方不会看到写了一半的条目。
    pub fn save(&self, fp: &Fingerprint, doc: &Documentation) -> bool {
        match self.write_entry(fp, doc) {
            Ok(()) => {
                debug!("Cache entry saved: {}", fp);
                true
            }
            Err(e) => {
                warn!("Failed to write cache entry {}: {}", fp, e);
                false
            }
        }
    }

    fn write_entry(&self, fp: &Fingerprint, doc: &Documentation) -> Result<(), StoreError> {
        self.ensure_root()?;

        let content = serde_json::to_string_pretty(doc).map_err(StoreError::Serialize)?;
        let target = self.entry_path(fp);
        let temp = self.root.join(format!(
            ".{}.{}.{}",
            fp.to_hex(),
            uuid::Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));

        if let Err(e) = fs::write(&temp, content) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io(temp, e));
        }

        if let Err(e) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io(target, e));
        }

        Ok(())
    }

    /// 每次写入前都确保根目录存在（运行期间目录可能被外部删除）
    fn ensure_root(&self) -> Result<(), StoreError> {
        if self.root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root).map_err(|e| StoreError::Io(self.root.clone(), e))?;
        info!("Cache directory ready: {}", self.root.display());
        Ok(())
    }

    /// 统计缓存条目数量
    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    /// 清空缓存，返回删除的条目数量
    pub fn clear(&self) -> usize {
        let Ok(read_dir) = fs::read_dir(&self.root) else {
            return 0;
        };

        let mut removed = 0;
        for entry in read_dir.flatten() {
            let path = entry.path();
            let is_entry = Self::is_entry_file(&path);
            let is_temp = path.extension().and_then(|e| e.to_str()) == Some(TEMP_EXTENSION);
            if !is_entry && !is_temp {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) if is_entry => removed += 1,
                Ok(()) => {}
                Err(e) => warn!("Failed to remove cache file {}: {}", path.display(), e),
            }
        }

        info!("Cache cleared: {} entries removed", removed);
        removed
    }

    /// 列出所有条目对应的指纹
    pub fn entries(&self) -> Vec<Fingerprint> {
        let Ok(read_dir) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| Self::is_entry_file(path))
            .filter_map(|path| path.file_stem()?.to_str()?.parse().ok())
            .collect()
    }

    fn is_entry_file(path: &Path) -> bool {
        path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
    }
}
