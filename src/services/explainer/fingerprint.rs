//! 内容指纹
//!
//! 根据（文件路径, 文件内容, 详细程度）计算稳定的 SHA-256 指纹，作为缓存键。

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::types::DetailLevel;

/// 指纹字节长度
pub const FINGERPRINT_LEN: usize = 32;

/// 内容指纹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// 计算指纹
    ///
    /// 每个字段先写入 8 字节小端长度再写入内容，
    /// 保证 ("ab", "c") 与 ("a", "bc") 不会得到相同的指纹。
    pub fn compute(file_path: &str, content: &str, level: DetailLevel) -> Self {
        let mut hasher = Sha256::new();
        for field in [file_path, content, level.as_str()] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// 小写十六进制表示（缓存文件名）
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 指纹解析错误
#[derive(Debug, thiserror::Error)]
pub enum FingerprintParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {} bytes, got {0}", FINGERPRINT_LEN)]
    InvalidLength(usize),
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let array: [u8; FINGERPRINT_LEN] = bytes
            .try_into()
            .map_err(|_| FingerprintParseError::InvalidLength(len))?;
        Ok(Self(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "function add(a,b){return a+b}";

    #[test]
    fn test_deterministic() {
        let a = Fingerprint::compute("src/add.js", SAMPLE, DetailLevel::Beginner);
        let b = Fingerprint::compute("src/add.js", SAMPLE, DetailLevel::Beginner);
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[test]
    fn test_each_input_changes_fingerprint() {
        let base = Fingerprint::compute("src/add.js", SAMPLE, DetailLevel::Beginner);

        assert_ne!(base, Fingerprint::compute("src/sum.js", SAMPLE, DetailLevel::Beginner));
        assert_ne!(
            base,
            Fingerprint::compute("src/add.js", "function add(a,b){return a-b}", DetailLevel::Beginner)
        );
        assert_ne!(base, Fingerprint::compute("src/add.js", SAMPLE, DetailLevel::Advanced));
    }

    #[test]
    fn test_field_boundaries_do_not_collide() {
        let a = Fingerprint::compute("ab", "c", DetailLevel::Intermediate);
        let b = Fingerprint::compute("a", "bc", DetailLevel::Intermediate);
        assert_ne!(a, b);

        let c = Fingerprint::compute("", "abc", DetailLevel::Intermediate);
        let d = Fingerprint::compute("abc", "", DetailLevel::Intermediate);
        assert_ne!(c, d);
    }

    #[test]
    fn test_hex_round_trip() {
        let fp = Fingerprint::compute("main.rs", "fn main() {}", DetailLevel::Advanced);
        let parsed: Fingerprint = fp.to_hex().parse().unwrap();
        assert_eq!(parsed, fp);

        assert!("zz".parse::<Fingerprint>().is_err());
        assert!(matches!(
            "abcd".parse::<Fingerprint>(),
            Err(FingerprintParseError::InvalidLength(2))
        ));
    }
}
