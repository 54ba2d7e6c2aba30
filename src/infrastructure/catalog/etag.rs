//! ETag 计算
//!
//! 校验器由文件元数据（相对路径 + mtime + size）推导，不读取文件内容。
//! 同一棵树两次扫描之间内容未变时，校验器保持字节级一致。

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// 单个文件的变更签名：`rel_path:mtime_ns:size`
pub fn file_signature(rel_path: &str, metadata: &Metadata) -> String {
    let mtime_ns = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{}:{}:{}", rel_path, mtime_ns, metadata.len())
}

/// 由一组签名计算弱 ETag：`W/"<md5hex>"`
///
/// 调用方负责保证签名顺序稳定（排序后传入）
pub fn weak_etag(signatures: &[String]) -> String {
    let joined = signatures.join("\n");
    let digest = md5::compute(joined.as_bytes());
    format!("W/\"{:x}\"", digest)
}
