//! 条件请求与 Range 解析
//!
//! Range 只支持单区间 `bytes=` 形式；多区间与畸形头按整文件响应处理。
//! ETag 比较采用弱比较（忽略 `W/` 前缀）。

/// Range 头解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// 无 Range 或可忽略的 Range，返回整个文件
    Full,
    /// 闭区间 [start, end]
    Satisfiable(u64, u64),
    /// 区间超出文件大小，416
    Unsatisfiable,
}

/// 解析 Range 头
pub fn parse_range(header: &str, size: u64) -> RangeOutcome {
    let spec = match header.strip_prefix("bytes=") {
        Some(spec) => spec.trim(),
        None => return RangeOutcome::Full,
    };
    // 多区间不支持，按整文件处理
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let (start_raw, end_raw) = match spec.split_once('-') {
        Some(parts) => parts,
        None => return RangeOutcome::Full,
    };

    if start_raw.is_empty() {
        // 后缀区间 bytes=-N：最后 N 字节
        let suffix: u64 = match end_raw.parse() {
            Ok(n) => n,
            Err(_) => return RangeOutcome::Full,
        };
        if suffix == 0 || size == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        let start = size.saturating_sub(suffix);
        return RangeOutcome::Satisfiable(start, size - 1);
    }

    let start: u64 = match start_raw.parse() {
        Ok(n) => n,
        Err(_) => return RangeOutcome::Full,
    };
    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }

    let end = if end_raw.is_empty() {
        size - 1
    } else {
        match end_raw.parse::<u64>() {
            // 终点越界时截断到文件尾
            Ok(n) => n.min(size - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };
    if start > end {
        return RangeOutcome::Unsatisfiable;
    }
    RangeOutcome::Satisfiable(start, end)
}

/// If-None-Match 是否命中（弱比较）
pub fn if_none_match_matches(header: &str, etag: &str) -> bool {
    let normalize = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
    let target = normalize(etag);
    header.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize(candidate) == target
    })
}

/// If-Range 是否允许按区间响应（不匹配时退回整文件）
pub fn if_range_matches(header: &str, etag: &str) -> bool {
    if_none_match_matches(header, etag)
}
