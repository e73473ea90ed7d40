//! Local keyword extraction from a leaf name
//!
//! Deterministic and offline: the name itself, its path segments, the
//! segments with generic administrative suffixes removed, and every 2 to 4
//! character window over runs of CJK ideographs.

use crate::core::types::{char_len, last_segment, PATH_SEPARATOR};
use indexmap::IndexSet;
use rayon::prelude::*;

/// Generic suffixes that carry no navigational meaning on their own
const GENERIC_SUFFIXES: [&str; 20] = [
    "管理",
    "配置",
    "分析",
    "统计",
    "记录",
    "查询",
    "大屏",
    "中心",
    "系统",
    "设置",
    "management",
    "configuration",
    "analysis",
    "statistics",
    "record",
    "query",
    "dashboard",
    "center",
    "system",
    "settings",
];

const MIN_KEYWORD_LEN: usize = 2;
const IDEOGRAPH_WINDOWS: [usize; 3] = [2, 3, 4];

fn is_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// `part` without `suffix` (ASCII case-insensitive), if it ends with it
fn strip_suffix_ignore_case<'a>(part: &'a str, suffix: &str) -> Option<&'a str> {
    let split = part.len().checked_sub(suffix.len())?;
    let tail = part.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        part.get(..split)
    } else {
        None
    }
}

fn ideograph_runs(part: &str) -> Vec<Vec<char>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for c in part.chars() {
        if is_ideograph(c) {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Keywords derived from a single leaf name, order-preserving and de-duplicated
pub fn extract_local(name: &str) -> Vec<String> {
    let mut keywords: IndexSet<String> = IndexSet::new();
    let mut push = |keyword: &str| {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            keywords.insert(keyword.to_string());
        }
    };

    push(name);

    let mut parts = vec![name];
    if name.contains(PATH_SEPARATOR) {
        let segments: Vec<&str> = name
            .split(PATH_SEPARATOR)
            .filter(|segment| !segment.trim().is_empty())
            .collect();
        for segment in &segments {
            push(segment);
        }
        push(last_segment(name));
        parts.extend(segments);
    }

    for part in parts {
        for suffix in GENERIC_SUFFIXES {
            if let Some(stem) = strip_suffix_ignore_case(part, suffix) {
                let stem = stem.trim();
                if char_len(stem) >= MIN_KEYWORD_LEN {
                    push(stem);
                }
            }
        }

        for run in ideograph_runs(part) {
            for width in IDEOGRAPH_WINDOWS {
                for window in run.windows(width) {
                    push(&window.iter().collect::<String>());
                }
            }
        }
    }

    if keywords.is_empty() {
        return vec![name.to_string()];
    }
    keywords.into_iter().collect()
}

/// Local extraction for a whole catalog
pub fn extract_all(names: &[String]) -> Vec<(String, Vec<String>)> {
    names
        .par_iter()
        .map(|name| (name.clone(), extract_local(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_english_name() {
        assert_eq!(extract_local("Inspection Records"), vec!["Inspection Records"]);
    }

    #[test]
    fn test_english_suffix_is_case_insensitive() {
        let keywords = extract_local("Menu Management");
        assert_eq!(keywords, vec!["Menu Management", "Menu"]);

        let keywords = extract_local("Device SETTINGS");
        assert!(keywords.contains(&"Device".to_string()));
    }

    #[test]
    fn test_chinese_suffix_and_windows() {
        let keywords = extract_local("档口管理");
        assert_eq!(keywords[0], "档口管理");
        assert!(keywords.contains(&"档口".to_string()));
        assert!(keywords.contains(&"口管".to_string()));
        assert!(keywords.contains(&"档口管".to_string()));
        assert!(!keywords.iter().any(|k| char_len(k) == 1));
    }

    #[test]
    fn test_composite_path_segments() {
        let keywords = extract_local("Canteen-Dishes-Stalls");
        assert_eq!(
            keywords,
            vec!["Canteen-Dishes-Stalls", "Canteen", "Dishes", "Stalls"]
        );
    }

    #[test]
    fn test_short_stem_is_dropped() {
        // "X" is below the two-character minimum
        assert_eq!(extract_local("X system"), vec!["X system"]);
    }

    #[test]
    fn test_mixed_script_runs() {
        let keywords = extract_local("AI巡检记录");
        assert!(keywords.contains(&"AI巡检".to_string()));
        assert!(keywords.contains(&"巡检".to_string()));
        assert!(keywords.contains(&"巡检记录".to_string()));
        assert!(!keywords.iter().any(|k| k.contains("AI巡检记")));
    }

    #[test]
    fn test_no_duplicates() {
        let keywords = extract_local("记录-记录");
        let unique: IndexSet<_> = keywords.iter().collect();
        assert_eq!(unique.len(), keywords.len());
    }

    #[test]
    fn test_extract_all_preserves_order() {
        let names = vec!["B".to_string(), "A".to_string()];
        let all = extract_all(&names);
        assert_eq!(all[0].0, "B");
        assert_eq!(all[1].0, "A");
    }
}
