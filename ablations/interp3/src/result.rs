//! 实验结果.

use crate::algos::Profile;
use std::io::{self, Write};

/// 缺失值显示为 `/`.
#[inline]
fn or_slash<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "/".to_string(), |v| v.to_string())
}

/// 将一个算法的统计结果写成表格的一行.
fn row_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    let avg_us = p.get_avg_target_time_us().map(|t| format!("{t:.1}"));
    let avg_err = p.get_avg_area_error().map(|e| format!("{:.3}%", e * 100.0));
    let most_us = p.get_most_time_consuming().map(|d| d.as_micros());
    let avg_shift = p.get_avg_centroid_error().map(|e| format!("{e:.3}"));
    writeln!(
        w,
        "{name:<16}{:>8}{:>8}{:>12}{:>12}{:>12}{:>10.3}%{:>12}{:>12}",
        p.get_target(),
        p.get_failed(),
        or_slash(avg_us),
        or_slash(most_us),
        or_slash(avg_err),
        p.get_worst_area_error() * 100.0,
        or_slash(avg_shift),
        p.get_real_time_us(),
    )
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 以表格形式输出运行结果.
    pub fn analyze(&self) {
        let stdout = io::stdout();
        let mut w = stdout.lock();
        utils::sep_to(&mut w);
        writeln!(
            w,
            "{:<16}{:>8}{:>8}{:>12}{:>12}{:>12}{:>11}{:>12}{:>12}",
            "algorithm",
            "slices",
            "failed",
            "avg us",
            "max us",
            "avg err",
            "max err",
            "shift mm",
            "total us"
        )
        .unwrap();
        utils::sep_to(&mut w);
        for (key, profile) in self.data.iter() {
            row_into(key, profile, &mut w).unwrap();
        }
        utils::sep_to(&mut w);
    }
}
