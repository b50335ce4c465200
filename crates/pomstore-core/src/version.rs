//! Version-string helpers: snapshot detection and base-version collapsing.
//!
//! A unique snapshot is a deployed `-SNAPSHOT` build whose filename carries a
//! `yyyyMMdd.HHmmss-buildNumber` qualifier in place of the symbolic suffix,
//! e.g. `1.0-20090101.120000-1`. Its base version is `1.0-SNAPSHOT`.

use std::sync::LazyLock;

use regex::Regex;

pub const SNAPSHOT: &str = "SNAPSHOT";

static UNIQUE_SNAPSHOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)-([0-9]{8}\.[0-9]{6})-([0-9]+)$").unwrap());

/// True if `version` carries a timestamped snapshot qualifier.
pub fn is_unique_snapshot(version: &str) -> bool {
    UNIQUE_SNAPSHOT_RE.is_match(version)
}

/// True if `version` ends with the symbolic `SNAPSHOT` suffix.
pub fn is_generic_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT)
}

pub fn is_snapshot(version: &str) -> bool {
    is_generic_snapshot(version) || is_unique_snapshot(version)
}

/// Collapse a unique snapshot to its symbolic form. Any other version is
/// returned unchanged.
pub fn base_version(version: &str) -> String {
    match UNIQUE_SNAPSHOT_RE.captures(version) {
        Some(caps) => format!("{}-{SNAPSHOT}", &caps[1]),
        None => version.to_string(),
    }
}

/// `groupId:artifactId:version` key shared by the store and the resolution
/// cache.
pub fn version_key(group_id: &str, artifact_id: &str, version: &str) -> String {
    format!("{group_id}:{artifact_id}:{version}")
}
