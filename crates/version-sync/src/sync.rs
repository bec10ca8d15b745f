use crate::error::SyncError;
use crate::output::{read_source, render_version_module, write_atomic};
use crate::pattern::{extract_app_version, extract_marketing_version, extract_version_name};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PARENT_BANNER_SOURCE: &str = "formulus/src/version.ts";
const NATIVE_BANNER_SOURCE: &str = "android/app/build.gradle versionName";

/// File locations for the formplayer generator, relative to the formplayer root.
#[derive(Debug, Clone)]
pub struct ParentLayout {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl ParentLayout {
    pub fn under(root: &Path) -> Self {
        Self {
            source: root
                .join("..")
                .join("formulus")
                .join("src")
                .join("version.ts"),
            output: root.join("src").join("version.ts"),
        }
    }
}

/// File locations for the Formulus generator, relative to the app root.
#[derive(Debug, Clone)]
pub struct NativeLayout {
    pub gradle: PathBuf,
    pub pbxproj: PathBuf,
    pub output: PathBuf,
}

impl NativeLayout {
    pub fn under(root: &Path) -> Self {
        Self {
            gradle: root.join("android").join("app").join("build.gradle"),
            pbxproj: root
                .join("ios")
                .join("Formulus.xcodeproj")
                .join("project.pbxproj"),
            output: root.join("src").join("version.ts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSyncReport {
    pub version: String,
    pub ios_version: Option<String>,
}

impl NativeSyncReport {
    pub fn mismatch(&self) -> bool {
        matches!(&self.ios_version, Some(ios) if *ios != self.version)
    }
}

/// Copy `APP_VERSION` from the parent app's generated module. Returns the version written.
pub fn sync_from_parent(layout: &ParentLayout) -> Result<String, SyncError> {
    let content = read_source(&layout.source)?;
    let version = extract_app_version(&content).ok_or(SyncError::NotFound {
        what: "APP_VERSION",
        origin: PARENT_BANNER_SOURCE,
    })?;
    write_atomic(
        &layout.output,
        &render_version_module(version, PARENT_BANNER_SOURCE),
    )?;
    Ok(version.to_string())
}

/// Generate `src/version.ts` from Android `versionName`, warning when iOS disagrees.
pub fn sync_from_native(layout: &NativeLayout) -> Result<NativeSyncReport, SyncError> {
    let gradle = read_source(&layout.gradle)?;
    let version = extract_version_name(&gradle)
        .ok_or(SyncError::NotFound {
            what: "versionName",
            origin: "android/app/build.gradle",
        })?
        .to_string();
    let report = NativeSyncReport {
        ios_version: ios_marketing_version(&layout.pbxproj)?,
        version,
    };

    if let Some(ios) = report.ios_version.as_deref().filter(|_| report.mismatch()) {
        warn!(
            "iOS MARKETING_VERSION ({}) differs from Android versionName ({}). Align them to avoid mismatches.",
            ios, report.version
        );
    }

    write_atomic(
        &layout.output,
        &render_version_module(&report.version, NATIVE_BANNER_SOURCE),
    )?;
    Ok(report)
}

fn ios_marketing_version(path: &Path) -> Result<Option<String>, SyncError> {
    if !path.exists() {
        debug!(path = %path.display(), "no iOS project file; skipping cross-check");
        return Ok(None);
    }
    let content = read_source(path)?;
    Ok(extract_marketing_version(&content).map(str::to_string))
}
