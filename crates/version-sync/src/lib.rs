//! Pre-build generators that copy the authoritative app version into a
//! generated `src/version.ts` module.
//!
//! Two entry points share this library:
//! - `sync-version-from-parent` copies the Formulus app's generated version
//!   into the formplayer tree.
//! - `sync-version-to-package` reads the Android `versionName`, cross-checks the
//!   iOS `MARKETING_VERSION` and writes the Formulus `src/version.ts`.

pub mod error;
pub mod output;
pub mod pattern;
pub mod sync;

pub use error::SyncError;
pub use sync::{sync_from_native, sync_from_parent, NativeLayout, NativeSyncReport, ParentLayout};
