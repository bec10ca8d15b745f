use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_QUALIFIER: &str = "org";
pub const APP_ORG: &str = "opendataensemble";
pub const APP_NAME: &str = "formulus";

pub const SESSION_FILE: &str = "session.json";

pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn session_file() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(SESSION_FILE))
}
