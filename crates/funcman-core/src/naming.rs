//! Module file names and config-path naming conventions.

use crate::state::BindError;

/// Platform shared-module suffix appended to configured library names.
#[cfg(windows)]
pub const MODULE_SUFFIX: &str = ".dll";
#[cfg(not(windows))]
pub const MODULE_SUFFIX: &str = ".so";

/// Maximum composed module file name length in bytes.
pub const MAX_MODULE_FILE_NAME: usize = 255;

/// Suffix of the per-library override table file (`<basename>_extdef.txt`).
pub const CONFIG_FILE_SUFFIX: &str = "_extdef.txt";

/// Compose `library_name + suffix`, failing if it would exceed `max` bytes.
pub fn compose_module_file_name(
    library_name: &str,
    suffix: &str,
    max: usize,
) -> Result<String, BindError> {
    let len = library_name.len() + suffix.len();
    if len > max {
        return Err(BindError::NameTooLong);
    }
    let mut file_name = String::with_capacity(len);
    file_name.push_str(library_name);
    file_name.push_str(suffix);
    Ok(file_name)
}

/// Compose the platform module file name for an extension-less library name.
pub fn module_file_name(library_name: &str) -> Result<String, BindError> {
    compose_module_file_name(library_name, MODULE_SUFFIX, MAX_MODULE_FILE_NAME)
}

/// File-name component of a path (either separator style).
#[must_use]
pub fn file_name_part(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Strip a shared-module extension: `.so.N...`, `.so`, `.dylib`, or the last
/// `.ext` when the dot is not the first character.
#[must_use]
pub fn strip_module_extension(file_name: &str) -> &str {
    if let Some(idx) = file_name.find(".so.") {
        return &file_name[..idx];
    }
    if let Some(stem) = file_name.strip_suffix(".so") {
        return stem;
    }
    if let Some(stem) = file_name.strip_suffix(".dylib") {
        return stem;
    }
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// Basename of a loaded library path, e.g. `/usr/lib/libbase.so.1` -> `libbase`.
///
/// Returns `None` when the path has no file-name component.
#[must_use]
pub fn library_basename(path: &str) -> Option<&str> {
    let file_name = file_name_part(path);
    if file_name.is_empty() {
        return None;
    }
    let stem = strip_module_extension(file_name);
    if stem.is_empty() { None } else { Some(stem) }
}

/// `<basename>_extdef.txt`.
#[must_use]
pub fn config_file_name(basename: &str) -> String {
    format!("{basename}{CONFIG_FILE_SUFFIX}")
}
