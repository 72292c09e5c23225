use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("name is empty")]
    Empty,
    #[error("name {0:?} is not a plain file name")]
    UnsupportedComponent(String),
}

/// Lowercases `title` and replaces every char outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_dir_name(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Local directory for a remote folder title, under `base`.
pub fn folder_dir_for(base: &Path, title: &str) -> Result<PathBuf, PathError> {
    let name = sanitize_dir_name(title);
    Ok(base.join(single_component(&name)?))
}

/// `<dir>/<slug>.json`; the slug comes from the server and must stay inside `dir`.
pub fn dashboard_path(dir: &Path, slug: &str) -> Result<PathBuf, PathError> {
    let name = single_component(slug)?;
    Ok(dir.join(format!("{name}.json")))
}

fn single_component(name: &str) -> Result<&str, PathError> {
    if name.is_empty() {
        return Err(PathError::Empty);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(name),
        _ => Err(PathError::UnsupportedComponent(name.to_string())),
    }
}
