use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::utils::create_folder;

pub mod minimal;
pub mod multipass;
pub mod raymarch;

/// Writes `content` to `path` unless the file is already there, so a user can
/// start editing from the built-in shader.
pub fn create_default_shader<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_folder(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shader_is_written_once() {
        let dir = std::env::temp_dir().join(format!("shadetoy-default-{}", std::process::id()));
        let path = dir.join("scene.frag");
        let _ = std::fs::remove_dir_all(&dir);

        assert!(create_default_shader(&path, minimal::FRAGMENT_SHADER).unwrap());
        std::fs::write(&path, "edited").unwrap();
        assert!(!create_default_shader(&path, minimal::FRAGMENT_SHADER).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "edited");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
