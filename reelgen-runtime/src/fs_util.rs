use std::fs;
use std::io;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Replaces `dst` with `tmp`, keeping a `.bak` of the previous file until the
/// swap lands. Handles Windows, where `rename` fails if the destination exists.
pub fn replace_file(tmp: &Path, dst: &Path) -> io::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        // Try to restore the previous file if we had one.
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(e);
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}
