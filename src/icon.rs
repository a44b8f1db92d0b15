//! Package icon
//!
//! `<App>.png` is the user's icon when one was given. Otherwise an icon is
//! drawn with ImageMagick (two initials on a random colour), then
//! synthesized directly as a solid PNG, and as a last resort a placeholder
//! file is written so the AppDir stays complete. No step is fatal.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::logging::{log_action, log_info, log_warning};
use crate::tools::find_in_path;

pub const ICON_SIZE: u32 = 256;

const PLACEHOLDER: &[u8] = b"dummy icon";

// ImageMagick 6 ships `convert`; 7 wants `magick convert`
const CONVERT_ARGS: &[&str] = &[];
const MAGICK_ARGS: &[&str] = &["convert"];

/// How the icon ended up in the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource {
    UserFile,
    ImageMagick,
    Synthesized,
    Placeholder,
    /// Nothing could be written
    Missing,
}

/// Produce `<app_dir>/<app_name>.png`.
pub fn create_icon(app_dir: &Path, app_name: &str, user_icon: Option<&Path>) -> IconSource {
    let icon_path = app_dir.join(format!("{}.png", app_name));

    if let Some(src) = user_icon {
        match fs::copy(src, &icon_path) {
            Ok(_) => {
                log_info(&format!("Using custom icon: {}", src.display()));
                return IconSource::UserFile;
            }
            Err(e) => log_warning(&format!("Could not copy icon {}: {}", src.display(), e)),
        }
    }

    log_action("Generating default icon...");
    let initials = initials(app_name);
    let color = random_color();

    if render_with_imagemagick(&icon_path, &initials, color) {
        return IconSource::ImageMagick;
    }
    if synthesize_png(&icon_path, color) {
        log_info("ImageMagick not available, generated a plain icon");
        return IconSource::Synthesized;
    }

    match fs::write(&icon_path, PLACEHOLDER) {
        Ok(()) => {
            log_warning("Could not generate an icon, using a placeholder");
            IconSource::Placeholder
        }
        Err(e) => {
            log_warning(&format!("Failed to create icon file {}: {}", icon_path.display(), e));
            IconSource::Missing
        }
    }
}

/// First two characters of the name, upper-cased; `G` for an empty name.
pub fn initials(name: &str) -> String {
    let text: String = name.chars().take(2).flat_map(char::to_uppercase).collect();
    if text.is_empty() {
        "G".to_string()
    } else {
        text
    }
}

// ============================================================================
// Internal Functions
// ============================================================================

/// ImageMagick binary and the leading arguments its version needs.
fn imagemagick() -> Option<(PathBuf, &'static [&'static str])> {
    if let Some(convert) = find_in_path("convert") {
        return Some((convert, CONVERT_ARGS));
    }
    find_in_path("magick").map(|magick| (magick, MAGICK_ARGS))
}

fn render_with_imagemagick(icon_path: &Path, initials: &str, color: [u8; 3]) -> bool {
    let Some((binary, leading)) = imagemagick() else {
        return false;
    };

    let size = format!("{}x{}", ICON_SIZE, ICON_SIZE);
    let background = format!("xc:#{:02x}{:02x}{:02x}", color[0], color[1], color[2]);
    let draw = format!("text 0,0 '{}'", initials.replace('\'', ""));

    let status = Command::new(&binary)
        .args(leading)
        .args(["-size", size.as_str(), background.as_str()])
        .args(["-fill", "white", "-font", "DejaVu-Sans-Bold", "-pointsize", "48"])
        .args(["-gravity", "center", "-draw", draw.as_str()])
        .arg(icon_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(s) if s.success() && icon_path.is_file() => true,
        Ok(s) => {
            log_warning(&format!("{} exited with {}", binary.display(), s));
            false
        }
        Err(e) => {
            log_warning(&format!("Failed to run {}: {}", binary.display(), e));
            false
        }
    }
}

#[cfg(feature = "full")]
fn synthesize_png(icon_path: &Path, color: [u8; 3]) -> bool {
    let img = image::RgbImage::from_pixel(ICON_SIZE, ICON_SIZE, image::Rgb(color));
    match img.save_with_format(icon_path, image::ImageFormat::Png) {
        Ok(()) => true,
        Err(e) => {
            log_warning(&format!("Failed to write icon: {}", e));
            false
        }
    }
}

#[cfg(not(feature = "full"))]
fn synthesize_png(_icon_path: &Path, _color: [u8; 3]) -> bool {
    false
}

#[cfg(feature = "full")]
fn random_color() -> [u8; 3] {
    rand::random()
}

#[cfg(not(feature = "full"))]
fn random_color() -> [u8; 3] {
    let nanos = chrono::Local::now().timestamp_subsec_nanos();
    let [_, r, g, b] = (nanos % 0xFF_FFFF).to_be_bytes();
    [r, g, b]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_two_characters() {
        assert_eq!(initials("super game"), "SU");
        assert_eq!(initials("x"), "X");
        assert_eq!(initials(""), "G");
        assert_eq!(initials("魔法少女"), "魔法");
    }

    #[test]
    fn user_icon_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("mine.png");
        fs::write(&src, b"\x89PNG fake").unwrap();

        let source = create_icon(dir.path(), "Game", Some(&src));
        assert_eq!(source, IconSource::UserFile);
        assert_eq!(fs::read(dir.path().join("Game.png")).unwrap(), b"\x89PNG fake");
    }

    #[test]
    fn missing_user_icon_still_produces_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = create_icon(dir.path(), "Game", Some(&dir.path().join("nope.png")));

        assert_ne!(source, IconSource::UserFile);
        assert_ne!(source, IconSource::Missing);
        assert!(dir.path().join("Game.png").is_file());
    }

    #[cfg(feature = "full")]
    #[test]
    fn synthesized_icon_is_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        assert!(synthesize_png(&path, [10, 20, 30]));

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (ICON_SIZE, ICON_SIZE));
        assert_eq!(img.get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }
}
