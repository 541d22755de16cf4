use std::path::Path;

// ---------------------------------------------------------------------------
// ImageName – the parts of an image file name
// ---------------------------------------------------------------------------

/// An image file name split into decoder stem, multi-focus frame number and
/// extension:
///
/// ```text
///  img/AB01_1_2_3_m4_5X_phi0phi1_PG-2.png
///      └──────────── stem ──────────┘ │ └ extension
///                                 frame
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    pub stem: String,
    pub frame: Option<u32>,
    pub extension: Option<String>,
}

impl ImageName {
    /// Split the file name of `path`. Returns `None` when the path has no
    /// UTF-8 file name.
    pub fn parse(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;

        let (base, extension) = match file_name.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() => (base, Some(ext.to_string())),
            _ => (file_name, None),
        };

        let (stem, frame) = match base.rsplit_once('-') {
            Some((stem, digits))
                if !stem.is_empty()
                    && !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit()) =>
            {
                match digits.parse::<u32>() {
                    Ok(n) => (stem, Some(n)),
                    Err(_) => (base, None),
                }
            }
            _ => (base, None),
        };

        Some(ImageName {
            stem: stem.to_string(),
            frame,
            extension,
        })
    }

    /// Whether the extension is one of `extensions` (case-insensitive).
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        self.extension.as_deref().is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_frame_and_extension() {
        let name = ImageName::parse(Path::new("img/AB01_1_2_3_m4_5X_phi0phi1_PG-2.png")).unwrap();
        assert_eq!(name.stem, "AB01_1_2_3_m4_5X_phi0phi1_PG");
        assert_eq!(name.frame, Some(2));
        assert_eq!(name.extension.as_deref(), Some("png"));
    }

    #[test]
    fn single_image_has_no_frame() {
        let name = ImageName::parse(Path::new("AB01_1_2_3_b4_5X_phi0phi1_PG.JPG")).unwrap();
        assert_eq!(name.stem, "AB01_1_2_3_b4_5X_phi0phi1_PG");
        assert_eq!(name.frame, None);
        assert!(name.has_extension(&["jpg".to_string()]));
        assert!(!name.has_extension(&["png".to_string()]));
    }

    #[test]
    fn non_numeric_dash_suffix_stays_in_stem() {
        let name = ImageName::parse(Path::new("run-a.tif")).unwrap();
        assert_eq!(name.stem, "run-a");
        assert_eq!(name.frame, None);
    }

    #[test]
    fn dotfile_and_missing_extension() {
        let name = ImageName::parse(Path::new(".hidden")).unwrap();
        assert_eq!(name.stem, ".hidden");
        assert_eq!(name.extension, None);

        let name = ImageName::parse(Path::new("plain-3")).unwrap();
        assert_eq!(name.stem, "plain");
        assert_eq!(name.frame, Some(3));
        assert_eq!(name.extension, None);
    }
}
