use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use super::decoder::try_decode;
use super::model::{ContributionBatch, ParticleEntry, Rejected, VolcanoId};
use super::naming::ImageName;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Import picked files and folders as one contribution batch.
///
/// Folders are expanded (recursively when `recursive` is set); only files
/// whose extension is in `extensions` are considered.
pub fn import(
    inputs: &[PathBuf],
    volcano: &VolcanoId,
    extensions: &[String],
    recursive: bool,
) -> Result<ContributionBatch> {
    let images = collect_images(inputs, extensions, recursive)?;
    let batch = scan(&images, volcano);
    log::info!(
        "Imported {} image(s): {} particle(s), {} rejected",
        images.len(),
        batch.len(),
        batch.rejected.len()
    );
    Ok(batch)
}

/// Whether `path` names an image file with one of the given extensions.
pub fn is_image(path: &Path, extensions: &[String]) -> bool {
    ImageName::parse(path).is_some_and(|name| name.has_extension(extensions))
}

// ---------------------------------------------------------------------------
// File collection
// ---------------------------------------------------------------------------

/// Expand folders and keep image files, sorted and without duplicates.
pub fn collect_images(
    inputs: &[PathBuf],
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    let mut images = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            let mut walker = WalkDir::new(input).sort_by_file_name();
            if !recursive {
                walker = walker.max_depth(1);
            }
            for entry in walker {
                let entry =
                    entry.with_context(|| format!("reading folder {}", input.display()))?;
                if entry.file_type().is_file() && is_image(entry.path(), extensions) {
                    images.insert(entry.into_path());
                }
            }
        } else if is_image(input, extensions) {
            images.insert(input.clone());
        } else {
            log::debug!("Skipping {}: not an image", input.display());
        }
    }

    Ok(images.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode every image path into a batch.
///
/// Frames of one multi-focus stack (same folder, same stem) become a single
/// particle whose `imgURL` is the unsuffixed file if present, otherwise the
/// lowest frame. Undecodable names are collected in `rejected`.
pub fn scan(paths: &[PathBuf], volcano: &VolcanoId) -> ContributionBatch {
    let mut groups: Vec<(String, Vec<(Option<u32>, PathBuf)>)> = Vec::new();
    let mut group_index: HashMap<(Option<PathBuf>, String), usize> = HashMap::new();

    for path in paths {
        let Some(name) = ImageName::parse(path) else {
            log::warn!("Skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };
        let key = (path.parent().map(Path::to_path_buf), name.stem.clone());
        let idx = *group_index.entry(key).or_insert_with(|| {
            groups.push((name.stem.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push((name.frame, path.clone()));
    }

    let mut entries = Vec::with_capacity(groups.len());
    let mut rejected = Vec::new();

    for (stem, mut frames) in groups {
        // Unsuffixed file first, then frames in numeric order.
        frames.sort_by_key(|(frame, _)| (frame.is_some(), *frame));
        let frames: Vec<PathBuf> = frames.into_iter().map(|(_, p)| p).collect();
        let Some(primary) = frames.first() else {
            continue;
        };

        match try_decode(&stem, volcano.clone(), &primary.to_string_lossy()) {
            Ok(info) => entries.push(ParticleEntry { info, frames }),
            Err(reason) => {
                log::warn!("Cannot decode {}: {reason}", primary.display());
                rejected.extend(frames.into_iter().map(|path| Rejected {
                    path,
                    reason: reason.clone(),
                }));
            }
        }
    }

    ContributionBatch::from_parts(entries, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::decoder::MalformedFilename;
    use crate::data::model::MainType;

    const STEM: &str = "AB01_1_2_3_m4_5X_phi0phi1_JJtrlcp";

    #[test]
    fn frames_collapse_into_one_particle() {
        let paths = vec![
            PathBuf::from(format!("stack/{STEM}-2.png")),
            PathBuf::from(format!("stack/{STEM}-1.png")),
            PathBuf::from(format!("other/{STEM}-1.png")),
        ];
        let batch = scan(&paths, &VolcanoId::Number(7));

        assert_eq!(batch.len(), 2);
        let first = &batch.entries[0];
        assert_eq!(first.frames.len(), 2);
        assert_eq!(first.frames[0], PathBuf::from(format!("stack/{STEM}-1.png")));
        assert_eq!(first.info.particle.img_url, format!("stack/{STEM}-1.png"));
        assert_eq!(first.info.particle.classification.main_type, MainType::Juvenile);
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn malformed_names_are_rejected_without_stopping() {
        let paths = vec![
            PathBuf::from("a_b_c.png"),
            PathBuf::from(format!("{STEM}.png")),
        ];
        let batch = scan(&paths, &VolcanoId::Number(7));

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].path, PathBuf::from("a_b_c.png"));
        assert_eq!(batch.rejected[0].reason, MalformedFilename::SegmentCount(3));
    }

    #[test]
    fn references_are_deduplicated() {
        let paths = vec![
            PathBuf::from("AB01_1_2_3_b4_5X_phi0phi1_PG.png"),
            PathBuf::from("AB01_1_2_4_b4_5X_phi0phi1_PX.png"),
            PathBuf::from("AB01_2_2_5_b4_5X_phi0phi1_OL.png"),
        ];
        let batch = scan(&paths, &VolcanoId::Number(7));

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.afes().len(), 1);
        let samples = batch.samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].sample_id, Some(1));
        assert_eq!(samples[1].sample_id, Some(2));
    }

    #[test]
    fn is_image_checks_extension() {
        let exts = vec!["png".to_string()];
        assert!(is_image(Path::new("x/y.PNG"), &exts));
        assert!(!is_image(Path::new("x/y.txt"), &exts));
        assert!(!is_image(Path::new("x/noext"), &exts));
    }
}
