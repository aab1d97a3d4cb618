use serde::{Deserialize, Serialize};

use crate::taxonomy::LesionCode;

/// Number of samples shown in the gallery at a time.
pub const GALLERY_SIZE: usize = 12;

/// Number of sample images shipped with the demo, named `1.jpg`..`20.jpg`.
const CATALOG_LEN: u32 = 20;

/// A catalog entry pairing a sample image with its ground-truth label.
/// Identity is the image name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub image_name: String,
    pub true_label: LesionCode,
}

/// The fixed demo catalog: numbered sample images cycling through the seven
/// lesion classes in index order.
pub fn sample_catalog() -> Vec<Sample> {
    (1..=CATALOG_LEN)
        .map(|n| Sample {
            image_name: format!("{n}.jpg"),
            true_label: label_for_id(n),
        })
        .collect()
}

/// Ground-truth label for a sample image name. Unknown names fall back to
/// melanoma, matching the mock endpoint's lookup.
pub fn true_label_for(image_name: &str) -> LesionCode {
    image_name
        .split('.')
        .next()
        .and_then(|stem| stem.parse::<u32>().ok())
        .filter(|n| (1..=CATALOG_LEN).contains(n))
        .map(label_for_id)
        .unwrap_or(LesionCode::Mel)
}

fn label_for_id(n: u32) -> LesionCode {
    LesionCode::ALL[((n - 1) % 7) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_twenty_unique_samples() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 20);
        for (i, sample) in catalog.iter().enumerate() {
            assert_eq!(sample.image_name, format!("{}.jpg", i + 1));
        }
    }

    #[test]
    fn catalog_cycles_through_all_classes() {
        let catalog = sample_catalog();
        assert_eq!(catalog[0].true_label, LesionCode::Mel);
        assert_eq!(catalog[2].true_label, LesionCode::Bcc);
        assert_eq!(catalog[6].true_label, LesionCode::Vasc);
        assert_eq!(catalog[7].true_label, LesionCode::Mel);
        assert_eq!(catalog[19].true_label, LesionCode::Df);
    }

    #[test]
    fn true_label_lookup_matches_catalog() {
        for sample in sample_catalog() {
            assert_eq!(true_label_for(&sample.image_name), sample.true_label);
        }
    }

    #[test]
    fn unknown_image_names_default_to_melanoma() {
        assert_eq!(true_label_for("999.jpg"), LesionCode::Mel);
        assert_eq!(true_label_for("not-a-sample.png"), LesionCode::Mel);
    }
}
