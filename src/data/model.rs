use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use super::decoder::MalformedFilename;

// ---------------------------------------------------------------------------
// VolcanoId – opaque identifier supplied by the caller
// ---------------------------------------------------------------------------

/// Volcano identifier as known to the database: either a numeric volcano
/// number or a free-form code. Passed through unchanged to every record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum VolcanoId {
    Number(i64),
    Code(String),
}

impl VolcanoId {
    /// Interpret user input: all digits → number, anything else → code.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) => VolcanoId::Number(n),
            Err(_) => VolcanoId::Code(s.to_string()),
        }
    }
}

impl From<i64> for VolcanoId {
    fn from(n: i64) -> Self {
        VolcanoId::Number(n)
    }
}

impl From<&str> for VolcanoId {
    fn from(s: &str) -> Self {
        VolcanoId::Code(s.to_string())
    }
}

impl From<String> for VolcanoId {
    fn from(s: String) -> Self {
        VolcanoId::Code(s)
    }
}

impl fmt::Display for VolcanoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolcanoId::Number(n) => write!(f, "{n}"),
            VolcanoId::Code(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification vocabularies
// ---------------------------------------------------------------------------

/// A closed vocabulary whose terms serialize as fixed database strings.
pub trait Term: Copy {
    fn as_str(self) -> &'static str;
}

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl Term for $name {
            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

vocabulary!(
    /// Top-level particle class.
    MainType {
        FreeCrystal => "free crystal",
        Juvenile => "juvenile",
        AlteredMaterial => "altered material",
        Lithic => "lithic",
    }
);

vocabulary!(
    SubType {
        Plagioclase => "plagioclase",
        Pyroxene => "pyroxene",
        Amphibole => "amphibole",
        Sulfide => "sulfide",
        Olivine => "olivine",
        Others => "others",
        StandardJuvenile => "standard juvenile",
        HydrothermallyAlteredJuvenile => "hydrothermally altered juvenile",
        WeatheredMaterial => "weathered material",
        HydrothermallyAlteredMaterial => "hydrothermally altered material",
        StandardLithic => "standard lithic",
        RecycledJuvenile => "recycled juvenile",
    }
);

vocabulary!(
    Color {
        Transparent => "transparent",
        Black => "black",
    }
);

vocabulary!(
    Crystallinity {
        Low => "low",
        Mid => "mid",
        High => "high",
    }
);

vocabulary!(
    HydroAlterDegree {
        None => "none",
        Slight => "slight",
        Moderate => "moderate",
        High => "high",
    }
);

vocabulary!(
    Shape {
        Blocky => "blocky",
        Fluidal => "fluidal",
        Spongy => "spongy",
        HighlyVesicular => "highly vesicular",
        Microtubular => "microtubular",
        Pumice => "pumice",
        Aggregate => "aggregate",
    }
);

/// Value of a label segment that was present in the filename.
///
/// `Unspecified` means the segment was there but its code was not
/// recognised; it serializes as `""`. A segment that does not apply to the
/// label class at all is represented by the surrounding `Option` being `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coded<T> {
    Known(T),
    Unspecified,
}

impl<T: Term> Coded<T> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Coded::Known(t) => t.as_str(),
            Coded::Unspecified => "",
        }
    }
}

impl<T: Term> Serialize for Coded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Grain size and instrument
// ---------------------------------------------------------------------------

/// One bound of the phi-scale grain size class.
///
/// Regular names carry single-character class tokens (`phi0phi1` → `'0'`,
/// `'1'`); the `morephi0` overflow class is encoded numerically as `0 / -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhiBound {
    Class(char),
    Value(i8),
}

impl PhiBound {
    pub fn as_number(self) -> Option<i32> {
        match self {
            PhiBound::Class(c) => c.to_digit(10).map(|d| d as i32),
            PhiBound::Value(v) => Some(v as i32),
        }
    }
}

impl fmt::Display for PhiBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhiBound::Class(c) => write!(f, "{c}"),
            PhiBound::Value(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for PhiBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PhiBound::Class(c) => serializer.serialize_char(*c),
            PhiBound::Value(v) => serializer.serialize_i8(*v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Binocular,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Binocular => f.write_str("binocular"),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded records
// ---------------------------------------------------------------------------

/// Reference to an ash-forming event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AfeRef {
    pub volc_num: VolcanoId,
    pub afe_id: String,
}

/// Reference to a physical sample. `sample_id` is `None` (JSON `null`) when
/// the token does not start with an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SampleRef {
    pub volc_num: VolcanoId,
    pub afe_id: String,
    pub sample_id: Option<i64>,
}

/// Classification decoded from the label segment. Only `main_type` is always
/// present; every other attribute is `None` when the label class has no
/// segment for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    pub main_type: MainType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<Coded<SubType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Coded<Color>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crystallinity: Option<Coded<Crystallinity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hydro_alter_degree: Option<Coded<HydroAlterDegree>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Coded<Shape>>,
}

impl Classification {
    pub fn new(main_type: MainType) -> Self {
        Self {
            main_type,
            sub_type: None,
            color: None,
            crystallinity: None,
            hydro_alter_degree: None,
            shape: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Particle {
    pub volc_num: VolcanoId,
    pub afe_id: String,
    /// Raw sample token, kept verbatim.
    pub sample_id: String,
    pub id: String,
    pub batch: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnification: Option<char>,
    #[serde(rename = "gsLow")]
    pub gs_low: PhiBound,
    #[serde(rename = "gsUp")]
    pub gs_up: PhiBound,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<char>,
    pub multi_focus: bool,
    #[serde(flatten)]
    pub classification: Classification,
}

/// Everything one filename decodes into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DecodedInfo {
    pub afe: AfeRef,
    pub sample: SampleRef,
    pub particle: Particle,
}

// ---------------------------------------------------------------------------
// AttrValue – one cell of the particle attribute table
// ---------------------------------------------------------------------------

/// Attribute value as seen by filters, colour maps and the particle table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrValue {
    /// Attribute does not apply to this particle.
    Absent,
    /// Segment present but unrecognised.
    Unspecified,
    Flag(bool),
    Text(String),
}

impl AttrValue {
    fn coded<T: Term>(value: Option<Coded<T>>) -> Self {
        match value {
            None => AttrValue::Absent,
            Some(Coded::Unspecified) => AttrValue::Unspecified,
            Some(Coded::Known(t)) => AttrValue::Text(t.as_str().to_string()),
        }
    }

    fn optional<T: fmt::Display>(value: Option<T>) -> Self {
        value.map_or(AttrValue::Absent, |v| AttrValue::Text(v.to_string()))
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Absent => write!(f, "<absent>"),
            AttrValue::Unspecified => write!(f, "<unspecified>"),
            AttrValue::Flag(b) => write!(f, "{b}"),
            AttrValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Attribute columns offered for filtering and colouring, in display order.
pub const ATTRIBUTE_COLUMNS: &[&str] = &[
    "main_type",
    "sub_type",
    "color",
    "crystallinity",
    "hydro_alter_degree",
    "shape",
    "instrument",
    "multi_focus",
    "magnification",
    "grain_size",
    "afe_id",
    "sample_id",
];

impl Particle {
    /// Attribute table row used by the filter panel and the colour map.
    pub fn attributes(&self) -> BTreeMap<&'static str, AttrValue> {
        let c = &self.classification;
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "main_type",
            AttrValue::Text(c.main_type.as_str().to_string()),
        );
        attrs.insert("sub_type", AttrValue::coded(c.sub_type));
        attrs.insert("color", AttrValue::coded(c.color));
        attrs.insert("crystallinity", AttrValue::coded(c.crystallinity));
        attrs.insert("hydro_alter_degree", AttrValue::coded(c.hydro_alter_degree));
        attrs.insert("shape", AttrValue::coded(c.shape));
        attrs.insert("instrument", AttrValue::optional(self.instrument));
        attrs.insert("multi_focus", AttrValue::Flag(self.multi_focus));
        attrs.insert("magnification", AttrValue::optional(self.magnification));
        attrs.insert("grain_size", AttrValue::Text(self.grain_size_label()));
        attrs.insert("afe_id", AttrValue::Text(self.afe_id.clone()));
        attrs.insert("sample_id", AttrValue::Text(self.sample_id.clone()));
        attrs
    }

    /// Human readable grain size class, e.g. `φ0–φ1` or `>φ0`.
    pub fn grain_size_label(&self) -> String {
        match (self.gs_low, self.gs_up) {
            (PhiBound::Value(0), PhiBound::Value(-1)) => ">φ0".to_string(),
            (low, up) => format!("φ{low}–φ{up}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ContributionBatch – decoded particles ready for upload
// ---------------------------------------------------------------------------

/// One particle of a batch: the decoded records plus every image file that
/// belongs to it (multi-focus frames share a stem).
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEntry {
    pub info: DecodedInfo,
    pub frames: Vec<PathBuf>,
}

/// A file whose name could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub path: PathBuf,
    pub reason: MalformedFilename,
}

/// The full result of an import with pre-computed attribute indices.
#[derive(Debug, Clone, Default)]
pub struct ContributionBatch {
    pub entries: Vec<ParticleEntry>,
    pub rejected: Vec<Rejected>,
    /// Attribute columns that occur in the batch, in display order.
    pub column_names: Vec<String>,
    /// For each attribute column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<AttrValue>>,
}

impl ContributionBatch {
    /// Build attribute indices from the decoded entries.
    pub fn from_parts(entries: Vec<ParticleEntry>, rejected: Vec<Rejected>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<AttrValue>> = BTreeMap::new();

        for entry in &entries {
            for (col, val) in entry.info.particle.attributes() {
                unique_values
                    .entry(col.to_string())
                    .or_default()
                    .insert(val);
            }
        }
        let column_names = ATTRIBUTE_COLUMNS
            .iter()
            .filter(|c| unique_values.contains_key(**c))
            .map(|c| c.to_string())
            .collect();

        ContributionBatch {
            entries,
            rejected,
            column_names,
            unique_values,
        }
    }

    /// Number of decoded particles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no particle was decoded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.entries.iter().map(|e| &e.info.particle)
    }

    /// Ash-forming event references, deduplicated in first-seen order.
    pub fn afes(&self) -> Vec<AfeRef> {
        dedup_in_order(self.entries.iter().map(|e| &e.info.afe))
    }

    /// Sample references, deduplicated in first-seen order.
    pub fn samples(&self) -> Vec<SampleRef> {
        dedup_in_order(self.entries.iter().map(|e| &e.info.sample))
    }

    /// Keep only the entries at `indices` (e.g. the filtered view).
    pub fn subset(&self, indices: &[usize]) -> ContributionBatch {
        let entries = indices
            .iter()
            .filter_map(|&i| self.entries.get(i).cloned())
            .collect();
        ContributionBatch::from_parts(entries, self.rejected.clone())
    }
}

fn dedup_in_order<'a, T>(items: impl Iterator<Item = &'a T>) -> Vec<T>
where
    T: Clone + Ord + 'a,
{
    let mut seen = BTreeSet::new();
    items
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volcano_id_parse_prefers_numbers() {
        assert_eq!(VolcanoId::parse(" 211060 "), VolcanoId::Number(211060));
        assert_eq!(VolcanoId::parse("V100"), VolcanoId::Code("V100".into()));
    }

    #[test]
    fn coded_serializes_unspecified_as_empty_string() {
        let known = serde_json::to_string(&Coded::Known(Shape::HighlyVesicular)).unwrap();
        let unknown = serde_json::to_string(&Coded::<Shape>::Unspecified).unwrap();
        assert_eq!(known, "\"highly vesicular\"");
        assert_eq!(unknown, "\"\"");
    }

    #[test]
    fn phi_bounds_serialize_as_text_or_number() {
        assert_eq!(serde_json::to_string(&PhiBound::Class('3')).unwrap(), "\"3\"");
        assert_eq!(serde_json::to_string(&PhiBound::Value(-1)).unwrap(), "-1");
        assert_eq!(PhiBound::Class('3').as_number(), Some(3));
        assert_eq!(PhiBound::Class('x').as_number(), None);
    }

    #[test]
    fn classification_omits_absent_and_keeps_unspecified() {
        let mut c = Classification::new(MainType::Lithic);
        c.sub_type = Some(Coded::Known(SubType::StandardLithic));
        c.color = Some(Coded::Unspecified);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["main_type"], "lithic");
        assert_eq!(json["sub_type"], "standard lithic");
        assert_eq!(json["color"], "");
        assert!(json.get("shape").is_none());
    }
}
