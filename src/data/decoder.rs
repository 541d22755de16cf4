//! Particle filename decoder.
//!
//! A particle image stem has eight `_`-separated positional segments:
//!
//! ```text
//!  AB01 _ 1 _ 2 _ 3 _ b4 _ 5X _ phi0phi1 _ PG
//!  afe    sample batch id  instr  magn  grain size  label
//! ```
//!
//! Structural violations reject the whole name. Unknown label sub-codes do
//! not: they decode to [`Coded::Unspecified`].

use thiserror::Error;

use super::model::{
    AfeRef, Classification, Coded, Color, Crystallinity, DecodedInfo, HydroAlterDegree,
    Instrument, MainType, Particle, PhiBound, SampleRef, Shape, SubType, VolcanoId,
};

/// Grain size token of the open-ended overflow class.
pub const OPEN_CLASS_TOKEN: &str = "morephi0";

const SEGMENT_COUNT: usize = 8;
const GRAIN_TOKEN_LEN: usize = 8;

/// Why a filename stem was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedFilename {
    #[error("expected 8 '_'-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("grain size token '{0}' is neither 8 characters long nor 'morephi0'")]
    GrainSizeToken(String),

    #[error("instrument token '{0}' has no second character")]
    InstrumentToken(String),
}

/// Decode a filename stem, returning `None` for malformed names.
pub fn decode(
    filename: &str,
    volcano: impl Into<VolcanoId>,
    file_path: &str,
) -> Option<DecodedInfo> {
    try_decode(filename, volcano, file_path).ok()
}

/// Decode a filename stem into AFE, sample and particle records.
///
/// `filename` must already be stripped of directories, frame suffix and
/// extension. `file_path` is passed through to the particle's `imgURL`.
pub fn try_decode(
    filename: &str,
    volcano: impl Into<VolcanoId>,
    file_path: &str,
) -> Result<DecodedInfo, MalformedFilename> {
    let segments: Vec<&str> = filename.split('_').collect();
    if segments.len() != SEGMENT_COUNT {
        return Err(MalformedFilename::SegmentCount(segments.len()));
    }

    let grain = segments[6];
    if grain.chars().count() != GRAIN_TOKEN_LEN && grain != OPEN_CLASS_TOKEN {
        return Err(MalformedFilename::GrainSizeToken(grain.to_string()));
    }

    let instrument_token = segments[4];
    let index = instrument_token
        .chars()
        .nth(1)
        .ok_or_else(|| MalformedFilename::InstrumentToken(instrument_token.to_string()))?;

    let (gs_low, gs_up) = if grain == OPEN_CLASS_TOKEN {
        (PhiBound::Value(0), PhiBound::Value(-1))
    } else {
        match (grain.chars().nth(3), grain.chars().nth(7)) {
            (Some(low), Some(up)) => (PhiBound::Class(low), PhiBound::Class(up)),
            _ => return Err(MalformedFilename::GrainSizeToken(grain.to_string())),
        }
    };

    let (instrument, index, multi_focus) = if instrument_token.starts_with('b') {
        (Some(Instrument::Binocular), Some(index), false)
    } else {
        (None, None, true)
    };

    let volc_num = volcano.into();
    let afe_id = segments[0].to_string();

    let afe = AfeRef {
        volc_num: volc_num.clone(),
        afe_id: afe_id.clone(),
    };
    let sample = SampleRef {
        volc_num: volc_num.clone(),
        afe_id: afe_id.clone(),
        sample_id: parse_leading_int(segments[1]),
    };
    let particle = Particle {
        volc_num,
        afe_id,
        sample_id: segments[1].to_string(),
        id: segments[3].to_string(),
        batch: segments[2].to_string(),
        img_url: file_path.to_string(),
        magnification: segments[5].chars().next(),
        gs_low,
        gs_up,
        instrument,
        index,
        multi_focus,
        classification: classify(segments[7]),
    };

    Ok(DecodedInfo {
        afe,
        sample,
        particle,
    })
}

/// Base-10 integer prefix of `token` (optional sign, leading whitespace
/// skipped), or `None` when there is no digit to read.
fn parse_leading_int(token: &str) -> Option<i64> {
    let t = token.trim_start();
    let (negative, digits) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// Label classification
// ---------------------------------------------------------------------------

/// Label class, decided before any per-class field is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelClass {
    FreeCrystal(SubType),
    Juvenile,
    AlteredMaterial,
    Lithic,
}

impl LabelClass {
    pub fn of(label: &str) -> Self {
        if let Some(&(_, sub)) = FREE_CRYSTALS.iter().find(|(code, _)| *code == label) {
            return LabelClass::FreeCrystal(sub);
        }
        match label.chars().next() {
            Some('J') => LabelClass::Juvenile,
            Some('A') => LabelClass::AlteredMaterial,
            _ => LabelClass::Lithic,
        }
    }

    pub fn main_type(self) -> MainType {
        match self {
            LabelClass::FreeCrystal(_) => MainType::FreeCrystal,
            LabelClass::Juvenile => MainType::Juvenile,
            LabelClass::AlteredMaterial => MainType::AlteredMaterial,
            LabelClass::Lithic => MainType::Lithic,
        }
    }
}

const FREE_CRYSTALS: &[(&str, SubType)] = &[
    ("PG", SubType::Plagioclase),
    ("PX", SubType::Pyroxene),
    ("AMF", SubType::Amphibole),
    ("SU", SubType::Sulfide),
    ("OL", SubType::Olivine),
    ("OT", SubType::Others),
];

const COLORS: &[(&str, Color)] = &[("tr", Color::Transparent), ("bl", Color::Black)];

const CRYSTALLINITIES: &[(&str, Crystallinity)] = &[
    ("lc", Crystallinity::Low),
    ("mc", Crystallinity::Mid),
    ("hc", Crystallinity::High),
];

const SHAPES: &[(&str, Shape)] = &[
    ("b", Shape::Blocky),
    ("f", Shape::Fluidal),
    ("s", Shape::Spongy),
    ("hv", Shape::HighlyVesicular),
    ("mt", Shape::Microtubular),
    ("p", Shape::Pumice),
];

// Each label class accepts a different subset of alteration degrees.
const HYDRO_JUVENILE: &[(char, HydroAlterDegree)] = &[
    ('n', HydroAlterDegree::None),
    ('l', HydroAlterDegree::Slight),
    ('m', HydroAlterDegree::Moderate),
    ('h', HydroAlterDegree::High),
];
const HYDRO_ALTERED_CRYSTALLINE: &[(char, HydroAlterDegree)] = &[
    ('m', HydroAlterDegree::Moderate),
    ('h', HydroAlterDegree::High),
];
const HYDRO_ALTERED_BULK: &[(char, HydroAlterDegree)] = &[
    ('l', HydroAlterDegree::Slight),
    ('m', HydroAlterDegree::Moderate),
    ('h', HydroAlterDegree::High),
];
const HYDRO_LITHIC: &[(char, HydroAlterDegree)] = &[
    ('n', HydroAlterDegree::None),
    ('l', HydroAlterDegree::Slight),
];

/// Character-indexed view of a label. Out-of-range reads yield `None` or a
/// clamped (possibly empty) slice, both of which match no code.
struct Label {
    chars: Vec<char>,
}

impl Label {
    fn new(label: &str) -> Self {
        Self {
            chars: label.chars().collect(),
        }
    }

    fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    fn suffix(&self, start: usize) -> String {
        self.slice(start, self.chars.len())
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], code: &str) -> Coded<T> {
    table
        .iter()
        .find(|(k, _)| *k == code)
        .map_or(Coded::Unspecified, |&(_, v)| Coded::Known(v))
}

fn lookup_char<T: Copy>(table: &[(char, T)], code: Option<char>) -> Coded<T> {
    table
        .iter()
        .find(|(k, _)| Some(*k) == code)
        .map_or(Coded::Unspecified, |&(_, v)| Coded::Known(v))
}

/// Decode the classification label segment.
pub fn classify(label: &str) -> Classification {
    let class = LabelClass::of(label);
    let view = Label::new(label);
    let mut c = Classification::new(class.main_type());

    match class {
        LabelClass::FreeCrystal(sub) => c.sub_type = Some(Coded::Known(sub)),
        LabelClass::Juvenile => juvenile(&view, &mut c),
        LabelClass::AlteredMaterial => altered_material(&view, &mut c),
        LabelClass::Lithic => lithic(&view, &mut c),
    }
    c
}

fn color_and_crystallinity(label: &Label, c: &mut Classification) {
    c.color = Some(lookup(COLORS, &label.slice(2, 4)));
    c.crystallinity = Some(lookup(CRYSTALLINITIES, &label.slice(4, 6)));
}

fn juvenile(label: &Label, c: &mut Classification) {
    c.sub_type = match label.at(1) {
        Some('J') => Some(Coded::Known(SubType::StandardJuvenile)),
        Some('H') => Some(Coded::Known(SubType::HydrothermallyAlteredJuvenile)),
        _ => None,
    };
    color_and_crystallinity(label, c);

    let shape_start = if label.at(1) == Some('J') {
        6
    } else {
        c.hydro_alter_degree = Some(lookup_char(HYDRO_JUVENILE, label.at(6)));
        7
    };
    c.shape = Some(lookup(SHAPES, &label.suffix(shape_start)));
}

fn altered_material(label: &Label, c: &mut Classification) {
    c.sub_type = Some(match label.at(1) {
        Some('W') => Coded::Known(SubType::WeatheredMaterial),
        Some('H') => Coded::Known(SubType::HydrothermallyAlteredMaterial),
        _ => Coded::Unspecified,
    });
    if label.at(1) != Some('H') {
        return;
    }

    match label.at(2) {
        Some('t') | Some('b') => {
            color_and_crystallinity(label, c);
            c.hydro_alter_degree = Some(lookup_char(HYDRO_ALTERED_CRYSTALLINE, label.at(6)));
        }
        Some('a') => c.shape = Some(Coded::Known(Shape::Aggregate)),
        other => c.hydro_alter_degree = Some(lookup_char(HYDRO_ALTERED_BULK, other)),
    }
}

fn lithic(label: &Label, c: &mut Classification) {
    c.sub_type = Some(match label.at(1) {
        Some('L') => Coded::Known(SubType::StandardLithic),
        Some('J') => Coded::Known(SubType::RecycledJuvenile),
        _ => Coded::Unspecified,
    });
    color_and_crystallinity(label, c);

    if label.at(1) == Some('L') {
        c.hydro_alter_degree = Some(lookup_char(HYDRO_LITHIC, label.at(6)));
    } else {
        c.shape = Some(lookup(SHAPES, &label.suffix(6)));
    }
}
