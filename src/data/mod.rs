/// Data layer: filename decoding, batch import, filtering and export.
///
/// Architecture:
/// ```text
///  picked files / folders
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  walk folders, group frames by stem
///   └──────────┘
///        │  naming: path → stem, frame, extension
///        ▼
///   ┌──────────┐
///   │  decoder  │  stem → AfeRef + SampleRef + Particle
///   └──────────┘
///        │
///        ▼
///   ┌───────────────────┐
///   │ ContributionBatch │  entries, rejected names, attribute index
///   └───────────────────┘
///        │                 │
///        ▼                 ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │      │  export   │  JSON payload / CSV / Parquet
///   └──────────┘      └──────────┘
/// ```

pub mod decoder;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod naming;

pub use decoder::{decode, try_decode, MalformedFilename};
pub use model::{AfeRef, DecodedInfo, Particle, SampleRef, VolcanoId};
