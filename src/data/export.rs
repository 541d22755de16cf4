use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::model::{AfeRef, Coded, ContributionBatch, Particle, ParticleEntry, SampleRef, Term};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Upload payload: `{ afes, samples, particles }`.
    Json,
    /// One row per particle.
    Csv,
    /// Same table as CSV.
    Parquet,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            other => bail!("Unsupported export extension: .{other}"),
        }
    }
}

/// Write `batch` to `path`; the format follows the extension.
pub fn export(batch: &ContributionBatch, path: &Path) -> Result<()> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Json => export_json(batch, path),
        ExportFormat::Csv => export_csv(batch, path),
        ExportFormat::Parquet => export_parquet(batch, path),
    }?;
    log::info!("Exported {} particle(s) to {}", batch.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON upload payload
// ---------------------------------------------------------------------------

/// The three collections the database receives, in upload order.
#[derive(Debug, Serialize)]
pub struct UploadPayload<'a> {
    pub afes: Vec<AfeRef>,
    pub samples: Vec<SampleRef>,
    pub particles: Vec<&'a Particle>,
}

impl<'a> UploadPayload<'a> {
    pub fn new(batch: &'a ContributionBatch) -> Self {
        Self {
            afes: batch.afes(),
            samples: batch.samples(),
            particles: batch.particles().collect(),
        }
    }
}

fn export_json(batch: &ContributionBatch, path: &Path) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(BufWriter::new(file), &UploadPayload::new(batch))
        .context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Particle table (CSV / Parquet)
// ---------------------------------------------------------------------------

/// Flat particle row. Absent attributes are `None` (empty cell / null);
/// unrecognised label codes are `Some("")`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleRow {
    pub volc_num: String,
    pub afe_id: String,
    pub sample_id: String,
    pub id: String,
    pub batch: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
    pub magnification: Option<String>,
    #[serde(rename = "gsLow")]
    pub gs_low: String,
    #[serde(rename = "gsUp")]
    pub gs_up: String,
    pub instrument: Option<String>,
    pub index: Option<String>,
    pub multi_focus: bool,
    pub main_type: String,
    pub sub_type: Option<String>,
    pub color: Option<String>,
    pub crystallinity: Option<String>,
    pub hydro_alter_degree: Option<String>,
    pub shape: Option<String>,
    pub frames: i64,
}

fn coded<T: Term>(value: Option<Coded<T>>) -> Option<String> {
    value.map(|v| v.as_str().to_string())
}

impl From<&ParticleEntry> for ParticleRow {
    fn from(entry: &ParticleEntry) -> Self {
        let p = &entry.info.particle;
        let c = &p.classification;
        ParticleRow {
            volc_num: p.volc_num.to_string(),
            afe_id: p.afe_id.clone(),
            sample_id: p.sample_id.clone(),
            id: p.id.clone(),
            batch: p.batch.clone(),
            img_url: p.img_url.clone(),
            magnification: p.magnification.map(String::from),
            gs_low: p.gs_low.to_string(),
            gs_up: p.gs_up.to_string(),
            instrument: p.instrument.map(|i| i.to_string()),
            index: p.index.map(String::from),
            multi_focus: p.multi_focus,
            main_type: c.main_type.as_str().to_string(),
            sub_type: coded(c.sub_type),
            color: coded(c.color),
            crystallinity: coded(c.crystallinity),
            hydro_alter_degree: coded(c.hydro_alter_degree),
            shape: coded(c.shape),
            frames: entry.frames.len() as i64,
        }
    }
}

pub fn particle_rows(batch: &ContributionBatch) -> Vec<ParticleRow> {
    batch.entries.iter().map(ParticleRow::from).collect()
}

fn export_csv(batch: &ContributionBatch, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in particle_rows(batch) {
        writer.serialize(&row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn export_parquet(batch: &ContributionBatch, path: &Path) -> Result<()> {
    let rows = particle_rows(batch);

    let text = |name: &str, get: fn(&ParticleRow) -> String| -> (Field, ArrayRef) {
        let values: Vec<String> = rows.iter().map(get).collect();
        (
            Field::new(name, DataType::Utf8, false),
            Arc::new(StringArray::from(values)) as ArrayRef,
        )
    };
    let optional = |name: &str, get: fn(&ParticleRow) -> Option<String>| -> (Field, ArrayRef) {
        let values: Vec<Option<String>> = rows.iter().map(get).collect();
        (
            Field::new(name, DataType::Utf8, true),
            Arc::new(StringArray::from(values)) as ArrayRef,
        )
    };

    let columns = vec![
        text("volc_num", |r| r.volc_num.clone()),
        text("afe_id", |r| r.afe_id.clone()),
        text("sample_id", |r| r.sample_id.clone()),
        text("id", |r| r.id.clone()),
        text("batch", |r| r.batch.clone()),
        text("imgURL", |r| r.img_url.clone()),
        optional("magnification", |r| r.magnification.clone()),
        text("gsLow", |r| r.gs_low.clone()),
        text("gsUp", |r| r.gs_up.clone()),
        optional("instrument", |r| r.instrument.clone()),
        optional("index", |r| r.index.clone()),
        (
            Field::new("multi_focus", DataType::Boolean, false),
            Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.multi_focus).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        text("main_type", |r| r.main_type.clone()),
        optional("sub_type", |r| r.sub_type.clone()),
        optional("color", |r| r.color.clone()),
        optional("crystallinity", |r| r.crystallinity.clone()),
        optional("hydro_alter_degree", |r| r.hydro_alter_degree.clone()),
        optional("shape", |r| r.shape.clone()),
        (
            Field::new("frames", DataType::Int64, false),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.frames).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
    ];

    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
    let schema = Arc::new(Schema::new(fields));
    let record_batch =
        RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&record_batch).context("writing parquet batch")?;
    writer.close().context("closing parquet file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::loader::scan;
    use crate::data::model::VolcanoId;

    fn batch() -> ContributionBatch {
        let paths = vec![
            PathBuf::from("img/AB01_1_2_1_b4_5X_phi0phi1_PG.png"),
            PathBuf::from("img/AB01_1_2_2_m4_5X_morephi0_JJtrlcp-1.png"),
            PathBuf::from("img/AB01_1_2_2_m4_5X_morephi0_JJtrlcp-2.png"),
        ];
        scan(&paths, &VolcanoId::Number(211060))
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out.JSON")).unwrap(),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out.pq")).unwrap(),
            ExportFormat::Parquet
        );
        assert!(ExportFormat::from_path(Path::new("out.xlsx")).is_err());
    }

    #[test]
    fn payload_uses_database_field_names() {
        let batch = batch();
        let json = serde_json::to_value(UploadPayload::new(&batch)).unwrap();

        assert_eq!(json["afes"].as_array().unwrap().len(), 1);
        assert_eq!(json["samples"][0]["sample_id"], 1);
        let open = &json["particles"][1];
        assert_eq!(open["gsLow"], 0);
        assert_eq!(open["gsUp"], -1);
        assert_eq!(open["multi_focus"], true);
        assert_eq!(open["shape"], "pumice");
        assert!(open.get("hydro_alter_degree").is_none());
        assert!(open.get("instrument").is_none());
        assert_eq!(json["particles"][0]["imgURL"], "img/AB01_1_2_1_b4_5X_phi0phi1_PG.png");
    }

    #[test]
    fn rows_flatten_particles() {
        let rows = particle_rows(&batch());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].instrument.as_deref(), Some("binocular"));
        assert_eq!(rows[0].color, None);
        assert_eq!(rows[1].frames, 2);
        assert_eq!(rows[1].gs_up, "-1");
    }
}
