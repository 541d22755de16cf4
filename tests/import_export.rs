use std::fs;
use std::path::Path;

use ash_curator::config::parse_extensions;
use ash_curator::data::decoder::MalformedFilename;
use ash_curator::data::export::export;
use ash_curator::data::loader::{collect_images, import};
use ash_curator::data::model::VolcanoId;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

fn contribution_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "AFE01_1_1_1_b2_5X_phi1phi2_PG.png");
    touch(dir.path(), "AFE01_1_1_2_m1_5X_phi1phi2_JJtrlcp-1.png");
    touch(dir.path(), "AFE01_1_1_2_m1_5X_phi1phi2_JJtrlcp-2.png");
    touch(dir.path(), "AFE01_1_1_2_m1_5X_phi1phi2_JJtrlcp-3.png");
    touch(dir.path(), "AFE01_1_1_3_b1_5X_morephi0_AHa.png");
    touch(dir.path(), "AFE01_1_1_4_b1_5X_phi01_PG.png");
    touch(dir.path(), "notes.txt");

    let nested = dir.path().join("sample2");
    fs::create_dir(&nested).unwrap();
    touch(&nested, "AFE01_2_1_1_b3_10X_phi2phi3_LLtrlcn.TIF");
    dir
}

#[test]
fn collect_respects_recursion_and_extensions() {
    let dir = contribution_folder();
    let exts = parse_extensions("png,tif");

    let flat = collect_images(&[dir.path().to_path_buf()], &exts, false).unwrap();
    assert_eq!(flat.len(), 6);

    let deep = collect_images(&[dir.path().to_path_buf()], &exts, true).unwrap();
    assert_eq!(deep.len(), 7);
    assert!(deep
        .iter()
        .all(|p| p.extension().and_then(|e| e.to_str()) != Some("txt")));
}

#[test]
fn import_groups_stacks_and_reports_rejections() {
    let dir = contribution_folder();
    let batch = import(
        &[dir.path().to_path_buf()],
        &VolcanoId::Number(211060),
        &parse_extensions("png,tif"),
        true,
    )
    .unwrap();

    assert_eq!(batch.len(), 4);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(
        batch.rejected[0].reason,
        MalformedFilename::GrainSizeToken("phi01".into())
    );

    let stack = batch
        .entries
        .iter()
        .find(|e| e.info.particle.id == "2")
        .unwrap();
    assert_eq!(stack.frames.len(), 3);
    assert!(stack.info.particle.multi_focus);
    assert!(stack.info.particle.img_url.ends_with("JJtrlcp-1.png"));

    assert_eq!(batch.afes().len(), 1);
    assert_eq!(batch.samples().len(), 2);
}

#[test]
fn exports_payload_and_tables() {
    let dir = contribution_folder();
    let batch = import(
        &[dir.path().to_path_buf()],
        &VolcanoId::Number(211060),
        &parse_extensions("png,tif"),
        true,
    )
    .unwrap();

    let json_path = dir.path().join("upload.json");
    export(&batch, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["afes"].as_array().unwrap().len(), 1);
    assert_eq!(json["samples"].as_array().unwrap().len(), 2);
    assert_eq!(json["particles"].as_array().unwrap().len(), 4);

    let csv_path = dir.path().join("particles.csv");
    export(&batch, &csv_path).unwrap();
    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert!(headers.iter().any(|h| h == "imgURL"));
    assert!(headers.iter().any(|h| h == "hydro_alter_degree"));
    assert_eq!(reader.records().count(), 4);

    let parquet_path = dir.path().join("particles.parquet");
    export(&batch, &parquet_path).unwrap();
    let file = fs::File::open(&parquet_path).unwrap();
    let rows: usize = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .map(|b| b.unwrap().num_rows())
        .sum();
    assert_eq!(rows, 4);

    assert!(export(&batch, &dir.path().join("particles.xlsx")).is_err());
}
