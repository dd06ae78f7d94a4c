#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes raw bytes into a file under the workspace and returns the path.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    /// Builds a small workbook the way field offices send them: native date
    /// cells, numeric odometers and free-form headers.
    pub fn write_service_workbook(&self, name: &str) -> PathBuf {
        let path = self.join(name);
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd.mm.yyyy");
        let sheet = workbook.add_worksheet();
        for (col, header) in ["plaka", "Tarih", "bakim_km", "Bir Sonraki KM", "Bakımı Yapan"]
            .iter()
            .enumerate()
        {
            sheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }

        let rows = [
            ("16 BUR 16", (2025, 5, 20), 40_000.0, 40_800.0, "Zeynep"),
            ("34 ABC 12", (2024, 11, 2), 8_000.0, 18_000.0, "Ahmet"),
        ];
        for (idx, (plate, (y, m, d), km, next, by)) in rows.iter().enumerate() {
            let row = idx as u32 + 1;
            let date = ExcelDateTime::from_ymd(*y, *m, *d).expect("valid date");
            sheet.write_string(row, 0, *plate).expect("write plate");
            sheet
                .write_datetime_with_format(row, 1, &date, &date_format)
                .expect("write date");
            sheet.write_number(row, 2, *km).expect("write km");
            sheet.write_number(row, 3, *next).expect("write next km");
            sheet.write_string(row, 4, *by).expect("write technician");
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}
