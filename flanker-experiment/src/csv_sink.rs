use crate::results::{ResultsLog, ResultsSink, SinkError};
use rand::Rng;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `<dir>/<PART_ID>_<suffix>_beh.csv` plus a JSON session summary
/// beside it.
///
/// The three-digit suffix is drawn once, so repeated saves during one
/// session overwrite the same file. Every save goes through a temporary file
/// and a rename.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    suffix: u16,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_suffix(dir, rand::rng().random_range(100..=999))
    }

    pub fn with_suffix(dir: impl Into<PathBuf>, suffix: u16) -> Self {
        Self {
            dir: dir.into(),
            suffix,
        }
    }

    #[cfg(test)]
    fn suffix(&self) -> u16 {
        self.suffix
    }

    fn stem(&self, log: &ResultsLog) -> String {
        format!("{}_{}", log.participant(), self.suffix)
    }

    pub fn csv_path(&self, log: &ResultsLog) -> PathBuf {
        self.dir.join(format!("{}_beh.csv", self.stem(log)))
    }

    pub fn summary_path(&self, log: &ResultsLog) -> PathBuf {
        self.dir.join(format!("{}_session.json", self.stem(log)))
    }

    fn write_csv(path: &Path, log: &ResultsLog) -> Result<(), SinkError> {
        // training rows carry one more field than experiment rows
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(BufWriter::new(File::create(path)?));
        for row in log.rows() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_summary(path: &Path, log: &ResultsLog) -> Result<(), SinkError> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, log.meta())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

fn replace_atomically<F>(target: &Path, write: F) -> Result<(), SinkError>
where
    F: FnOnce(&Path) -> Result<(), SinkError>,
{
    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    write(&tmp)?;
    fs::rename(&tmp, target)?;
    Ok(())
}

impl ResultsSink for CsvSink {
    fn persist(&mut self, log: &ResultsLog) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir)?;
        let csv_path = self.csv_path(log);
        replace_atomically(&csv_path, |tmp| Self::write_csv(tmp, log))?;
        let summary_path = self.summary_path(log);
        replace_atomically(&summary_path, |tmp| Self::write_summary(tmp, log))?;
        debug!(csv = %csv_path.display(), summary = %summary_path.display(), "results written");
        Ok(csv_path)
    }
}
