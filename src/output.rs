//! Defect output.
//!
//! An [`Outputer`] renders one context's defects at a time. Workers call
//! `write` concurrently, so every implementation serializes access to its
//! writer with a mutex; relative order between contexts is nondeterministic,
//! but two contexts never interleave at the byte level.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

use crate::context::FileContext;
use crate::error::Error;

/// Serialized sink for defect-bearing contexts.
pub trait Outputer: Send + Sync {
    /// Render one context. A context without defects is a no-op.
    fn write(&self, ctx: &FileContext);

    /// Flush and release the underlying writer.
    fn close(&self);
}

/// Select a writer and format from configuration. An empty file path writes
/// to stdout; `"cmd"` is the human-readable format, `"json"` the structured
/// one.
pub fn create_output(file: &str, format: &str) -> Result<Box<dyn Outputer>, Error> {
    let writer: Box<dyn Write + Send> = if file.is_empty() {
        Box::new(io::stdout())
    } else {
        Box::new(File::create(file).map_err(|e| Error::io(file, e))?)
    };
    match format {
        "json" => Ok(Box::new(JsonOutput::new(writer))),
        "cmd" | "" => Ok(Box::new(TextOutput::new(writer))),
        other => Err(Error::UnknownFormat(other.to_string())),
    }
}

/// Human-readable text: the file path on its own line, then one aligned line
/// per defect.
pub struct TextOutput {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

impl TextOutput {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        TextOutput {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }
}

impl Outputer for TextOutput {
    fn write(&self, ctx: &FileContext) {
        let defects = ctx.defects();
        if defects.is_empty() {
            return;
        }
        let mut writer = self.writer.lock().unwrap();
        let result: io::Result<()> = (|| {
            writeln!(writer, "{}", ctx.path().display())?;
            for (id, defect) in defects.iter().enumerate() {
                writeln!(
                    writer,
                    "{:6}|({:4},{:4}) model:{} desc:{}",
                    id, defect.row, defect.col, defect.model, defect.desc
                )?;
            }
            Ok(())
        })();
        if let Err(err) = result {
            tracing::error!("failed to write report: {err}");
        }
    }

    fn close(&self) {
        if let Err(err) = self.writer.lock().unwrap().flush() {
            tracing::error!("failed to flush report: {err}");
        }
    }
}

/// Newline-delimited JSON: one `{path: [defects]}` object per defect-bearing
/// file.
pub struct JsonOutput {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

impl JsonOutput {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        JsonOutput {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }
}

impl Outputer for JsonOutput {
    fn write(&self, ctx: &FileContext) {
        let defects = ctx.defects();
        if defects.is_empty() {
            return;
        }
        let value = match serde_json::to_value(&defects) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("failed to serialize defects: {err}");
                return;
            }
        };
        let mut record = serde_json::Map::new();
        record.insert(ctx.path().display().to_string(), value);
        let record = serde_json::Value::Object(record);
        let mut writer = self.writer.lock().unwrap();
        if let Err(err) = writeln!(writer, "{record}") {
            tracing::error!("failed to write report: {err}");
        }
    }

    fn close(&self) {
        if let Err(err) = self.writer.lock().unwrap().flush() {
            tracing::error!("failed to flush report: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pipeline;
    use std::sync::Arc;

    /// Writer handing every byte to a shared buffer, so tests can read what
    /// an outputer produced after `close`.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn ctx_with_defects(path: &str, defects: &[(&str, usize, usize, &str)]) -> FileContext {
        let unit = Arc::new(Pipeline {
            language: "Any".into(),
            grammar: None,
            queries: None,
            checks: Vec::new(),
        });
        let ctx = FileContext::with_content(path, unit, "");
        for (model, row, col, desc) in defects {
            ctx.add_defect(model, *row, *col, *desc);
        }
        ctx
    }

    #[test]
    fn text_output_format() {
        let buffer = SharedBuffer::default();
        let output = TextOutput::new(Box::new(buffer.clone()));
        let ctx = ctx_with_defects(
            "src/a.go",
            &[("FileBasic", 3, 0, "too long"), ("MissingDoc", 7, 2, "no doc")],
        );
        output.write(&ctx);
        output.close();

        let text = buffer.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "src/a.go");
        assert_eq!(lines[1], "     0|(   3,   0) model:FileBasic desc:too long");
        assert_eq!(lines[2], "     1|(   7,   2) model:MissingDoc desc:no doc");
    }

    #[test]
    fn json_output_is_newline_delimited_objects() {
        let buffer = SharedBuffer::default();
        let output = JsonOutput::new(Box::new(buffer.clone()));
        output.write(&ctx_with_defects("a.go", &[("M", 1, 2, "d")]));
        output.write(&ctx_with_defects("b.go", &[("N", 3, 4, "e")]));
        output.close();

        let text = buffer.contents();
        let records: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        let defect = &records[0]["a.go"][0];
        assert_eq!(defect["Model"], "M");
        assert_eq!(defect["Desc"], "d");
        assert_eq!(defect["Row"], 1);
        assert_eq!(defect["Col"], 2);
    }

    #[test]
    fn zero_defects_writes_nothing() {
        let buffer = SharedBuffer::default();
        let output = TextOutput::new(Box::new(buffer.clone()));
        output.write(&ctx_with_defects("clean.go", &[]));
        output.close();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(matches!(
            create_output("", "xml"),
            Err(Error::UnknownFormat(_))
        ));
    }
}
