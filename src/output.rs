use flate2::{write::GzEncoder, Compression};
use std::fs::File;
use std::io::{BufWriter, Stdout, Write};
use std::path::Path;

/// Destination for account JSON lines.
pub enum Sink {
    Stdout(Stdout),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    pub fn stdout() -> Self {
        Self::Stdout(std::io::stdout())
    }

    pub fn gzip<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let file = File::create(path)?;

        Ok(Self::Gzip(GzEncoder::new(
            BufWriter::new(file),
            Compression::default(),
        )))
    }

    pub fn finish(self) -> Result<(), std::io::Error> {
        match self {
            Self::Stdout(mut stdout) => stdout.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Stdout(stdout) => stdout.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(stdout) => stdout.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}
