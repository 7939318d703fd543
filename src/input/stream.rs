use crate::utils::error::ProfileError;
use flate2::read::MultiGzDecoder;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Open a trace file for line-by-line reading
///
/// **Public** - used by `aggregator::reduce_file`
///
/// # Errors
/// * `ProfileError::OpenFailed` - the file cannot be opened
pub fn open_trace(path: impl AsRef<Path>) -> Result<TraceLines<Box<dyn BufRead>>, ProfileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ProfileError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let reader: Box<dyn BufRead> = if is_gzip(path) {
        debug!("Reading {} as gzip", path.display());
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(TraceLines::new(reader))
}

/// **Private** - compression is chosen by file name only
fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Iterator over the lines of a trace
///
/// Unlike `BufRead::lines`, invalid UTF-8 does not end the stream: the
/// line is converted lossily and left to the decoder to reject. Trailing
/// `\n` / `\r\n` are stripped.
pub struct TraceLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> TraceLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for TraceLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
