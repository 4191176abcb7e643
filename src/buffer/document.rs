use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Line terminator used when writing the document back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// On-disk layout details needed to write lines back byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub line_ending: LineEnding,
    /// Whether the last line is followed by a terminator
    pub trailing_newline: bool,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            trailing_newline: true,
        }
    }
}

/// A file on durable storage, addressed by line.
///
/// The document itself never holds line contents; those live in the
/// `Window` or, during a save, in a transient full copy.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    format: Format,
    /// Line count found when the document was described
    line_count: usize,
    is_new: bool,
}

impl Document {
    /// Describe the file at `path`, scanning its format and line count if
    /// it exists.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match scan(&path) {
            Ok(found) => Ok(Self {
                path,
                format: found.format,
                line_count: found.line_count,
                is_new: false,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self {
                path,
                format: Format::default(),
                line_count: 0,
                is_new: true,
            }),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// True until the file has been written once
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Record a successful write of `format` to `path`
    pub fn mark_written(&mut self, path: &Path, format: Format, line_count: usize) {
        self.path = path.to_path_buf();
        self.format = format;
        self.line_count = line_count;
        self.is_new = false;
    }

    /// Open a streaming line reader over the document
    pub fn reader(&self) -> io::Result<LineReader<BufReader<File>>> {
        let file = File::open(&self.path)?;
        Ok(LineReader::new(BufReader::new(file), self.format.line_ending))
    }

    /// Read every line. A missing file reads as empty.
    pub fn read_all(&self) -> io::Result<(Vec<String>, Format)> {
        let mut reader = match self.reader() {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok((Vec::new(), self.format));
            }
            Err(e) => return Err(e),
        };

        let mut lines = Vec::new();
        while let Some(line) = reader.next_line()? {
            lines.push(line);
        }

        let format = Format {
            line_ending: self.format.line_ending,
            trailing_newline: lines.is_empty() || reader.ended_with_newline(),
        };
        Ok((lines, format))
    }
}

/// What one pass over the mapped file finds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    pub format: Format,
    pub line_count: usize,
}

/// Map the file once and read off its line ending (from the first line),
/// whether it ends with a terminator, and how many lines it has. A final
/// line without a terminator still counts as a line.
pub fn scan(path: &Path) -> io::Result<Scan> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Scan {
            format: Format::default(),
            line_count: 0,
        });
    }

    // SAFETY: the mapping is read-only and dropped before returning. A
    // concurrent truncation by another process can still fault the scan.
    let map = unsafe { Mmap::map(&file)? };
    let mut newlines = map
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'\n')
        .map(|(pos, _)| pos);

    let first = newlines.next();
    let line_ending = match first {
        Some(pos) if pos > 0 && map[pos - 1] == b'\r' => LineEnding::CrLf,
        _ => LineEnding::Lf,
    };
    let count = first.map_or(0, |_| 1 + newlines.count());
    let trailing_newline = map.last() == Some(&b'\n');

    Ok(Scan {
        format: Format {
            line_ending,
            trailing_newline,
        },
        line_count: count + usize::from(!trailing_newline),
    })
}

pub fn count_lines(path: &Path) -> io::Result<usize> {
    Ok(scan(path)?.line_count)
}

/// Line-at-a-time reader that strips the document's terminator.
pub struct LineReader<R> {
    inner: R,
    ending: LineEnding,
    buf: Vec<u8>,
    ended_with_newline: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, ending: LineEnding) -> Self {
        Self {
            inner,
            ending,
            buf: Vec::with_capacity(256),
            ended_with_newline: true,
        }
    }

    /// Read the next line, or `None` at end of input
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let read = self.inner.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }

        self.ended_with_newline = self.buf.last() == Some(&b'\n');
        if self.ended_with_newline {
            self.buf.pop();
            if self.ending == LineEnding::CrLf && self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Whether the most recently read line had a terminator
    pub fn ended_with_newline(&self) -> bool {
        self.ended_with_newline
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
