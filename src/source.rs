//! Source file registry and diagnostic rendering.

use crate::error::Error;

/// Dense index of a [`File`] in a [`SourceMap`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

/// A source location: a byte offset into one registered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub file: FileId,
    pub offset: u32,
}

/// A registered source file.
///
/// `contents` has already been normalized by the lexer front half:
/// line endings canonicalized, trigraphs decoded, and backslash-newline
/// splices removed, so byte offsets here are what tokens carry.
#[derive(Debug)]
pub struct File {
    pub name: String,
    /// Name reported in diagnostics; changed by `#line`.
    pub display_name: String,
    pub contents: String,
    pub id: FileId,
    /// Line-number bias from `#line`.
    pub line_delta: i32,
}

/// All files seen while compiling one translation unit, used for error
/// reporting and (on Windows) debug info.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<File>,
}

impl SourceMap {
    pub fn new() -> SourceMap {
        SourceMap::default()
    }

    pub fn add(&mut self, name: &str, contents: String) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(File {
            name: name.to_string(),
            display_name: name.to_string(),
            contents,
            id,
            line_delta: 0,
        });
        id
    }

    pub fn file(&self, id: FileId) -> &File {
        &self.files[id.0 as usize]
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut File {
        &mut self.files[id.0 as usize]
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// 1-based line number of `offset` in its file, before `#line` bias.
    pub fn line_number(&self, loc: Loc) -> u32 {
        let contents = self.file(loc.file).contents.as_bytes();
        let end = (loc.offset as usize).min(contents.len());
        memchr::memchr_iter(b'\n', &contents[..end]).count() as u32 + 1
    }

    /// Render `err` with one line of source context and a caret.
    ///
    /// The layout matches the reference driver's output:
    ///
    /// ```text
    /// main.c:3: error: expected ';'
    ///   int x = 1
    ///            ^
    /// ```
    pub fn render(&self, err: &Error, ansi: bool) -> String {
        let (red, bold, reset) = if ansi {
            ("\x1b[31m", "\x1b[1m", "\x1b[0m")
        } else {
            ("", "", "")
        };

        let Some(loc) = err.loc() else {
            return format!("{red}error:{reset} {}\n", err.message());
        };

        let file = self.file(loc.file);
        let line_no = self.line_number(loc) as i64 + file.line_delta as i64;

        let contents = file.contents.as_bytes();
        let offset = (loc.offset as usize).min(contents.len());
        let line_start = match memchr::memrchr(b'\n', &contents[..offset]) {
            Some(pos) => pos + 1,
            None => 0,
        };
        let line_end = memchr::memchr(b'\n', &contents[offset..])
            .map(|pos| offset + pos)
            .unwrap_or(contents.len());
        let line_text = String::from_utf8_lossy(&contents[line_start..line_end]);

        let mut out = format!(
            "{bold}{}:{}:{reset} {red}error:{reset} {}\n",
            file.display_name,
            line_no,
            err.message()
        );
        out.push_str(&format!("  {line_text}\n"));
        // Caret column in display width, counting the two-space indent.
        let col = String::from_utf8_lossy(&contents[line_start..offset])
            .chars()
            .count();
        out.push_str(&format!("  {}{red}^{reset}\n", " ".repeat(col)));
        out
    }
}
