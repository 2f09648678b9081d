//! Source file table.
//!
//! File indices are 1-based; index 0 never resolves. The table starts out
//! with the files listed in the header and grows when the program runs
//! `DW_LNE_define_file`. Rewinding hides the entries past an earlier length
//! and restoring a later position shows them again, so nothing outside the
//! table keeps references into it: rows carry an index and are resolved
//! against the table at read time.

use super::cursor::Cursor;
use super::error::{LineError, Result};
use std::fmt;

/// A source file referenced by the line table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name, joined with its directory when it was relative
    pub path: String,
    /// Index into the include directory table
    pub directory_index: u64,
    /// Modification time, 0 if unknown
    pub mtime: u64,
    /// Length in bytes, 0 if unknown
    pub length: u64,
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Growable, rewindable file table.
///
/// Entries past the visible length are kept, so a rewound table can be
/// brought forward again to any length it has had.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    entries: Vec<FileEntry>,
    /// Number of visible entries
    len: usize,
    limit: Option<usize>,
}

impl FileTable {
    /// Create an empty table holding at most `limit` entries.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
            limit,
        }
    }

    /// Number of files defined so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up a file by its 1-based index.
    pub fn get(&self, index: u64) -> Option<&FileEntry> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        self.visible().get(slot)
    }

    /// Iterate over the files in index order, starting at index 1.
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> + '_ {
        self.visible().iter()
    }

    /// Hide every file defined after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Make the first `len` files visible again, as far as they were ever
    /// defined.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.entries.len());
    }

    fn visible(&self) -> &[FileEntry] {
        &self.entries[..self.len]
    }

    fn push(&mut self, entry: FileEntry, offset: usize) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.len >= limit {
                return Err(LineError::FileTableFull { offset, limit });
            }
        }
        match self.entries.get_mut(self.len) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
        self.len += 1;
        Ok(())
    }
}

/// Read one file entry and append it to `files`.
///
/// Shared by the header's file table and `DW_LNE_define_file`. Returns
/// `Ok(false)` when the name is empty, which terminates the header table and
/// leaves the rest of the entry unread.
pub fn read_file_entry(
    cursor: &mut Cursor<'_>,
    directories: &[String],
    files: &mut FileTable,
) -> Result<bool> {
    let name = cursor.string()?;
    if name.is_empty() {
        return Ok(false);
    }

    let offset = cursor.offset();
    let directory_index = cursor.uleb128()?;
    let path = if is_absolute(&name) {
        name
    } else {
        let directory = usize::try_from(directory_index)
            .ok()
            .and_then(|i| directories.get(i));
        match directory {
            Some(directory) => join_path(directory, &name),
            None => {
                return Err(cursor.fail(LineError::DirectoryIndexOutOfRange {
                    offset,
                    index: directory_index,
                    count: directories.len(),
                }))
            }
        }
    };
    let mtime = cursor.uleb128()?;
    let length = cursor.uleb128()?;

    let entry = FileEntry {
        path,
        directory_index,
        mtime,
        length,
    };
    files
        .push(entry, offset)
        .map_err(|err| cursor.fail(err))?;
    Ok(true)
}

/// True for `/`-rooted paths and DOS drive paths such as `C:\src`.
pub fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'\\' || bytes[2] == b'/'))
}

/// Join a relative name onto a directory and normalize the result lexically.
///
/// `.` components are dropped and `..` removes the preceding component, the
/// way a shell would resolve the path without touching the filesystem.
pub fn join_path(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        return clean_path(name);
    }
    clean_path(&format!("{}/{}", directory, name))
}

fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // Cannot climb above the root
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cursor::Endian;

    fn dirs() -> Vec<String> {
        vec!["/build".to_string(), "/usr/include".to_string()]
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/build", "main.c"), "/build/main.c");
        assert_eq!(join_path("/build/", "./src/a.c"), "/build/src/a.c");
        assert_eq!(join_path("/build/obj", "../src/a.c"), "/build/src/a.c");
        assert_eq!(join_path("/", "../a.c"), "/a.c");
        assert_eq!(join_path("", "a.c"), "a.c");
        assert_eq!(join_path("rel", "../../a.c"), "../a.c");
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("/usr/include/stdio.h"));
        assert!(is_absolute("C:\\src\\main.c"));
        assert!(!is_absolute("src/main.c"));
        assert!(!is_absolute("C:"));
    }

    #[test]
    fn test_read_relative_entry() {
        // "stdio.h", dir 1, mtime 5, length 200
        let data = b"stdio.h\0\x01\x05\xC8\x01";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(None);

        assert!(read_file_entry(&mut cursor, &dirs(), &mut files).unwrap());
        let entry = files.get(1).unwrap();
        assert_eq!(entry.path, "/usr/include/stdio.h");
        assert_eq!(entry.directory_index, 1);
        assert_eq!(entry.mtime, 5);
        assert_eq!(entry.length, 200);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_absolute_name_ignores_directory() {
        // Directory index is out of range but never consulted
        let data = b"/abs/x.c\0\x09\x00\x00";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(None);

        assert!(read_file_entry(&mut cursor, &dirs(), &mut files).unwrap());
        assert_eq!(files.get(1).unwrap().path, "/abs/x.c");
    }

    #[test]
    fn test_empty_name_terminates() {
        let data = b"\0";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(None);

        assert!(!read_file_entry(&mut cursor, &dirs(), &mut files).unwrap());
        assert!(files.is_empty());
    }

    #[test]
    fn test_directory_index_out_of_range() {
        let data = b"a.c\0\x02\x00\x00";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(None);

        let err = read_file_entry(&mut cursor, &dirs(), &mut files).unwrap_err();
        assert_eq!(
            err,
            LineError::DirectoryIndexOutOfRange { offset: 4, index: 2, count: 2 }
        );
        assert_eq!(cursor.error(), Some(&err));
    }

    #[test]
    fn test_index_zero_never_resolves() {
        let data = b"a.c\0\x00\x00\x00";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(None);
        read_file_entry(&mut cursor, &dirs(), &mut files).unwrap();

        assert!(files.get(0).is_none());
        assert!(files.get(1).is_some());
        assert!(files.get(2).is_none());
    }

    #[test]
    fn test_truncate_and_limit() {
        let data = b"a.c\0\x00\x00\x00b.c\0\x00\x00\x00";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(Some(1));

        read_file_entry(&mut cursor, &dirs(), &mut files).unwrap();
        let err = read_file_entry(&mut cursor, &dirs(), &mut files).unwrap_err();
        assert!(matches!(err, LineError::FileTableFull { limit: 1, .. }));

        files.truncate(0);
        assert!(files.is_empty());
        assert!(files.get(1).is_none());
    }

    #[test]
    fn test_rewound_entries_come_back() {
        let data = b"a.c\0\x00\x00\x00b.c\0\x00\x00\x00c.c\0\x00\x00\x00";
        let mut cursor = Cursor::new(data, 0, Endian::Little, 8);
        let mut files = FileTable::new(None);
        read_file_entry(&mut cursor, &dirs(), &mut files).unwrap();
        read_file_entry(&mut cursor, &dirs(), &mut files).unwrap();

        files.truncate(1);
        assert_eq!(files.len(), 1);
        assert!(files.get(2).is_none());
        assert_eq!(files.iter().count(), 1);

        files.set_len(2);
        assert_eq!(files.get(2).unwrap().path, "/build/b.c");

        // Never beyond what was defined
        files.set_len(5);
        assert_eq!(files.len(), 2);

        // Defining after a rewind reuses the hidden slot
        files.truncate(1);
        read_file_entry(&mut cursor, &dirs(), &mut files).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files.get(2).unwrap().path, "/build/c.c");
    }
}
