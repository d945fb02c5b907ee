use crate::error::{EstimatorError, Result};
use bytemuck::Pod;
use memmap2::Mmap;
use std::fs::File;
use std::io::Write;
use std::mem::size_of;
use std::path::Path;

/// A finite, ordered sequence of fixed-width little-endian records, either
/// held in memory or backed by a read-only memory map of a column file.
///
/// The on-disk format is a flat packed array of `T`; the byte length of a
/// mapped file must be positive and divisible by `size_of::<T>()`.
#[derive(Debug)]
pub enum Column<T: Pod> {
    Mem(Vec<T>),
    Mapped(Mmap),
}

impl<T: Pod> Column<T> {
    /// Wrap an in-memory vector of records (test fixtures, generators).
    pub fn from_vec(values: Vec<T>) -> Self {
        Column::Mem(values)
    }

    /// Memory-map a column file. One-shot; the map is read-only and lives as
    /// long as the column.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| EstimatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // Safety: the map is never written through, and column files are
        // treated as immutable for the lifetime of a run.
        let map = unsafe {
            Mmap::map(&file).map_err(|source| EstimatorError::Io {
                path: path.to_path_buf(),
                source,
            })?
        };

        if map.len() == 0 {
            return Err(EstimatorError::input(format!("column {:?} is empty", path)));
        }
        if map.len() % size_of::<T>() != 0 {
            return Err(EstimatorError::input(format!(
                "column {:?} has {} bytes, not a multiple of the {}-byte record",
                path,
                map.len(),
                size_of::<T>()
            )));
        }
        // The map is page-aligned, so this only rejects genuinely bad sizes;
        // checking here keeps as_slice infallible.
        if bytemuck::try_cast_slice::<u8, T>(&map).is_err() {
            return Err(EstimatorError::input(format!(
                "column {:?} cannot be viewed as its record type",
                path
            )));
        }

        Ok(Column::Mapped(map))
    }

    /// View the records as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Column::Mem(values) => values,
            Column::Mapped(map) => bytemuck::cast_slice(map),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

/// Write records as a flat little-endian column file.
pub fn write_column<T: Pod>(path: &Path, values: &[T]) -> Result<()> {
    let mut file = File::create(path).map_err(|source| EstimatorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(bytemuck::cast_slice(values))
        .map_err(|source| EstimatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
