//! Digital film: hit records plus the buffered block writer and reader.
//!
//! Each worker owns a bounded buffer of hit records and flushes it to the
//! shared [`DataStream`] as one tagged block whenever it fills. Develop
//! reads the same blocks back through an independent handle.

use crate::color::{self, Color};
use crate::fixed::Fixed16;
use crate::stream::{BlockHeader, DataStream, BLOCK_HEADER_SIZE};
use std::io;
use std::sync::Arc;

/// Identity tag of the lens configuration block.
pub const TAG_CONFIG: u16 = 1;
/// Identity tag of a hit record block.
pub const TAG_HITS: u16 = 2;

/// On-disk stride of one hit record.
pub const HIT_RECORD_SIZE: usize = 16;
/// Total size of the configuration block.
pub const CONFIG_BLOCK_SIZE: u32 = BLOCK_HEADER_SIZE + 4;
/// Size of a hit block before its records (block header plus count).
pub const HITS_HEADER_SIZE: u32 = BLOCK_HEADER_SIZE + 4;

/// Compact capture of one photon crossing the lens plane.
///
/// Positions are filmspace (projections on the lens U/V axes scaled by the
/// aperture diameter), directions are the raw U/V components of the unit
/// ray direction, and the color is the photon's emissive color in RGBA8.
/// Records occupy a 16-byte stride on disk; the last four bytes are
/// reserved and zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRecord {
    /// Filmspace hit position, each component in (-0.5, +0.5).
    pub pos: [Fixed16; 2],
    /// Ray direction components along the lens U and V axes.
    pub dir: [Fixed16; 2],
    /// Stored photon color (alpha unused).
    pub clr: [u8; 4],
}

impl HitRecord {
    /// Encode a capture.
    pub fn new(pos_u: f32, pos_v: f32, dir_u: f32, dir_v: f32, color: Color) -> Self {
        HitRecord {
            pos: [Fixed16::encode(pos_u), Fixed16::encode(pos_v)],
            dir: [Fixed16::encode(dir_u), Fixed16::encode(dir_v)],
            clr: color::store(color),
        }
    }

    /// Little-endian wire form.
    pub fn to_bytes(&self) -> [u8; HIT_RECORD_SIZE] {
        let mut bytes = [0u8; HIT_RECORD_SIZE];
        bytes[0..2].copy_from_slice(&self.pos[0].to_le_bytes());
        bytes[2..4].copy_from_slice(&self.pos[1].to_le_bytes());
        bytes[4..6].copy_from_slice(&self.dir[0].to_le_bytes());
        bytes[6..8].copy_from_slice(&self.dir[1].to_le_bytes());
        bytes[8..12].copy_from_slice(&self.clr);
        bytes
    }

    /// Rebuild from one on-disk stride.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        HitRecord {
            pos: [
                Fixed16::from_le_bytes([bytes[0], bytes[1]]),
                Fixed16::from_le_bytes([bytes[2], bytes[3]]),
            ],
            dir: [
                Fixed16::from_le_bytes([bytes[4], bytes[5]]),
                Fixed16::from_le_bytes([bytes[6], bytes[7]]),
            ],
            clr: [bytes[8], bytes[9], bytes[10], bytes[11]],
        }
    }
}

/// Lens configuration stored in the film's config block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilmConfig {
    /// Aperture diameter of the capturing lens, in world units.
    pub lens_radius: f32,
}

/// A worker's view of the film: a bounded record buffer over the stream.
pub struct Film {
    stream: Arc<DataStream>,
    buffer: Vec<HitRecord>,
    capacity: usize,
    /// Lens configuration, written before any hits and read back on develop.
    pub config: FilmConfig,
    /// Records this film has flushed to the stream.
    pub exposures: u64,
}

impl Film {
    /// A film over `stream` flushing every `capacity` records.
    pub fn new(stream: Arc<DataStream>, capacity: usize) -> Self {
        assert!(capacity > 0 && capacity < u32::MAX as usize);
        Film {
            stream,
            buffer: Vec::with_capacity(capacity),
            capacity,
            config: FilmConfig::default(),
            exposures: 0,
        }
    }

    /// Expose the film to one captured photon, flushing on a full buffer.
    pub fn expose(&mut self, hit: HitRecord) -> io::Result<()> {
        self.buffer.push(hit);
        if self.buffer.len() >= self.capacity {
            self.flush()
        } else {
            Ok(())
        }
    }

    /// Write the buffered records to the stream as one hit block.
    ///
    /// An empty buffer writes nothing, so a worker that captured no photons
    /// leaves no trace in the file.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let count = self.buffer.len() as u32;
        let size = HITS_HEADER_SIZE + count * HIT_RECORD_SIZE as u32;

        let mut block = Vec::with_capacity(size as usize);
        block.extend_from_slice(&BlockHeader::new(TAG_HITS, size).to_bytes());
        block.extend_from_slice(&count.to_le_bytes());
        for hit in &self.buffer {
            block.extend_from_slice(&hit.to_bytes());
        }

        self.stream.sync().write_bytes(&block)?;
        self.exposures += u64::from(count);
        self.buffer.clear();
        Ok(())
    }

    /// Write the configuration block. Called exactly once, before any hits.
    pub fn write_config(&self) -> io::Result<()> {
        let mut block = Vec::with_capacity(CONFIG_BLOCK_SIZE as usize);
        block.extend_from_slice(&BlockHeader::new(TAG_CONFIG, CONFIG_BLOCK_SIZE).to_bytes());
        block.extend_from_slice(&self.config.lens_radius.to_le_bytes());
        self.stream.sync().write_bytes(&block)
    }

    /// Seek to the configuration block and read it.
    pub fn read_config(&mut self) -> io::Result<()> {
        let mut cursor = self.stream.sync();
        cursor.seek(TAG_CONFIG)?;
        let header = cursor.read_header()?;
        header.expect(TAG_CONFIG, CONFIG_BLOCK_SIZE)?;
        let mut bytes = [0u8; 4];
        cursor.read_bytes(&mut bytes)?;
        self.config.lens_radius = f32::from_le_bytes(bytes);
        Ok(())
    }

    /// Move the read cursor back to the first block after the file header.
    pub fn rewind(&self) -> io::Result<()> {
        self.stream.sync().rewind()
    }

    /// Call `func` on every hit block from the cursor forward.
    ///
    /// Iteration ends at the first failing seek or read, which is how the
    /// end of the file announces itself.
    pub fn read_hits(&mut self, mut func: impl FnMut(&[HitRecord])) {
        while self.read_block().is_ok() {
            func(&self.buffer);
        }
    }

    fn read_block(&mut self) -> io::Result<()> {
        let mut cursor = self.stream.sync();
        cursor.seek(TAG_HITS)?;
        let header = cursor.read_header()?;

        let mut bytes = [0u8; 4];
        cursor.read_bytes(&mut bytes)?;
        let count = u32::from_le_bytes(bytes);
        let expected = u64::from(HITS_HEADER_SIZE) + u64::from(count) * HIT_RECORD_SIZE as u64;
        if u64::from(header.size) != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "hit block size does not match its count",
            ));
        }

        let mut payload = vec![0u8; count as usize * HIT_RECORD_SIZE];
        cursor.read_bytes(&mut payload)?;
        drop(cursor);

        self.buffer.clear();
        self.buffer
            .extend(payload.chunks_exact(HIT_RECORD_SIZE).map(HitRecord::from_bytes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::FILE_HEADER_SIZE;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("darkroom_film_{}_{}.dat", std::process::id(), name))
    }

    fn sample_hit(tint: f32) -> HitRecord {
        HitRecord::new(0.25, -0.25, 0.5, -0.5, Color::new(tint, 0.5, 1.0 - tint))
    }

    #[test]
    fn record_wire_form_round_trips() {
        let hit = sample_hit(0.75);
        let bytes = hit.to_bytes();
        assert_eq!(bytes[12..16], [0, 0, 0, 0]);
        assert_eq!(HitRecord::from_bytes(&bytes), hit);
    }

    #[test]
    fn config_round_trips_exactly() {
        let path = scratch("config");
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let mut film = Film::new(Arc::clone(&stream), 16);
        film.config.lens_radius = 2.625;
        film.write_config().unwrap();

        film.config.lens_radius = 0.0;
        film.rewind().unwrap();
        film.read_config().unwrap();
        assert_eq!(film.config.lens_radius, 2.625);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn expose_flushes_at_capacity_and_reads_back_in_order() {
        let path = scratch("expose");
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let mut film = Film::new(Arc::clone(&stream), 4);
        film.config.lens_radius = 2.0;
        film.write_config().unwrap();

        let hits: Vec<HitRecord> = (0..9).map(|i| sample_hit(i as f32 / 9.0)).collect();
        for hit in &hits {
            film.expose(*hit).unwrap();
        }
        film.flush().unwrap();
        assert_eq!(film.exposures, 9);

        let mut replayed = Vec::new();
        let mut blocks = 0;
        film.rewind().unwrap();
        film.read_hits(|block| {
            blocks += 1;
            replayed.extend_from_slice(block);
        });
        // Two full buffers and one tail flush.
        assert_eq!(blocks, 3);
        assert_eq!(replayed, hits);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_flush_leaves_the_file_untouched() {
        let path = scratch("empty");
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let mut film = Film::new(Arc::clone(&stream), 4);
        film.write_config().unwrap();
        film.flush().unwrap();
        drop(film);
        drop(stream);

        let written = std::fs::metadata(&path).unwrap().len();
        assert_eq!(
            written,
            u64::from(FILE_HEADER_SIZE) + u64::from(CONFIG_BLOCK_SIZE)
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn seek_walks_config_then_hits_then_tail() {
        let path = scratch("walk");
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let mut film = Film::new(Arc::clone(&stream), 1);
        film.config.lens_radius = 2.0;
        film.write_config().unwrap();
        for i in 0..10 {
            // Capacity 1 flushes every exposure into its own block.
            film.expose(sample_hit(i as f32 / 10.0)).unwrap();
        }

        let mut cursor = stream.sync();
        cursor.rewind().unwrap();
        cursor.seek(TAG_CONFIG).unwrap();
        assert_eq!(cursor.read_header().unwrap().ident, TAG_CONFIG);

        cursor.rewind().unwrap();
        cursor.seek(TAG_HITS).unwrap();
        assert_eq!(
            cursor.position().unwrap(),
            u64::from(FILE_HEADER_SIZE) + u64::from(CONFIG_BLOCK_SIZE)
        );
        for _ in 0..10 {
            assert_eq!(cursor.step().unwrap().ident, TAG_HITS);
        }
        assert!(cursor.step().is_err());
        drop(cursor);
        std::fs::remove_file(&path).ok();
    }
}
