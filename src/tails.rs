use crate::knox::accumulator::cks::{RevocationTailsAccessor, Tail, TailsGenerator};
use crate::revocation_registry::RevocationRegistryDefinition;
use crate::CredxResult;
use log::{debug, trace};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Version tag at the start of every tails blob
pub const TAILS_BLOB_TAG: [u8; 2] = [0, 2];
/// Size of one encoded tail
pub const TAIL_SIZE: usize = Tail::BYTES;

/// Persists the tails of a new registry
pub trait TailsWriter {
    /// Consume the generator and return `(location, base58 sha256 hash)`
    fn write(&mut self, generator: &mut TailsGenerator) -> CredxResult<(String, String)>;
}

/// Writes tails files into a directory, named by their hash
#[derive(Clone, Debug)]
pub struct TailsFileWriter {
    root_path: PathBuf,
}

impl TailsFileWriter {
    /// Write into `root_path`, or the system temp dir when `None`
    pub fn new(root_path: Option<PathBuf>) -> Self {
        Self {
            root_path: root_path.unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl TailsWriter for TailsFileWriter {
    fn write(&mut self, generator: &mut TailsGenerator) -> CredxResult<(String, String)> {
        fs::create_dir_all(&self.root_path)?;
        let tmp_path = self
            .root_path
            .join(format!(".tails-{:016x}.tmp", rand::random::<u64>()));
        let mut hasher = Sha256::new();
        {
            let mut out = BufWriter::new(File::create(&tmp_path)?);
            out.write_all(&TAILS_BLOB_TAG)?;
            hasher.update(TAILS_BLOB_TAG);
            for tail in generator {
                let bytes = tail.to_bytes();
                out.write_all(&bytes)?;
                hasher.update(bytes);
            }
            out.flush()?;
        }
        let hash = bs58::encode(hasher.finalize()).into_string();
        let path = self.root_path.join(&hash);
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        let location = path.to_string_lossy().into_owned();
        debug!("wrote tails file {}", location);
        Ok((location, hash))
    }
}

/// Keeps tails in memory
#[derive(Clone, Debug, Default)]
pub struct TailsMemoryWriter {
    blob: Vec<u8>,
}

impl TailsMemoryWriter {
    /// An empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader over what was written
    pub fn reader(&self) -> TailsMemoryReader {
        TailsMemoryReader {
            blob: self.blob.clone(),
        }
    }
}

impl TailsWriter for TailsMemoryWriter {
    fn write(&mut self, generator: &mut TailsGenerator) -> CredxResult<(String, String)> {
        let mut blob = Vec::with_capacity(TAILS_BLOB_TAG.len() + TailsGenerator::count(generator) as usize * TAIL_SIZE);
        blob.extend_from_slice(&TAILS_BLOB_TAG);
        for tail in generator {
            blob.extend_from_slice(&tail.to_bytes());
        }
        let hash = bs58::encode(Sha256::digest(&blob)).into_string();
        self.blob = blob;
        Ok(("memory".to_string(), hash))
    }
}

fn tail_offset(tail_id: u32) -> usize {
    TAILS_BLOB_TAG.len() + tail_id as usize * TAIL_SIZE
}

/// Random access reader over a tails file.
/// The handle is locked for each seek and read so one reader can be shared
/// across threads.
#[derive(Debug)]
pub struct TailsFileReader {
    path: PathBuf,
    file: Mutex<File>,
}

impl TailsFileReader {
    /// Open a tails file, checking its hash when one is given
    pub fn open(path: impl AsRef<Path>, expected_hash: Option<&str>) -> CredxResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        if let Some(expected) = expected_hash {
            let mut hasher = Sha256::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            let hash = bs58::encode(hasher.finalize()).into_string();
            if hash != expected {
                return Err(err_msg!(
                    InvalidState,
                    "Tails file hash {} does not match {}",
                    hash,
                    expected
                ));
            }
            trace!("tails file {} hash verified", path.display());
        }
        file.seek(SeekFrom::Start(0))?;
        let mut tag = [0u8; 2];
        file.read_exact(&mut tag)?;
        if tag != TAILS_BLOB_TAG {
            return Err(err_msg!(InvalidState, "Unsupported tails file version {:?}", tag));
        }
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// The path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RevocationTailsAccessor for TailsFileReader {
    fn access_tail(&self, tail_id: u32) -> CredxResult<Tail> {
        let mut buf = [0u8; TAIL_SIZE];
        {
            let mut file = self
                .file
                .lock()
                .map_err(|_| err_msg!(Unexpected, "Tails file lock poisoned"))?;
            file.seek(SeekFrom::Start(tail_offset(tail_id) as u64))?;
            file.read_exact(&mut buf)?;
        }
        Tail::from_bytes(&buf)
    }
}

/// Reader over an in-memory tails blob
#[derive(Clone, Debug)]
pub struct TailsMemoryReader {
    blob: Vec<u8>,
}

impl TailsMemoryReader {
    /// Wrap a blob produced by [`TailsMemoryWriter`] or read from elsewhere
    pub fn new(blob: Vec<u8>) -> CredxResult<Self> {
        if blob.len() < TAILS_BLOB_TAG.len() || blob[..2] != TAILS_BLOB_TAG {
            return Err(err_msg!("Not a tails blob"));
        }
        Ok(Self { blob })
    }
}

impl RevocationTailsAccessor for TailsMemoryReader {
    fn access_tail(&self, tail_id: u32) -> CredxResult<Tail> {
        let start = tail_offset(tail_id);
        let bytes = self
            .blob
            .get(start..start + TAIL_SIZE)
            .ok_or_else(|| err_msg!(IOError, "Tail {} is past the end of the blob", tail_id))?;
        Tail::from_bytes(bytes)
    }
}

/// Either kind of tails reader
#[derive(Debug)]
pub enum TailsReader {
    /// Backed by a file
    File(TailsFileReader),
    /// Backed by memory
    Memory(TailsMemoryReader),
}

impl TailsReader {
    /// Open the tails file a registry definition points at, checking its hash
    pub fn for_definition(rev_reg_def: &RevocationRegistryDefinition) -> CredxResult<Self> {
        Ok(Self::File(TailsFileReader::open(
            &rev_reg_def.value.tails_location,
            Some(&rev_reg_def.value.tails_hash),
        )?))
    }
}

impl From<TailsFileReader> for TailsReader {
    fn from(r: TailsFileReader) -> Self {
        Self::File(r)
    }
}

impl From<TailsMemoryReader> for TailsReader {
    fn from(r: TailsMemoryReader) -> Self {
        Self::Memory(r)
    }
}

impl RevocationTailsAccessor for TailsReader {
    fn access_tail(&self, tail_id: u32) -> CredxResult<Tail> {
        match self {
            Self::File(f) => f.access_tail(tail_id),
            Self::Memory(m) => m.access_tail(tail_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knox::accumulator::cks::{CredentialRevocationPublicKey, RevocationKeyPublic};
    use blsful::inner_types::G2Projective;

    fn generator(max: u32) -> TailsGenerator {
        let (pk, _) = CredentialRevocationPublicKey::generate();
        let (_, key) = RevocationKeyPublic::generate(&pk, max);
        TailsGenerator::new(pk.g_dash, &key, max)
    }

    #[test]
    fn file_and_memory_agree() {
        let mut gen = generator(5);
        let expected = gen.clone().collect::<Vec<_>>();

        let dir = std::env::temp_dir().join(format!("credx-tails-{:x}", rand::random::<u64>()));
        let mut file_writer = TailsFileWriter::new(Some(dir.clone()));
        let (location, hash) = file_writer.write(&mut gen.clone()).unwrap();
        assert!(location.ends_with(&hash));

        let mut memory = TailsMemoryWriter::new();
        let (_, memory_hash) = memory.write(&mut gen).unwrap();
        assert_eq!(hash, memory_hash);

        let file_reader = TailsFileReader::open(&location, Some(&hash)).unwrap();
        let memory_reader = memory.reader();
        for (i, tail) in expected.iter().enumerate() {
            assert_eq!(file_reader.access_tail(i as u32).unwrap(), *tail);
            assert_eq!(memory_reader.access_tail(i as u32).unwrap(), *tail);
        }
        assert_eq!(memory_reader.access_tail(6).unwrap().0, G2Projective::IDENTITY);
        assert!(memory_reader.access_tail(11).is_err());

        let err = TailsFileReader::open(&location, Some("bogus")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidState);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn shared_file_reader_across_threads() {
        let mut gen = generator(32);
        let expected = gen.clone().collect::<Vec<_>>();
        let dir = std::env::temp_dir().join(format!("credx-tails-{:x}", rand::random::<u64>()));
        let (location, hash) = TailsFileWriter::new(Some(dir.clone()))
            .write(&mut gen)
            .unwrap();
        let reader = TailsFileReader::open(&location, Some(&hash)).unwrap();

        let wrong = std::thread::scope(|s| {
            let handles = (0..8u32)
                .map(|t| {
                    let reader = &reader;
                    let expected = &expected;
                    s.spawn(move || {
                        let mut wrong = 0usize;
                        for i in 0..1000u32 {
                            let id = (i * 7 + t * 5) % expected.len() as u32;
                            if reader.access_tail(id).unwrap() != expected[id as usize] {
                                wrong += 1;
                            }
                        }
                        wrong
                    })
                })
                .collect::<Vec<_>>();
            handles.into_iter().map(|h| h.join().unwrap()).sum::<usize>()
        });
        assert_eq!(wrong, 0);
        let _ = fs::remove_dir_all(dir);
    }
}
