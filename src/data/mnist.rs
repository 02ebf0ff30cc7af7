// ============================================================
// Layer 4 — MNIST Source
// ============================================================
// Loads the canonical MNIST split from the four IDX files:
//
//   train-images-idx3-ubyte   60,000 × 28 × 28 bytes
//   train-labels-idx1-ubyte   60,000 bytes
//   t10k-images-idx3-ubyte    10,000 × 28 × 28 bytes
//   t10k-labels-idx1-ubyte    10,000 bytes
//
// Files live in a cache directory. Missing files are fetched
// from the CVDF mirror as .gz, decompressed, and written
// atomically (write to .part, then rename).
//
// IDX layout (all integers big-endian u32):
//   images: magic 2051 | count | rows | cols | pixels...
//   labels: magic 2049 | count | labels...
//
// Reference: http://yann.lecun.com/exdb/mnist/ (file format)

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;

use crate::domain::digit::{DigitSplits, RawDigit, IMAGE_PIXELS, IMAGE_SIDE, NUM_CLASSES};
use crate::domain::error::{DigitError, DigitResult};
use crate::domain::traits::DigitSource;

// CVDF mirror of http://yann.lecun.com/exdb/mnist/
pub const DEFAULT_MIRROR: &str = "https://storage.googleapis.com/cvdf-datasets/mnist/";

const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES:  &str = "t10k-images-idx3-ubyte";
const TEST_LABELS:  &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

pub struct MnistSource {
    cache_dir: PathBuf,
    mirror:    String,
    download:  bool,
}

impl MnistSource {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            mirror:    DEFAULT_MIRROR.to_string(),
            download:  true,
        }
    }

    /// `<user cache dir>/lenet-digits/mnist`
    pub fn default_cache_dir() -> DigitResult<PathBuf> {
        dirs::cache_dir()
            .map(|dir| dir.join("lenet-digits").join("mnist"))
            .ok_or_else(|| DigitError::dataset("no user cache directory on this platform"))
    }

    pub fn with_mirror(mut self, mirror: impl Into<String>) -> Self {
        let mut mirror = mirror.into();
        if !mirror.ends_with('/') {
            mirror.push('/');
        }
        self.mirror = mirror;
        self
    }

    /// Never touch the network; missing files become errors.
    pub fn offline(mut self) -> Self {
        self.download = false;
        self
    }

    fn read_split(&self, images_name: &str, labels_name: &str) -> DigitResult<Vec<RawDigit>> {
        let images = parse_images(&self.read_file(images_name)?)?;
        let labels = parse_labels(&self.read_file(labels_name)?)?;

        if images.len() != labels.len() {
            return Err(DigitError::dataset(format!(
                "{images_name} holds {} images but {labels_name} holds {} labels",
                images.len(),
                labels.len(),
            )));
        }

        Ok(images
            .into_iter()
            .zip(labels)
            .map(|(pixels, label)| RawDigit::new(pixels, label))
            .collect())
    }

    fn read_file(&self, name: &str) -> DigitResult<Vec<u8>> {
        let path = self.cache_dir.join(name);

        if !path.exists() {
            if !self.download {
                return Err(DigitError::dataset(format!(
                    "'{}' is missing and downloads are disabled",
                    path.display()
                )));
            }
            self.download_file(name, &path)?;
        }

        fs::read(&path)
            .map_err(|e| DigitError::dataset(format!("cannot read '{}': {e}", path.display())))
    }

    fn download_file(&self, name: &str, dest: &Path) -> DigitResult<()> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| {
            DigitError::dataset(format!("cannot create '{}': {e}", self.cache_dir.display()))
        })?;

        let url = format!("{}{name}.gz", self.mirror);
        tracing::info!("Downloading {}", url);

        let compressed = reqwest::blocking::get(&url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|e| DigitError::dataset(format!("GET {url}: {e}")))?;

        let mut raw = Vec::new();
        GzDecoder::new(&compressed[..])
            .read_to_end(&mut raw)
            .map_err(|e| DigitError::dataset(format!("cannot decompress {name}.gz: {e}")))?;

        let partial = dest.with_extension("part");
        fs::write(&partial, &raw)
            .and_then(|_| fs::rename(&partial, dest))
            .map_err(|e| DigitError::dataset(format!("cannot write '{}': {e}", dest.display())))?;

        tracing::debug!("Cached {} ({} bytes)", dest.display(), raw.len());
        Ok(())
    }
}

impl DigitSource for MnistSource {
    fn name(&self) -> &str {
        "mnist"
    }

    fn load(&self) -> DigitResult<DigitSplits> {
        tracing::info!("Loading MNIST from '{}'", self.cache_dir.display());
        let train = self.read_split(TRAIN_IMAGES, TRAIN_LABELS)?;
        let test  = self.read_split(TEST_IMAGES, TEST_LABELS)?;
        Ok(DigitSplits::new(train, test))
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> DigitResult<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|slice| <[u8; 4]>::try_from(slice).ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| DigitError::dataset("truncated IDX header"))
}

/// Parse an IDX3 image file into one 784-byte Vec per image.
pub fn parse_images(bytes: &[u8]) -> DigitResult<Vec<Vec<u8>>> {
    let magic = read_u32(bytes, 0)?;
    if magic != IMAGES_MAGIC {
        return Err(DigitError::dataset(format!(
            "bad image file magic {magic}, expected {IMAGES_MAGIC}"
        )));
    }

    let count = read_u32(bytes, 4)? as usize;
    let rows  = read_u32(bytes, 8)? as usize;
    let cols  = read_u32(bytes, 12)? as usize;
    if rows != IMAGE_SIDE || cols != IMAGE_SIDE {
        return Err(DigitError::dataset(format!(
            "images are {rows}x{cols}, expected {IMAGE_SIDE}x{IMAGE_SIDE}"
        )));
    }

    let body = &bytes[16..];
    if body.len() < count * IMAGE_PIXELS {
        return Err(DigitError::dataset(format!(
            "image file declares {count} images but holds {} bytes",
            body.len()
        )));
    }

    Ok(body[..count * IMAGE_PIXELS]
        .chunks(IMAGE_PIXELS)
        .map(|chunk| chunk.to_vec())
        .collect())
}

/// Parse an IDX1 label file.
pub fn parse_labels(bytes: &[u8]) -> DigitResult<Vec<u8>> {
    let magic = read_u32(bytes, 0)?;
    if magic != LABELS_MAGIC {
        return Err(DigitError::dataset(format!(
            "bad label file magic {magic}, expected {LABELS_MAGIC}"
        )));
    }

    let count = read_u32(bytes, 4)? as usize;
    let body  = &bytes[8..];
    if body.len() < count {
        return Err(DigitError::dataset(format!(
            "label file declares {count} labels but holds {} bytes",
            body.len()
        )));
    }

    let labels = body[..count].to_vec();
    if let Some(bad) = labels.iter().find(|&&l| l as usize >= NUM_CLASSES) {
        return Err(DigitError::dataset(format!("label {bad} is out of range")));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_images(images: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
        out.extend_from_slice(&(images.len() as u32).to_be_bytes());
        out.extend_from_slice(&(IMAGE_SIDE as u32).to_be_bytes());
        out.extend_from_slice(&(IMAGE_SIDE as u32).to_be_bytes());
        for image in images {
            out.extend_from_slice(image);
        }
        out
    }

    fn idx_labels(labels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
        out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        out.extend_from_slice(labels);
        out
    }

    fn write_fixture(dir: &Path, train: usize, test: usize) {
        let images = |n: usize| (0..n).map(|i| vec![i as u8; IMAGE_PIXELS]).collect::<Vec<_>>();
        let labels = |n: usize| (0..n).map(|i| (i % 10) as u8).collect::<Vec<_>>();
        fs::write(dir.join(TRAIN_IMAGES), idx_images(&images(train))).unwrap();
        fs::write(dir.join(TRAIN_LABELS), idx_labels(&labels(train))).unwrap();
        fs::write(dir.join(TEST_IMAGES),  idx_images(&images(test))).unwrap();
        fs::write(dir.join(TEST_LABELS),  idx_labels(&labels(test))).unwrap();
    }

    #[test]
    fn test_loads_cached_idx_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 12, 5);

        let splits = MnistSource::new(dir.path()).offline().load().unwrap();
        assert_eq!(splits.train.len(), 12);
        assert_eq!(splits.test.len(), 5);
        assert_eq!(splits.train[3].pixels, vec![3u8; IMAGE_PIXELS]);
        assert_eq!(splits.train[11].label, 1);
    }

    #[test]
    fn test_missing_files_offline() {
        let dir = tempfile::tempdir().unwrap();
        let err = MnistSource::new(dir.path()).offline().load().unwrap_err();
        assert!(matches!(err, DigitError::DatasetUnavailable { .. }));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = idx_labels(&[1, 2, 3]);
        bytes[3] = 0xFF;
        assert!(parse_labels(&bytes).is_err());
        assert!(parse_images(&bytes).is_err());
    }

    #[test]
    fn test_rejects_truncated_body() {
        let mut bytes = idx_images(&[vec![0; IMAGE_PIXELS], vec![0; IMAGE_PIXELS]]);
        bytes.truncate(bytes.len() - 10);
        assert!(parse_images(&bytes).is_err());
        assert!(parse_images(&[0, 0]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_label() {
        assert!(parse_labels(&idx_labels(&[0, 9, 10])).is_err());
    }

    #[test]
    fn test_count_mismatch_between_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 4, 4);
        fs::write(dir.path().join(TEST_LABELS), idx_labels(&[1, 2])).unwrap();

        let err = MnistSource::new(dir.path()).offline().load().unwrap_err();
        assert!(format!("{err}").contains("4 images but"));
    }

    #[test]
    fn test_mirror_gets_trailing_slash() {
        let source = MnistSource::new("/tmp/x").with_mirror("http://localhost:9/mnist");
        assert_eq!(source.mirror, "http://localhost:9/mnist/");
    }
}
