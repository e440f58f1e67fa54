// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use digest::{Digest, Output};
use log::debug;
use sha2::Sha256;

use std::{
    ffi::OsString,
    fs::File,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

/// Images are fed to the hasher in blocks of this size
const CHUNK_SIZE: usize = 4096;

/// Suffix of the file holding the image digest from before signing
pub const SIDECAR_SUFFIX: &str = ".sha256sum";

/// Streams the file at `path` through the digest `D`
pub fn file_digest<D: Digest + Write>(path: &Path) -> Result<Output<D>> {
    let file = File::open(path)
        .with_context(|| format!("could not open image {}", path.display()))?;

    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = D::new();
    io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("could not read image {}", path.display()))?;
    Ok(hasher.finalize())
}

/// SHA-256 of the file contents as a lowercase hex string
pub fn sha256_hex(path: &Path) -> Result<String> {
    Ok(hex::encode(file_digest::<Sha256>(path)?))
}

/// Returns the sidecar location for `image`
///
/// The suffix is appended to the full file name, so `owrt.bin` maps to
/// `owrt.bin.sha256sum` rather than replacing `.bin`.
pub fn sidecar_path(image: &Path) -> PathBuf {
    let mut name = OsString::from(image.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Picks the digest of the image as it was before signing
///
/// Falls back to `signed` when the build left no sidecar behind. The sidecar
/// text is taken verbatim once trimmed; it is not checked to be a digest.
pub fn unsigned_sha256(image: &Path, signed: &str) -> Result<String> {
    let sidecar = sidecar_path(image);
    if !sidecar.exists() {
        return Ok(signed.to_owned());
    }

    debug!("using unsigned digest from {}", sidecar.display());
    let text = std::fs::read_to_string(&sidecar).with_context(|| {
        format!("could not read sidecar {}", sidecar.display())
    })?;
    Ok(text.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // sha256 of the empty string and of "abc"
    const EMPTY: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC: &str =
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn known_digests() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.bin");
        let abc = dir.path().join("abc.bin");
        fs::write(&empty, b"").unwrap();
        fs::write(&abc, b"abc").unwrap();

        assert_eq!(sha256_hex(&empty).unwrap(), EMPTY);
        assert_eq!(sha256_hex(&abc).unwrap(), ABC);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        // Deliberately not a multiple of the chunk size
        let data: Vec<u8> =
            (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let expected = hex::encode(Sha256::digest(&data));
        assert_eq!(sha256_hex(&path).unwrap(), expected);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha256_hex(&dir.path().join("nope.bin")).unwrap_err();
        assert!(err.to_string().contains("nope.bin"));
    }

    #[test]
    fn sidecar_keeps_existing_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/bin/targets/x86/64/img.tar.gz")),
            Path::new("/bin/targets/x86/64/img.tar.gz.sha256sum")
        );
        assert_eq!(
            sidecar_path(Path::new("sysupgrade")),
            Path::new("sysupgrade.sha256sum")
        );
    }

    #[test]
    fn unsigned_defaults_to_signed() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("image.bin");
        fs::write(&image, b"abc").unwrap();

        assert_eq!(unsigned_sha256(&image, ABC).unwrap(), ABC);
    }

    #[test]
    fn unsigned_from_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("image.bin");
        fs::write(&image, b"abc").unwrap();
        fs::write(dir.path().join("image.bin.sha256sum"), "  not-a-hash\n")
            .unwrap();

        assert_eq!(unsigned_sha256(&image, ABC).unwrap(), "not-a-hash");
    }
}
