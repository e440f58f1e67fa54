// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use serde_json::ser::Formatter;

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::Path,
};

use crate::{
    checksum,
    config::{BuildEnv, FileSizeLimits},
    titles::{assemble_titles, Title},
};

/// Version of the layout below, bumped on incompatible changes
pub const METADATA_VERSION: u32 = 1;

/// Profile key used when `DEVICE_ID` is unset, as a JSON encoder renders a
/// null object key
const NULL_DEVICE_ID: &str = "null";

/// Metadata for one built image, as consumed by update clients
#[derive(Debug, Clone, Serialize)]
pub struct ImageDescriptor {
    pub metadata_version: u32,
    pub target: String,
    pub version_code: Option<String>,
    pub version_number: Option<String>,
    pub source_date_epoch: i64,
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub image_prefix: Option<String>,
    pub images: Vec<Image>,
    pub device_packages: Vec<String>,
    pub supported_devices: Vec<String>,
    pub titles: Vec<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_limits: Option<SizeLimits>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub sha256: String,
    pub sha256_unsigned: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SizeLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<u64>,
}

impl From<FileSizeLimits> for SizeLimits {
    fn from(l: FileSizeLimits) -> Self {
        Self {
            image: l.image,
            kernel: l.kernel,
        }
    }
}

impl ImageDescriptor {
    /// Builds the descriptor for the image at `image_path`
    pub fn generate(env: &BuildEnv, image_path: &Path) -> Result<Self> {
        let sha256 = checksum::sha256_hex(image_path)?;
        let sha256_unsigned = checksum::unsigned_sha256(image_path, &sha256)?;
        debug!("{}: sha256 {sha256}", image_path.display());

        let size = fs::metadata(image_path)
            .with_context(|| {
                format!("could not stat image {}", image_path.display())
            })?
            .len();

        let image = Image {
            kind: env.file_type.clone(),
            name: env.file_name_lossy(),
            sha256,
            sha256_unsigned,
            size,
            filesystem: env.filesystem().map(str::to_owned),
        };

        let profile = Profile {
            image_prefix: env.device_img_prefix.clone(),
            images: vec![image],
            device_packages: env.device_packages()?,
            supported_devices: env.supported_devices()?,
            titles: assemble_titles(env),
            file_size_limits: env.file_size_limits()?.map(SizeLimits::from),
        };

        let device_id = env
            .device_id
            .clone()
            .unwrap_or_else(|| NULL_DEVICE_ID.to_owned());

        Ok(Self {
            metadata_version: METADATA_VERSION,
            target: env.target(),
            version_code: env.version_code.clone(),
            version_number: env.version_number.clone(),
            source_date_epoch: env.source_date_epoch()?,
            profiles: BTreeMap::from([(device_id, profile)]),
        })
    }

    /// Compact JSON with every non-ASCII character escaped
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut out = vec![];
        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
        self.serialize(&mut ser)
            .context("could not serialize image descriptor")?;
        Ok(out)
    }

    /// Writes the descriptor to `path`, replacing any existing file
    ///
    /// An existing file (or the target of a symlink) is truncated and
    /// rewritten in place, keeping its inode and permissions.
    pub fn write(&self, path: &Path) -> Result<()> {
        let payload = self.to_json()?;
        fs::write(path, payload)
            .with_context(|| format!("could not write {}", path.display()))
    }
}

/// Compact formatter that escapes everything outside printable ASCII as
/// `\uXXXX`, using surrogate pairs above the BMP
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(|b| (b' '..=b'~').contains(&b)) {
            return writer.write_all(fragment.as_bytes());
        }
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
