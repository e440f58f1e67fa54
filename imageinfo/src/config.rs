// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{ffi::OsString, num::ParseIntError, path::PathBuf};

use thiserror::Error;

use crate::size::{parse_size, SizeError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("SOURCE_DATE_EPOCH {value:?} is not an integer")]
    BadEpoch {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("could not parse {var}")]
    BadSize {
        var: &'static str,
        #[source]
        source: SizeError,
    },
}

/// Prefixes of the alternative device title variables, in output order
pub const TITLE_PREFIXES: [&str; 7] =
    ["", "ALT0_", "ALT1_", "ALT2_", "ALT3_", "ALT4_", "ALT5_"];

/// One `DEVICE_<PREFIX>{VENDOR,MODEL,VARIANT}` triple
///
/// Empty values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleVars {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
}

impl TitleVars {
    pub fn is_empty(&self) -> bool {
        self.vendor.is_none() && self.model.is_none() && self.variant.is_none()
    }
}

/// Image size limits, both optional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSizeLimits {
    pub image: Option<u64>,
    pub kernel: Option<u64>,
}

/// Everything the build system hands us through the environment
///
/// Values are kept as captured; parsing happens in the accessors, so a
/// variable that is never needed is never validated.
#[derive(Debug, Clone, Default)]
pub struct BuildEnv {
    pub file_dir: Option<OsString>,
    pub file_name: Option<OsString>,
    pub file_type: Option<String>,
    pub file_filesystem: Option<String>,

    pub target: Option<String>,
    pub subtarget: Option<String>,
    pub version_code: Option<String>,
    pub version_number: Option<String>,
    pub source_date_epoch: Option<String>,

    pub device_id: Option<String>,
    pub device_img_prefix: Option<String>,
    pub device_packages: Option<String>,
    pub supported_devices: Option<String>,
    pub device_title: Option<String>,
    pub titles: [TitleVars; 7],

    pub image_size: Option<String>,
    pub kernel_size: Option<String>,
}

impl BuildEnv {
    /// Captures the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Captures variables through an arbitrary lookup function
    ///
    /// `FILE_DIR` and `FILE_NAME` are kept as raw OS strings; any other
    /// variable that isn't valid unicode is treated as unset.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<OsString>,
    {
        let file_dir = lookup("FILE_DIR");
        let file_name = lookup("FILE_NAME");

        let mut text =
            |name: &str| lookup(name).and_then(|v| v.into_string().ok());
        // Optional switches count as unset when empty
        let mut nonempty = |name: &str| text(name).filter(|v| !v.is_empty());

        let mut titles: [TitleVars; 7] = Default::default();
        for (prefix, title) in TITLE_PREFIXES.iter().zip(titles.iter_mut()) {
            title.vendor = nonempty(&format!("DEVICE_{prefix}VENDOR"));
            title.model = nonempty(&format!("DEVICE_{prefix}MODEL"));
            title.variant = nonempty(&format!("DEVICE_{prefix}VARIANT"));
        }
        let file_filesystem = nonempty("FILE_FILESYSTEM");
        let image_size = nonempty("IMAGE_SIZE");
        let kernel_size = nonempty("KERNEL_SIZE");

        Self {
            file_dir,
            file_name,
            file_type: text("FILE_TYPE"),
            file_filesystem,
            target: text("TARGET"),
            subtarget: text("SUBTARGET"),
            version_code: text("VERSION_CODE"),
            version_number: text("VERSION_NUMBER"),
            source_date_epoch: text("SOURCE_DATE_EPOCH"),
            device_id: text("DEVICE_ID"),
            device_img_prefix: text("DEVICE_IMG_PREFIX"),
            device_packages: text("DEVICE_PACKAGES"),
            supported_devices: text("SUPPORTED_DEVICES"),
            device_title: text("DEVICE_TITLE"),
            titles,
            image_size,
            kernel_size,
        }
    }

    /// Location of the image, `FILE_DIR/FILE_NAME`
    pub fn image_path(&self) -> Result<PathBuf, ConfigError> {
        let dir = self
            .file_dir
            .as_ref()
            .ok_or(ConfigError::Missing("FILE_DIR"))?;
        let name = self
            .file_name
            .as_ref()
            .ok_or(ConfigError::Missing("FILE_NAME"))?;
        Ok(PathBuf::from(dir).join(name))
    }

    /// `FILE_NAME` as it appears in the descriptor
    ///
    /// Bytes that aren't valid unicode are replaced with U+FFFD.
    pub fn file_name_lossy(&self) -> Option<String> {
        self.file_name
            .as_ref()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// `TARGET/SUBTARGET`, with unset halves left blank
    pub fn target(&self) -> String {
        format!(
            "{}/{}",
            self.target.as_deref().unwrap_or_default(),
            self.subtarget.as_deref().unwrap_or_default()
        )
    }

    pub fn source_date_epoch(&self) -> Result<i64, ConfigError> {
        let value = required("SOURCE_DATE_EPOCH", &self.source_date_epoch)?;
        value.trim().parse().map_err(|source| ConfigError::BadEpoch {
            value: value.to_owned(),
            source,
        })
    }

    pub fn device_packages(&self) -> Result<Vec<String>, ConfigError> {
        required("DEVICE_PACKAGES", &self.device_packages).map(split_words)
    }

    pub fn supported_devices(&self) -> Result<Vec<String>, ConfigError> {
        required("SUPPORTED_DEVICES", &self.supported_devices).map(split_words)
    }

    /// Size limits, if either `IMAGE_SIZE` or `KERNEL_SIZE` is given
    pub fn file_size_limits(
        &self,
    ) -> Result<Option<FileSizeLimits>, ConfigError> {
        if self.image_size.is_none() && self.kernel_size.is_none() {
            return Ok(None);
        }
        Ok(Some(FileSizeLimits {
            image: optional_size("IMAGE_SIZE", &self.image_size)?,
            kernel: optional_size("KERNEL_SIZE", &self.kernel_size)?,
        }))
    }

    pub fn filesystem(&self) -> Option<&str> {
        self.file_filesystem.as_deref()
    }
}

fn required<'a>(
    name: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(name))
}

fn split_words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_owned).collect()
}

fn optional_size(
    var: &'static str,
    value: &Option<String>,
) -> Result<Option<u64>, ConfigError> {
    value
        .as_deref()
        .map(|v| {
            parse_size(v).map_err(|source| ConfigError::BadSize { var, source })
        })
        .transpose()
}
