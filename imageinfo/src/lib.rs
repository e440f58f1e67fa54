// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-image metadata for firmware update clients
//!
//! The build system describes each image it produces through environment
//! variables. [`BuildEnv`] captures them, and [`ImageDescriptor`] turns them
//! plus the image on disk into the JSON document that update clients use to
//! find images, verify their checksums and check size limits.

pub mod checksum;
pub mod config;
pub mod descriptor;
pub mod size;
pub mod titles;

pub use config::{BuildEnv, ConfigError};
pub use descriptor::ImageDescriptor;
pub use size::{parse_size, SizeError};
pub use titles::Title;
