//! Common imports from external crates.

pub use anyhow::{ensure, format_err, Context, Result};
pub use log::{debug, info};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fs::{self, File},
    io::{prelude::*, BufReader, BufWriter},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};
