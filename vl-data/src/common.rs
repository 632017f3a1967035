pub use anyhow::{bail, ensure, format_err, Context as _, Result};
pub use bbox::{prelude::*, HW, TLBR_};
pub use getset::CopyGetters;
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::{izip, Itertools as _};
pub use log::{debug, info, warn};
pub use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt::Debug,
    fs,
    iter,
    path::{Path, PathBuf},
    sync::Arc,
};
