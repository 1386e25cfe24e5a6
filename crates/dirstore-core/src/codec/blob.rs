//! Blob codec: generic object serialization via JSON.
//!
//! Values stored under the `object` data-kind pass through `serde_json`,
//! which round-trips arbitrary nested value graphs losslessly (numbers use
//! shortest-representation printing, so floats survive exactly).

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use snafu::ResultExt;

use super::{CodecResult, IoSnafu, JsonSnafu};

/// Serialize `value` to a JSON file at `path`, replacing any existing file.
pub fn write(path: &Path, value: &serde_json::Value) -> CodecResult<()> {
    let display = path.display().to_string();
    let file = File::create(path).context(IoSnafu { path: &display })?;
    serde_json::to_writer(BufWriter::new(file), value).context(JsonSnafu { path: &display })
}

/// Deserialize the JSON file at `path` back into a dynamic value.
pub fn read(path: &Path) -> CodecResult<serde_json::Value> {
    let display = path.display().to_string();
    let file = File::open(path).context(IoSnafu { path: &display })?;
    serde_json::from_reader(BufReader::new(file)).context(JsonSnafu { path: &display })
}
