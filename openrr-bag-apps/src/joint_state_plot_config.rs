use std::path::Path;

use fs_err as fs;
use openrr_bag::{Column, Extractor, JOINT_STATES_TOPIC, SQLITE3_STORAGE_ID};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

fn default_joint_name() -> String {
    "joint_1".to_owned()
}

fn default_topic() -> String {
    JOINT_STATES_TOPIC.to_owned()
}

fn default_storage_id() -> String {
    SQLITE3_STORAGE_ID.to_owned()
}

fn default_serialization_format() -> String {
    "cdr".to_owned()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct JointStatePlotConfig {
    /// Name of the joint to plot.
    #[serde(default = "default_joint_name")]
    pub joint_name: String,
    /// Topic of `sensor_msgs/msg/JointState` records.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Storage plugin the bag was recorded with. Only `sqlite3` is supported.
    #[serde(default = "default_storage_id")]
    pub storage_id: String,
    /// Serialization format of the records. Only `cdr` is supported.
    #[serde(default = "default_serialization_format")]
    pub serialization_format: String,
    /// Column plotted against the timestamp.
    #[serde(default)]
    pub column: Column,
}

impl Default for JointStatePlotConfig {
    fn default() -> Self {
        Self {
            joint_name: default_joint_name(),
            topic: default_topic(),
            storage_id: default_storage_id(),
            serialization_format: default_serialization_format(),
            column: Column::default(),
        }
    }
}

impl JointStatePlotConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        Self::from_str(
            &fs::read_to_string(path).map_err(|e| Error::NoFile(path.to_owned(), e))?,
            path,
        )
    }

    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::new(&self.joint_name)
            .topic(&self.topic)
            .storage_id(&self.storage_id)
            .serialization_format(&self.serialization_format)
    }
}
