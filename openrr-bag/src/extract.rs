use std::path::Path;

use tracing::{debug, trace, warn};

use crate::{
    deserialize_message, storage::CDR_SERIALIZATION_FORMAT, BagMessage, ConverterOptions, Error,
    ExtractedSeries, JointState, Result, SequentialReader, StorageFilter, StorageOptions,
    TopicMetadata, SQLITE3_STORAGE_ID,
};

pub const JOINT_STATES_TOPIC: &str = "/joint_states";

const NANOS_PER_SEC: f64 = 1e9;

/// Extracts the position and velocity of `joint_name` from the bag at `log_path`.
///
/// This reads `/joint_states` from a `sqlite3` bag serialized as `cdr`. Use
/// [`Extractor`] for other settings.
pub fn extract(log_path: impl AsRef<Path>, joint_name: &str) -> Result<ExtractedSeries> {
    Extractor::new(joint_name).extract(log_path)
}

/// Extracts the time series of one joint from the joint state records of a bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    joint_name: String,
    topic: String,
    storage_id: String,
    serialization_format: String,
}

impl Extractor {
    pub fn new(joint_name: impl Into<String>) -> Self {
        Self {
            joint_name: joint_name.into(),
            topic: JOINT_STATES_TOPIC.to_owned(),
            storage_id: SQLITE3_STORAGE_ID.to_owned(),
            serialization_format: CDR_SERIALIZATION_FORMAT.to_owned(),
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn storage_id(mut self, storage_id: impl Into<String>) -> Self {
        self.storage_id = storage_id.into();
        self
    }

    pub fn serialization_format(mut self, serialization_format: impl Into<String>) -> Self {
        self.serialization_format = serialization_format.into();
        self
    }

    pub fn joint_name(&self) -> &str {
        &self.joint_name
    }

    /// Opens the bag at `log_path` and extracts the series from it.
    pub fn extract(&self, log_path: impl AsRef<Path>) -> Result<ExtractedSeries> {
        let storage = StorageOptions {
            uri: log_path.as_ref().to_owned(),
            storage_id: self.storage_id.clone(),
        };
        let converter = ConverterOptions {
            input_serialization_format: self.serialization_format.clone(),
            output_serialization_format: self.serialization_format.clone(),
        };
        let mut reader = SequentialReader::open(&storage, &converter)?;
        let topics = reader.topics().to_vec();
        reader.set_filter(StorageFilter {
            topics: vec![self.topic.clone()],
        });
        self.extract_from(reader, &topics)
    }

    /// Extracts the series from `records`, which must be in storage order.
    ///
    /// `topics` provides the message type of each topic. The first record
    /// containing the joint fixes the time origin. Any error aborts the
    /// extraction.
    pub fn extract_from<I>(&self, records: I, topics: &[TopicMetadata]) -> Result<ExtractedSeries>
    where
        I: IntoIterator<Item = Result<BagMessage>>,
    {
        let type_name = topics
            .iter()
            .find(|t| t.name == self.topic)
            .map(|t| t.type_name.as_str());

        let mut series = ExtractedSeries::default();
        let mut origin: Option<i64> = None;
        for record in records {
            let record = record?;
            if record.topic != self.topic {
                continue;
            }
            let type_name = type_name.ok_or_else(|| Error::Decode {
                topic: record.topic.clone(),
                type_name: String::new(),
                message: "topic has no type information".to_owned(),
            })?;
            let msg: JointState = deserialize_message(&record.topic, type_name, &record.data)?;

            // The index is resolved for every record since the order of names may change.
            let Some(index) = msg.joint_index(&self.joint_name) else {
                trace!(timestamp = record.timestamp, names = ?msg.name, "joint not in record");
                continue;
            };
            let (Some(&position), Some(&velocity)) =
                (msg.position.get(index), msg.velocity.get(index))
            else {
                return Err(Error::LengthMismatch {
                    joint_name: self.joint_name.clone(),
                    index,
                    position: msg.position.len(),
                    velocity: msg.velocity.len(),
                });
            };

            let t0 = *origin.get_or_insert(record.timestamp);
            // i128 since timestamps of a split bag may be far apart.
            let t = (i128::from(record.timestamp) - i128::from(t0)) as f64 / NANOS_PER_SEC;
            trace!(t, position, velocity, "extracted");
            series.push(t, position, velocity);
        }

        if series.is_empty() {
            warn!(joint_name = %self.joint_name, topic = %self.topic, "no record contains the joint");
        } else {
            debug!(
                joint_name = %self.joint_name,
                len = series.len(),
                duration = series.duration(),
                "extracted series"
            );
        }
        Ok(series)
    }
}
