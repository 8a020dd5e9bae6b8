//! Sequential reader for bags recorded with the rosbag2 `sqlite3` storage plugin.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    path::{Path, PathBuf},
};

use fs_err as fs;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

pub const SQLITE3_STORAGE_ID: &str = "sqlite3";
pub const CDR_SERIALIZATION_FORMAT: &str = "cdr";
pub const METADATA_FILE_NAME: &str = "metadata.yaml";
const DATABASE_EXTENSION: &str = "db3";
// Number of rows fetched from the database per query.
const BATCH_SIZE: i64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Path to the bag directory or to a single `.db3` file.
    pub uri: PathBuf,
    pub storage_id: String,
}

impl StorageOptions {
    pub fn new(uri: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            storage_id: SQLITE3_STORAGE_ID.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    pub input_serialization_format: String,
    pub output_serialization_format: String,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            input_serialization_format: CDR_SERIALIZATION_FORMAT.to_owned(),
            output_serialization_format: CDR_SERIALIZATION_FORMAT.to_owned(),
        }
    }
}

/// Restricts the records returned by [`SequentialReader`]. An empty filter
/// lets every record through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageFilter {
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub serialization_format: String,
}

/// One record of the bag.
#[derive(Clone, PartialEq, Eq)]
pub struct BagMessage {
    pub topic: String,
    /// Serialized payload.
    pub data: Vec<u8>,
    /// Receive time in nanoseconds since the epoch.
    pub timestamp: i64,
}

impl fmt::Debug for BagMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BagMessage")
            .field("topic", &self.topic)
            .field("data_len", &self.data.len())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicInformation {
    pub topic_metadata: TopicMetadata,
    #[serde(default)]
    pub message_count: u64,
}

/// Contents of `metadata.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BagMetadata {
    #[serde(default)]
    pub version: u32,
    pub storage_identifier: String,
    #[serde(default)]
    pub relative_file_paths: Vec<PathBuf>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub topics_with_message_count: Vec<TopicInformation>,
}

#[derive(Deserialize)]
struct MetadataFile {
    rosbag2_bagfile_information: BagMetadata,
}

impl BagMetadata {
    pub fn from_str(s: &str, path: impl AsRef<Path>) -> Result<Self> {
        let file: MetadataFile =
            serde_yaml::from_str(s).map_err(|e| Error::Metadata(path.as_ref().to_owned(), e))?;
        Ok(file.rosbag2_bagfile_information)
    }

    pub fn read_dir(bag_dir: impl AsRef<Path>) -> Result<Self> {
        let path = bag_dir.as_ref().join(METADATA_FILE_NAME);
        let s = fs::read_to_string(&path).map_err(|e| Error::log_open(&path, e.to_string()))?;
        Self::from_str(&s, path)
    }
}

/// One `.db3` file of a bag.
struct Database {
    path: PathBuf,
    connection: Connection,
    topics: Vec<TopicMetadata>,
    topic_names: HashMap<i64, String>,
    // (timestamp, id) of the last row fetched from the database
    fetched: (i64, i64),
    // (timestamp, id) of the last row returned to the user
    delivered: (i64, i64),
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("topics", &self.topics)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

impl Database {
    fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::log_open(path, e.to_string()))?;

        let rows = {
            let mut stmt = connection
                .prepare("SELECT id, name, type, serialization_format FROM topics ORDER BY id")
                .map_err(|e| Error::log_open(path, e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        TopicMetadata {
                            name: row.get(1)?,
                            type_name: row.get(2)?,
                            serialization_format: row.get(3)?,
                        },
                    ))
                })
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| Error::log_open(path, e.to_string()))?;
            // Make sure the message table has the expected layout before reading from it.
            connection
                .prepare("SELECT id, topic_id, timestamp, data FROM messages LIMIT 0")
                .map_err(|e| Error::log_open(path, e.to_string()))?;
            rows
        };

        let topic_names = rows
            .iter()
            .map(|(id, topic)| (*id, topic.name.clone()))
            .collect();
        let topics = rows.into_iter().map(|(_, topic)| topic).collect();
        Ok(Self {
            path: path.to_owned(),
            connection,
            topics,
            topic_names,
            fetched: (i64::MIN, i64::MIN),
            delivered: (i64::MIN, i64::MIN),
        })
    }

    /// Fetches the next rows. Returns `None` once the database has no more
    /// rows; a returned batch may be empty if every fetched row was skipped.
    fn next_batch(&mut self, filter: &StorageFilter) -> Result<Option<Vec<(i64, BagMessage)>>> {
        let mut sql = String::from(
            "SELECT id, topic_id, timestamp, data FROM messages \
             WHERE (timestamp > ?1 OR (timestamp = ?1 AND id > ?2))",
        );
        if !filter.topics.is_empty() {
            let ids: Vec<_> = self
                .topic_names
                .iter()
                .filter(|(_, name)| filter.topics.contains(name))
                .map(|(id, _)| id.to_string())
                .collect();
            if ids.is_empty() {
                return Ok(None);
            }
            sql.push_str(&format!(" AND topic_id IN ({})", ids.join(", ")));
        }
        sql.push_str(" ORDER BY timestamp, id LIMIT ?3");

        let (timestamp, id) = self.fetched;
        let rows = {
            let mut stmt = self
                .connection
                .prepare_cached(&sql)
                .map_err(|e| Error::Read(self.path.clone(), e))?;
            let rows = stmt
                .query_map(params![timestamp, id, BATCH_SIZE], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                })
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| Error::Read(self.path.clone(), e))?;
            rows
        };

        if rows.is_empty() {
            return Ok(None);
        }
        let mut batch = Vec::with_capacity(rows.len());
        for (id, topic_id, timestamp, data) in rows {
            self.fetched = (timestamp, id);
            let Some(topic) = self.topic_names.get(&topic_id) else {
                warn!(path = ?self.path, id, topic_id, "skipping message with unknown topic id");
                continue;
            };
            batch.push((
                id,
                BagMessage {
                    topic: topic.clone(),
                    data,
                    timestamp,
                },
            ));
        }
        trace!(path = ?self.path, len = batch.len(), "fetched batch");
        Ok(Some(batch))
    }
}

/// Reads the records of a bag one by one in storage order.
///
/// Records are ordered by timestamp (ties broken by insertion order) within a
/// file, and the files of a split bag are read one after another. The reader
/// is forward-only; open a new one to read the bag again.
#[derive(Debug)]
pub struct SequentialReader {
    uri: PathBuf,
    metadata: Option<BagMetadata>,
    topics: Vec<TopicMetadata>,
    databases: VecDeque<Database>,
    buffer: VecDeque<(i64, BagMessage)>,
    filter: StorageFilter,
}

impl SequentialReader {
    pub fn open(storage: &StorageOptions, converter: &ConverterOptions) -> Result<Self> {
        let uri = &storage.uri;
        if storage.storage_id != SQLITE3_STORAGE_ID {
            return Err(Error::log_open(
                uri,
                format!("unsupported storage identifier {:?}", storage.storage_id),
            ));
        }
        if converter.output_serialization_format != CDR_SERIALIZATION_FORMAT {
            return Err(Error::log_open(
                uri,
                format!(
                    "unsupported serialization format {:?}",
                    converter.output_serialization_format
                ),
            ));
        }
        if converter.input_serialization_format != converter.output_serialization_format {
            return Err(Error::log_open(
                uri,
                format!(
                    "no converter from {:?} to {:?} is available",
                    converter.input_serialization_format, converter.output_serialization_format
                ),
            ));
        }
        if !uri.exists() {
            return Err(Error::log_open(uri, "no such file or directory"));
        }

        let (metadata, files) = resolve_files(uri)?;
        if let Some(metadata) = &metadata {
            if metadata.storage_identifier != storage.storage_id {
                return Err(Error::log_open(
                    uri,
                    format!(
                        "bag was recorded with storage identifier {:?}",
                        metadata.storage_identifier
                    ),
                ));
            }
        }

        let mut databases = VecDeque::with_capacity(files.len());
        let mut topics: Vec<TopicMetadata> = vec![];
        for file in &files {
            let database = Database::open(file)?;
            for topic in &database.topics {
                if topic.serialization_format != converter.input_serialization_format {
                    return Err(Error::log_open(
                        file,
                        format!(
                            "topic {} is serialized as {:?}, expected {:?}",
                            topic.name,
                            topic.serialization_format,
                            converter.input_serialization_format
                        ),
                    ));
                }
                if !topics.iter().any(|t| t.name == topic.name) {
                    topics.push(topic.clone());
                }
            }
            databases.push_back(database);
        }
        debug!(?uri, ?files, ?topics, "opened bag");

        Ok(Self {
            uri: uri.clone(),
            metadata,
            topics,
            databases,
            buffer: VecDeque::new(),
            filter: StorageFilter::default(),
        })
    }

    pub fn uri(&self) -> &Path {
        &self.uri
    }

    /// Returns the contents of `metadata.yaml`, if the bag has one.
    pub fn metadata(&self) -> Option<&BagMetadata> {
        self.metadata.as_ref()
    }

    /// Returns the topics recorded in the bag.
    pub fn topics(&self) -> &[TopicMetadata] {
        &self.topics
    }

    pub fn topic_type(&self, topic: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.name == topic)
            .map(|t| t.type_name.as_str())
    }

    /// Restricts subsequent reads to the topics named by `filter`.
    pub fn set_filter(&mut self, filter: StorageFilter) {
        debug!(?filter, "set filter");
        self.filter = filter;
        self.rewind_buffer();
    }

    pub fn reset_filter(&mut self) {
        self.set_filter(StorageFilter::default());
    }

    pub fn has_next(&mut self) -> Result<bool> {
        self.fill()?;
        Ok(!self.buffer.is_empty())
    }

    /// Returns the next record, or `None` once the bag is exhausted.
    pub fn read_next(&mut self) -> Result<Option<BagMessage>> {
        self.fill()?;
        let Some((id, message)) = self.buffer.pop_front() else {
            return Ok(None);
        };
        if let Some(database) = self.databases.front_mut() {
            database.delivered = (message.timestamp, id);
        }
        Ok(Some(message))
    }

    fn fill(&mut self) -> Result<()> {
        while self.buffer.is_empty() {
            let Some(database) = self.databases.front_mut() else {
                return Ok(());
            };
            match database.next_batch(&self.filter)? {
                Some(batch) => self.buffer.extend(batch),
                None => {
                    // Closes the database.
                    if let Some(database) = self.databases.pop_front() {
                        debug!(path = ?database.path, "finished reading");
                    }
                }
            }
        }
        Ok(())
    }

    // Discards prefetched rows so that they are read again with the current filter.
    fn rewind_buffer(&mut self) {
        self.buffer.clear();
        if let Some(database) = self.databases.front_mut() {
            database.fetched = database.delivered;
        }
    }
}

impl Iterator for SequentialReader {
    type Item = Result<BagMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

fn resolve_files(uri: &Path) -> Result<(Option<BagMetadata>, Vec<PathBuf>)> {
    if uri.is_file() {
        return Ok((None, vec![uri.to_owned()]));
    }

    let metadata = if uri.join(METADATA_FILE_NAME).is_file() {
        Some(BagMetadata::read_dir(uri)?)
    } else {
        None
    };

    let mut files = vec![];
    if let Some(metadata) = &metadata {
        for relative in &metadata.relative_file_paths {
            files.push(resolve_relative_file(uri, relative)?);
        }
    }
    if files.is_empty() {
        let entries = fs::read_dir(uri).map_err(|e| Error::log_open(uri, e.to_string()))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::log_open(uri, e.to_string()))?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(DATABASE_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
    }
    if files.is_empty() {
        return Err(Error::log_open(uri, "no database file found"));
    }
    Ok((metadata, files))
}

// Older versions of rosbag2 record the paths including the bag directory name.
fn resolve_relative_file(bag_dir: &Path, relative: &Path) -> Result<PathBuf> {
    let path = bag_dir.join(relative);
    if path.is_file() {
        return Ok(path);
    }
    if let Some(file_name) = relative.file_name() {
        let path = bag_dir.join(file_name);
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(Error::log_open(
        bag_dir,
        format!("database file {relative:?} listed in metadata does not exist"),
    ))
}
