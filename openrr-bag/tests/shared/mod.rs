#![allow(dead_code)]

use std::path::{Path, PathBuf};

use openrr_bag::{serialize_message, JointState, Message};
use rusqlite::{params, Connection};

pub const JOINT_STATES: &str = "/joint_states";

const SCHEMA: &str = "
CREATE TABLE topics(
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    serialization_format TEXT NOT NULL,
    offered_qos_profiles TEXT NOT NULL
);
CREATE TABLE messages(
    id INTEGER PRIMARY KEY,
    topic_id INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    data BLOB NOT NULL
);
CREATE INDEX timestamp_idx ON messages (timestamp ASC);
";

/// Writes a `.db3` file with the rosbag2 sqlite3 layout.
#[derive(Debug)]
pub struct Db3Writer {
    path: PathBuf,
    connection: Connection,
    topics: Vec<String>,
}

impl Db3Writer {
    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_owned();
        let connection = Connection::open(&path).unwrap();
        connection
            .execute_batch("PRAGMA synchronous = OFF;")
            .unwrap();
        connection.execute_batch(SCHEMA).unwrap();
        Self {
            path,
            connection,
            topics: vec![],
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_topic(&mut self, name: &str, type_name: &str) -> &mut Self {
        self.add_topic_with_format(name, type_name, "cdr")
    }

    pub fn add_topic_with_format(
        &mut self,
        name: &str,
        type_name: &str,
        serialization_format: &str,
    ) -> &mut Self {
        self.connection
            .execute(
                "INSERT INTO topics (name, type, serialization_format, offered_qos_profiles) \
                 VALUES (?1, ?2, ?3, '')",
                params![name, type_name, serialization_format],
            )
            .unwrap();
        self.topics.push(name.to_owned());
        self
    }

    pub fn write(&mut self, topic: &str, timestamp: i64, data: &[u8]) -> &mut Self {
        let topic_id = self.topics.iter().position(|t| t == topic).unwrap() as i64 + 1;
        self.write_with_topic_id(topic_id, timestamp, data)
    }

    /// Writes a message without checking that `topic_id` exists.
    pub fn write_with_topic_id(
        &mut self,
        topic_id: i64,
        timestamp: i64,
        data: &[u8],
    ) -> &mut Self {
        self.connection
            .execute(
                "INSERT INTO messages (topic_id, timestamp, data) VALUES (?1, ?2, ?3)",
                params![topic_id, timestamp, data],
            )
            .unwrap();
        self
    }

    pub fn write_joint_state(
        &mut self,
        timestamp: i64,
        names: &[&str],
        position: &[f64],
        velocity: &[f64],
    ) -> &mut Self {
        let data = joint_state(names, position, velocity);
        self.write(JOINT_STATES, timestamp, &data)
    }
}

pub fn joint_state(names: &[&str], position: &[f64], velocity: &[f64]) -> Vec<u8> {
    let msg = JointState {
        name: names.iter().map(|s| s.to_string()).collect(),
        position: position.to_vec(),
        velocity: velocity.to_vec(),
        effort: vec![0.0; names.len()],
        ..Default::default()
    };
    serialize_message(&msg).unwrap()
}

/// Creates a bag directory at `dir/name` containing one database with a
/// `/joint_states` topic.
pub fn joint_state_bag(dir: &Path, name: &str) -> (PathBuf, Db3Writer) {
    let bag = dir.join(name);
    std::fs::create_dir(&bag).unwrap();
    let mut writer = Db3Writer::create(bag.join(format!("{name}_0.db3")));
    writer.add_topic(JOINT_STATES, JointState::TYPE_NAME);
    (bag, writer)
}

pub fn write_metadata(bag: &Path, storage_identifier: &str, files: &[&str]) {
    let mut s = format!(
        "rosbag2_bagfile_information:\n  version: 5\n  storage_identifier: {storage_identifier}\n  relative_file_paths:\n"
    );
    for file in files {
        s.push_str(&format!("    - {file}\n"));
    }
    s.push_str("  message_count: 0\n  topics_with_message_count: []\n");
    std::fs::write(bag.join("metadata.yaml"), s).unwrap();
}
