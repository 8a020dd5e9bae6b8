//! ROS 2 messages stored in a bag and their CDR wire format.

use cdr::{Bounded, CdrLe, Infinite};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{Error, Result};

/// A message type that can be stored on a bag topic.
pub trait Message: Serialize + DeserializeOwned {
    /// Fully qualified type name, e.g. `sensor_msgs/msg/JointState`.
    const TYPE_NAME: &'static str;
}

/// `builtin_interfaces/msg/Time`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Message for Time {
    const TYPE_NAME: &'static str = "builtin_interfaces/msg/Time";
}

/// `std_msgs/msg/Header`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Time,
    pub frame_id: String,
}

impl Message for Header {
    const TYPE_NAME: &'static str = "std_msgs/msg/Header";
}

/// `sensor_msgs/msg/JointState`
///
/// `name`, `position` and `velocity` are parallel sequences; `position` or
/// `velocity` may be empty when the publisher does not fill them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub header: Header,
    pub name: Vec<String>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub effort: Vec<f64>,
}

impl Message for JointState {
    const TYPE_NAME: &'static str = "sensor_msgs/msg/JointState";
}

impl JointState {
    /// Returns the index of the first joint named `joint_name`.
    pub fn joint_index(&self, joint_name: &str) -> Option<usize> {
        self.name.iter().position(|name| name == joint_name)
    }
}

/// Decodes a CDR payload recorded on `topic` with the type `type_name`.
pub fn deserialize_message<M: Message>(topic: &str, type_name: &str, data: &[u8]) -> Result<M> {
    if type_name != M::TYPE_NAME {
        return Err(Error::Decode {
            topic: topic.to_owned(),
            type_name: M::TYPE_NAME.to_owned(),
            message: format!("topic has type {type_name}"),
        });
    }
    // A length prefix can never exceed the payload itself.
    cdr::deserialize_from(data, Bounded(data.len() as u64)).map_err(|e| Error::Decode {
        topic: topic.to_owned(),
        type_name: M::TYPE_NAME.to_owned(),
        message: e.to_string(),
    })
}

/// Encodes `message` as little-endian CDR, the representation rosbag2 records.
pub fn serialize_message<M: Message>(message: &M) -> Result<Vec<u8>> {
    cdr::serialize::<_, _, CdrLe>(message, Infinite).map_err(|e| Error::Decode {
        topic: String::new(),
        type_name: M::TYPE_NAME.to_owned(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joint_state() -> JointState {
        JointState {
            header: Header {
                stamp: Time {
                    sec: 5,
                    nanosec: 250,
                },
                frame_id: "base_link".to_owned(),
            },
            name: vec!["L_hip_joint".to_owned(), "R_hip_joint".to_owned()],
            position: vec![0.1, 0.2],
            velocity: vec![1.0, 2.0],
            effort: vec![],
        }
    }

    #[test]
    fn test_joint_state_cdr() {
        let msg = joint_state();
        let data = serialize_message(&msg).unwrap();
        // CDR_LE encapsulation
        assert_eq!(&data[..4], &[0x00, 0x01, 0x00, 0x00]);
        let decoded: JointState =
            deserialize_message("/joint_states", JointState::TYPE_NAME, &data).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_big_endian_payload() {
        let msg = joint_state();
        let data = cdr::serialize::<_, _, cdr::CdrBe>(&msg, Infinite).unwrap();
        let decoded: JointState =
            deserialize_message("/joint_states", JointState::TYPE_NAME, &data).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_type_mismatch() {
        let data = serialize_message(&joint_state()).unwrap();
        let err = deserialize_message::<JointState>("/joint_states", "std_msgs/msg/String", &data)
            .unwrap_err();
        assert!(err.is_decode(), "{err:?}");
    }

    #[test]
    fn test_truncated_payload() {
        let data = serialize_message(&joint_state()).unwrap();
        let err =
            deserialize_message::<JointState>("/joint_states", JointState::TYPE_NAME, &data[..12])
                .unwrap_err();
        assert!(err.is_decode(), "{err:?}");
        assert!(
            deserialize_message::<JointState>("/joint_states", JointState::TYPE_NAME, &[])
                .is_err()
        );
    }

    #[test]
    fn test_huge_length_prefix() {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        // stamp
        data.extend_from_slice(&[0; 8]);
        // frame_id length
        data.extend_from_slice(&0xFFFF_FFF0_u32.to_le_bytes());
        let err = deserialize_message::<JointState>("/joint_states", JointState::TYPE_NAME, &data)
            .unwrap_err();
        assert!(err.is_decode(), "{err:?}");
    }

    #[test]
    fn test_joint_index_first_occurrence() {
        let mut msg = joint_state();
        assert_eq!(msg.joint_index("R_hip_joint"), Some(1));
        assert_eq!(msg.joint_index("knee"), None);
        msg.name.push("L_hip_joint".to_owned());
        assert_eq!(msg.joint_index("L_hip_joint"), Some(0));
    }
}
